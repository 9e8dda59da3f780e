use crate::config::Config;
use crate::delay::Delay;
use crate::error::ServiceError;
use crate::models::{
    Applicant, Credentials, Profile, ReservationOutcome, ReservationRequest, RunReport,
    SkippedDate, Slot, SlotListing,
};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, ORIGIN, REFERER},
    Method, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::{info, warn};

/// Drives the booking sequence for one case and queue:
/// profile, available dates, slots per date, then reservation attempts.
pub struct ReservationService<T, D> {
    transport: T,
    delay: D,
    base_url: Url,
    headers: HeaderMap,
    credentials: Credentials,
}

impl<T: Transport, D: Delay> ReservationService<T, D> {
    pub fn new(
        config: &Config,
        credentials: Credentials,
        transport: T,
        delay: D,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            insert_header(&mut headers, key, value)?;
        }
        insert_header(
            &mut headers,
            AUTHORIZATION.as_str(),
            &format!("Bearer {}", credentials.token),
        )?;
        insert_header(
            &mut headers,
            REFERER.as_str(),
            &format!("{}/home/cases/{}", config.portal_url, credentials.case_id),
        )?;
        insert_header(&mut headers, ORIGIN.as_str(), &config.portal_url)?;

        Ok(ReservationService {
            transport,
            delay,
            base_url: config.base_url.clone(),
            headers,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ---- Helper Functions ----

    fn queue_path(&self, suffix: &str) -> String {
        format!("reservations/queue/{}/{}", self.credentials.queue_id, suffix)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse, ServiceError> {
        let url = self.base_url.join(path)?;
        self.transport.execute(ApiRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        })
    }

    /// A helper method to issue a GET with the session headers.
    fn get(&self, path: &str) -> Result<ApiResponse, ServiceError> {
        self.send(Method::GET, path, None)
    }

    /// A helper method to issue a POST with the session headers and a JSON body.
    fn post(&self, path: &str, body: serde_json::Value) -> Result<ApiResponse, ServiceError> {
        self.send(Method::POST, path, Some(body))
    }

    /// GET a required resource: anything but 200 aborts the run.
    fn get_required<R: DeserializeOwned>(&mut self, path: &str) -> Result<R, ServiceError> {
        let response = self.get(path)?;
        if response.status != StatusCode::OK {
            return Err(ServiceError::UnexpectedResponse {
                endpoint: path.to_string(),
                status: response.status,
                body: response.body,
            });
        }
        let value = parse_body(path, &response.body)?;
        self.delay.pause();
        Ok(value)
    }

    // ---- Booking Steps ----

    /// Fetch the applicant profile attached to the case.
    pub fn fetch_profile(&mut self) -> Result<Profile, ServiceError> {
        let path = self.queue_path("reserve");
        self.get_required(&path)
    }

    /// Fetch the dates that currently have free slots, in server order.
    pub fn fetch_available_dates(&mut self) -> Result<Vec<String>, ServiceError> {
        let path = self.queue_path("dates");
        self.get_required(&path)
    }

    /// Query the slots of every date in turn.
    ///
    /// A failed query only skips its own date. The pause follows every date,
    /// skipped or not.
    pub fn fetch_slots(&mut self, dates: &[String]) -> Result<SlotListing, ServiceError> {
        let mut listing = SlotListing::default();
        for date in dates {
            let path = self.queue_path(&format!("{}/slots", date));
            let response = self.get(&path)?;
            if response.status == StatusCode::OK {
                let slots: Vec<Slot> = parse_body(&path, &response.body)?;
                listing.slots.extend(slots);
            } else {
                warn!(%date, status = %response.status, body = %response.body, "Unknown response for slots, skipping date");
                listing.skipped.push(SkippedDate {
                    date: date.clone(),
                    status: response.status,
                });
            }
            self.delay.pause();
        }
        Ok(listing)
    }

    /// Try the slots in order until the portal accepts one.
    ///
    /// At most one reservation is made; no request follows the accepted one.
    pub fn reserve_first(
        &mut self,
        slots: &[Slot],
        applicant: &Applicant,
    ) -> Result<ReservationOutcome, ServiceError> {
        if slots.is_empty() {
            return Ok(ReservationOutcome::NoSlots);
        }
        let path = self.queue_path("reserve");
        for (index, slot) in slots.iter().enumerate() {
            let request = ReservationRequest::new(&self.credentials.case_id, slot, applicant);
            let body = serde_json::to_value(&request).map_err(|source| ServiceError::ParseError {
                endpoint: path.clone(),
                source,
            })?;
            let response = self.post(&path, body)?;
            if response.status == StatusCode::OK {
                warn!(slot = %slot, "Slot RESERVED for you {}", slot.date);
                return Ok(ReservationOutcome::Reserved {
                    slot: slot.clone(),
                    attempts: index + 1,
                });
            }
            info!(slot = %slot, status = %response.status, "Slot is already reserved {}", slot.date);
            self.delay.pause();
        }
        Ok(ReservationOutcome::Exhausted {
            attempts: slots.len(),
        })
    }

    /// Run the whole sequence. With `dry_run` no reservation is attempted.
    pub fn run(&mut self, dry_run: bool) -> Result<RunReport, ServiceError> {
        let profile = self.fetch_profile()?;
        info!("Actual profile is : {} {}", profile.first_name, profile.surname);

        let dates = self.fetch_available_dates()?;
        info!("Available dates are: {}", dates.join(", "));

        let listing = self.fetch_slots(&dates)?;
        info!(
            "Available slots are: {}",
            listing
                .slots
                .iter()
                .map(Slot::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let outcome = if dry_run {
            None
        } else {
            Some(self.reserve_first(&listing.slots, &profile.applicant())?)
        };

        Ok(RunReport {
            profile,
            dates,
            listing,
            outcome,
        })
    }
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) -> Result<(), ServiceError> {
    let name = HeaderName::from_str(key).map_err(|e| ServiceError::HeaderError {
        name: key.to_string(),
        msg: e.to_string(),
    })?;
    let value = HeaderValue::from_str(value).map_err(|e| ServiceError::HeaderError {
        name: key.to_string(),
        msg: e.to_string(),
    })?;
    headers.insert(name, value);
    Ok(())
}

fn parse_body<R: DeserializeOwned>(endpoint: &str, body: &str) -> Result<R, ServiceError> {
    serde_json::from_str(body).map_err(|source| ServiceError::ParseError {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoDelay;
    use std::cell::RefCell;

    struct EchoTransport {
        seen: RefCell<Vec<ApiRequest>>,
    }

    impl Transport for EchoTransport {
        fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ServiceError> {
            self.seen.borrow_mut().push(request);
            Ok(ApiResponse {
                status: StatusCode::OK,
                body: "[]".to_string(),
            })
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            case_id: "case-1".into(),
            queue_id: "queue-1".into(),
            token: "tok".into(),
        }
    }

    #[test]
    fn test_session_headers() {
        let transport = EchoTransport {
            seen: RefCell::new(Vec::new()),
        };
        let mut service =
            ReservationService::new(&Config::default(), credentials(), &transport, NoDelay)
                .unwrap();
        service.fetch_available_dates().unwrap();

        let seen = transport.seen.borrow();
        let headers = &seen[0].headers;
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[REFERER], "https://inpol.mazowieckie.pl/home/cases/case-1");
        assert_eq!(headers[ORIGIN], "https://inpol.mazowieckie.pl");
        assert_eq!(headers["cookie"], "cookieconsent_status=dismiss");
        assert_eq!(
            seen[0].url.as_str(),
            "https://inpol.mazowieckie.pl/api/reservations/queue/queue-1/dates"
        );
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let mut creds = credentials();
        creds.token = "abc\ndef".into();
        let transport = EchoTransport {
            seen: RefCell::new(Vec::new()),
        };
        let result = ReservationService::new(&Config::default(), creds, &transport, NoDelay);
        assert!(matches!(result, Err(ServiceError::HeaderError { .. })));
    }
}
