use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiers and bearer token copied from a logged-in browser session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub case_id: String,
    pub queue_id: String,
    pub token: String,
}

/// Applicant profile as returned by the reserve endpoint.
///
/// Only the name fields and date of birth are used; the rest is kept as-is.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub surname: String,
    pub date_of_birth: String,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn applicant(&self) -> Applicant {
        Applicant {
            name: self.first_name.clone(),
            last_name: self.surname.clone(),
            date_of_birth: self.date_of_birth.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applicant {
    pub name: String,
    pub last_name: String,
    pub date_of_birth: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Slot {
    pub id: i64,
    /// Slot date as reported by the server, not the queried day.
    pub date: String,
}

impl Slot {
    pub fn new(id: i64, date: impl Into<String>) -> Self {
        Slot {
            id,
            date: date.into(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.id, self.date)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub proceeding_id: String,
    pub slot_id: i64,
    pub name: String,
    pub last_name: String,
    pub date_of_birth: String,
}

impl ReservationRequest {
    pub fn new(case_id: &str, slot: &Slot, applicant: &Applicant) -> Self {
        ReservationRequest {
            proceeding_id: case_id.to_string(),
            slot_id: slot.id,
            name: applicant.name.clone(),
            last_name: applicant.last_name.clone(),
            date_of_birth: applicant.date_of_birth.clone(),
        }
    }
}

/// A date whose slot query failed and was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedDate {
    pub date: String,
    pub status: StatusCode,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotListing {
    /// Slots in date order, then server order within a date. Not deduplicated.
    pub slots: Vec<Slot>,
    pub skipped: Vec<SkippedDate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservationOutcome {
    Reserved { slot: Slot, attempts: usize },
    /// Every candidate was rejected by the server.
    Exhausted { attempts: usize },
    NoSlots,
}

impl ReservationOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReservationOutcome::Reserved { .. })
    }

    pub fn attempts(&self) -> usize {
        match self {
            ReservationOutcome::Reserved { attempts, .. } => *attempts,
            ReservationOutcome::Exhausted { attempts } => *attempts,
            ReservationOutcome::NoSlots => 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub profile: Profile,
    pub dates: Vec<String>,
    pub listing: SlotListing,
    /// `None` when the run stopped before reserving (dry run).
    pub outcome: Option<ReservationOutcome>,
}
