use crate::error::ServiceError;
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::HeaderMap,
    Method, StatusCode, Url,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends a single request and hands back status and raw body.
///
/// Non-2xx statuses are not errors at this level; only failures to talk to
/// the server are.
pub trait Transport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ServiceError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ServiceError> {
        (**self).execute(request)
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ServiceError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(HttpTransport { client })
    }

    fn build(&self, request: ApiRequest) -> RequestBuilder {
        let builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        match request.body {
            Some(body) => builder.json(&body),
            None => builder,
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ServiceError> {
        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.build(request).send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(%method, %url, %status, "request completed");
        Ok(ApiResponse { status, body })
    }
}
