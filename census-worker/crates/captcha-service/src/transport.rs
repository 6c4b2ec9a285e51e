//! HTTP transport for the solving service.
//!
//! This is the only layer that talks to `reqwest`. It returns the raw status and body so the
//! parsing layer can salvage malformed payloads instead of failing inside the HTTP client.

use async_trait::async_trait;
pub use census_utils::http::RawResponse;
use census_utils::http::base_url;
use mockall::automock;
use tracing::trace;
use url::Url;

use crate::constants::{POLL_PATH, REQUEST_TIMEOUT, SUBMIT_PATH};
use crate::error::CaptchaError;

pub type FormFields = Vec<(&'static str, String)>;

#[automock]
#[async_trait]
pub trait CaptchaTransport: Send + Sync {
    /// `POST in.php` with a form body.
    async fn submit(&self, form: FormFields) -> Result<RawResponse, CaptchaError>;
    /// `GET res.php` with query parameters.
    async fn poll(&self, query: FormFields) -> Result<RawResponse, CaptchaError>;
}

pub struct HttpCaptchaTransport {
    client: reqwest::Client,
    submit_url: Url,
    poll_url: Url,
}

impl HttpCaptchaTransport {
    pub fn new(service_url: &Url) -> Result<Self, CaptchaError> {
        let client =
            reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(CaptchaError::ClientBuild)?;
        let service_url = base_url(service_url);
        let submit_url = service_url.join(SUBMIT_PATH).map_err(|e| CaptchaError::url_error("submit", e))?;
        let poll_url = service_url.join(POLL_PATH).map_err(|e| CaptchaError::url_error("poll", e))?;
        Ok(Self { client, submit_url, poll_url })
    }

    async fn read(operation: &str, response: reqwest::Response) -> Result<RawResponse, CaptchaError> {
        let raw = RawResponse::read(response).await.map_err(|e| CaptchaError::from_reqwest_error(operation, e))?;
        trace!(operation = operation, status = %raw.status, body_len = raw.body.len(), "Solver response received");
        Ok(raw)
    }
}

#[async_trait]
impl CaptchaTransport for HttpCaptchaTransport {
    async fn submit(&self, form: FormFields) -> Result<RawResponse, CaptchaError> {
        let response = self
            .client
            .post(self.submit_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| CaptchaError::from_reqwest_error("submit", e))?;
        Self::read("submit", response).await
    }

    async fn poll(&self, query: FormFields) -> Result<RawResponse, CaptchaError> {
        let response = self
            .client
            .get(self.poll_url.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| CaptchaError::from_reqwest_error("poll", e))?;
        Self::read("poll", response).await
    }
}
