use async_trait::async_trait;
pub use census_utils::http::RawResponse;
use census_utils::http::base_url;
use mockall::automock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::trace;
use url::Url;

use crate::constants::{ACCEPT, LOOKUP_PATH, REQUEST_TIMEOUT, USER_AGENT};
use crate::error::IdentityError;
use crate::types::LookupRequest;

#[automock]
#[async_trait]
pub trait IdentityTransport: Send + Sync {
    /// One `POST get-information` attempt authorised with a solved CAPTCHA token.
    async fn lookup(&self, token: &str, request: &LookupRequest) -> Result<RawResponse, IdentityError>;
}

pub struct HttpIdentityTransport {
    client: reqwest::Client,
    lookup_url: Url,
}

impl HttpIdentityTransport {
    /// `page_url` is the page the CAPTCHA was solved on; its origin is sent as `Origin` and
    /// `Referer` so the request looks like it came from that page.
    pub fn new(api_url: &Url, page_url: &Url) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(Self::browser_headers(page_url)?)
            .build()
            .map_err(IdentityError::ClientBuild)?;
        let lookup_url = base_url(api_url).join(LOOKUP_PATH).map_err(|e| IdentityError::url_error("lookup", e))?;
        Ok(Self { client, lookup_url })
    }

    fn browser_headers(page_url: &Url) -> Result<HeaderMap, IdentityError> {
        let origin = page_url.origin().ascii_serialization();
        let referer = format!("{}/", origin);

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_str(&origin).map_err(|_| IdentityError::InvalidHeader { name: "Origin" })?,
        );
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&referer).map_err(|_| IdentityError::InvalidHeader { name: "Referer" })?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl IdentityTransport for HttpIdentityTransport {
    async fn lookup(&self, token: &str, request: &LookupRequest) -> Result<RawResponse, IdentityError> {
        let response = self
            .client
            .post(self.lookup_url.clone())
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| IdentityError::from_reqwest_error("lookup", e))?;
        let raw = RawResponse::read(response).await.map_err(|e| IdentityError::from_reqwest_error("lookup", e))?;
        trace!(status = %raw.status, body_len = raw.body.len(), "Lookup response received");
        Ok(raw)
    }
}
