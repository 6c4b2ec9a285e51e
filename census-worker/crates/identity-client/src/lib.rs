//! Census lookup client.
//!
//! A lookup solves a reCAPTCHA through a [`census_captcha_service::CaptchaSolver`], presents the
//! token to the citizen information API and retries according to the status-specific
//! [`RetryPolicy`]. Every outcome, including exhausted retries, is returned as a [`QueryResult`].

pub mod api;
pub mod client;
pub mod constants;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

use async_trait::async_trait;
use mockall::automock;
use url::Url;

pub use crate::client::IdentityQueryClient;
pub use crate::error::IdentityError;
pub use crate::retry::{RetryPolicy, RetryPolicyError, StatusRetry};
pub use crate::types::{PollingPlace, QueryResult};

#[automock]
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn query(&self, subject_id: &str) -> QueryResult;
}

#[derive(Debug, Clone)]
pub struct IdentityValidatedArgs {
    pub api_url: Url,
    pub site_key: String,
    pub page_url: Url,
    pub election_code: String,
    pub retry_policy: RetryPolicy,
}
