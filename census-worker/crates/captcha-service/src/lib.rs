//! Client for the 2Captcha reCAPTCHA solving service.
//!
//! A challenge is submitted once and then polled until the service hands back a token, reports
//! a terminal error, or the poll ceiling is reached. Every failure mode is folded into a
//! [`SolveOutcome`] so callers never have to handle transport errors themselves.

pub mod api;
pub mod client;
pub mod constants;
pub mod error;
pub mod transport;
pub mod types;

use async_trait::async_trait;
use mockall::automock;
use url::Url;

pub use crate::client::{CaptchaSolverClient, PollSchedule};
pub use crate::error::CaptchaError;
pub use crate::types::{CaptchaTask, FailureReason, SolveOutcome};

/// Anything able to turn a reCAPTCHA challenge into a token.
#[automock]
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn solve(&self, site_key: &str, page_url: &str) -> SolveOutcome;
}

#[derive(Debug, Clone)]
pub struct CaptchaValidatedArgs {
    /// `None` keeps the client constructible; every solve then fails with `not configured`.
    pub api_key: Option<String>,
    pub service_url: Url,
    pub poll_schedule: PollSchedule,
}
