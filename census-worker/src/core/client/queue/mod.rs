pub mod error;
pub mod http;

use async_trait::async_trait;
pub use error::QueueError;
pub use http::JobQueueClient;
use url::Url;

use crate::types::{Job, OutcomeReport};

/// The remote queue jobs come from and the sink outcomes go to.
///
/// Neither call fails: transport and authorisation problems are logged and surface as an empty
/// batch or a `false` acknowledgement so the dispatcher loop keeps running.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Up to `limit` pending jobs of `kind`, in queue order.
    async fn fetch_pending(&self, kind: &str, limit: usize) -> Vec<Job>;

    /// Sends one outcome. Every call is a separate delivery; nothing is deduplicated.
    async fn report_outcome(&self, kind: &str, report: &OutcomeReport) -> bool;
}

#[derive(Debug, Clone)]
pub struct QueueValidatedArgs {
    /// Base URL under which `consultas-pendientes` and `recibir-datos` live.
    pub service_url: Url,
    pub api_token: String,
}
