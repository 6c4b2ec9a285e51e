use std::time::Duration;

use async_trait::async_trait;
use census_utils::http::{base_url, truncate_text, RawResponse};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, warn};
use url::Url;

use super::{JobQueue, QueueError, QueueValidatedArgs};
use crate::types::job::{PendingJobsResponse, RejectedEntry};
use crate::types::report::{ReportRequest, INVALID_ENTRY_MESSAGE};
use crate::types::{Job, OutcomeReport};

pub const PENDING_PATH: &str = "consultas-pendientes";
pub const REPORT_PATH: &str = "recibir-datos";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
struct ReportAck {
    #[serde(default)]
    success: bool,
}

/// HTTP client for the queue functions, authorised with a static bearer token.
pub struct JobQueueClient {
    client: reqwest::Client,
    pending_url: Url,
    report_url: Url,
    api_token: String,
}

impl JobQueueClient {
    pub fn new_with_args(args: &QueueValidatedArgs) -> Result<Self, QueueError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(QueueError::ClientBuild)?;
        let service_url = base_url(&args.service_url);
        let pending_url = service_url
            .join(PENDING_PATH)
            .map_err(|e| QueueError::UrlError { operation: "fetch_pending".to_string(), message: e.to_string() })?;
        let report_url = service_url
            .join(REPORT_PATH)
            .map_err(|e| QueueError::UrlError { operation: "report_outcome".to_string(), message: e.to_string() })?;
        Ok(Self { client, pending_url, report_url, api_token: args.api_token.clone() })
    }

    /// `Ok(None)` means the token was refused.
    async fn try_fetch_pending(&self, kind: &str, limit: usize) -> Result<Option<PendingJobsResponse>, QueueError> {
        let response = self
            .client
            .get(self.pending_url.clone())
            .bearer_auth(&self.api_token)
            .query(&[("tipo", kind.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| QueueError::from_reqwest_error("fetch_pending", e))?;
        let raw = RawResponse::read(response).await.map_err(|e| QueueError::from_reqwest_error("fetch_pending", e))?;

        if raw.status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !raw.status.is_success() {
            return Err(QueueError::Rejected { operation: "fetch_pending".to_string(), status: raw.status });
        }

        let parsed = serde_json::from_str(&raw.body).map_err(|e| QueueError::parse_error("fetch_pending", e))?;
        Ok(Some(parsed))
    }

    /// The queue already handed the entry out, so anything with an id is failed back to the sink.
    async fn reject_entry(&self, kind: &str, entry: RejectedEntry) {
        let Some(id) = entry.id else {
            error!(kind = %kind, reason = %entry.reason, "Skipping queue entry without an id");
            return;
        };
        warn!(job_id = %id, reason = %entry.reason, "Queue entry is not a valid job");
        let report = OutcomeReport::failure(&Job::new(id, entry.subject_id), INVALID_ENTRY_MESSAGE);
        self.report_outcome(kind, &report).await;
    }

    async fn try_report(&self, kind: &str, report: &OutcomeReport) -> Result<bool, QueueError> {
        let response = self
            .client
            .post(self.report_url.clone())
            .bearer_auth(&self.api_token)
            .json(&ReportRequest::new(report, kind))
            .send()
            .await
            .map_err(|e| QueueError::from_reqwest_error("report_outcome", e))?;
        let raw =
            RawResponse::read(response).await.map_err(|e| QueueError::from_reqwest_error("report_outcome", e))?;

        if !raw.status.is_success() {
            return Err(QueueError::Rejected { operation: "report_outcome".to_string(), status: raw.status });
        }

        match serde_json::from_str::<ReportAck>(&raw.body) {
            Ok(ack) => Ok(ack.success),
            Err(e) => {
                warn!(error = %e, body = %truncate_text(&raw.body, 200), "Sink acknowledgement is not valid JSON");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl JobQueue for JobQueueClient {
    async fn fetch_pending(&self, kind: &str, limit: usize) -> Vec<Job> {
        match self.try_fetch_pending(kind, limit).await {
            Ok(Some(response)) => {
                let (jobs, rejected) = response.into_jobs();
                for entry in rejected {
                    self.reject_entry(kind, entry).await;
                }
                debug!(kind = %kind, count = jobs.len(), "Fetched pending jobs");
                jobs
            }
            Ok(None) => {
                error!(kind = %kind, "Queue rejected the API token");
                Vec::new()
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "Failed to fetch pending jobs");
                Vec::new()
            }
        }
    }

    async fn report_outcome(&self, kind: &str, report: &OutcomeReport) -> bool {
        match self.try_report(kind, report).await {
            Ok(accepted) => {
                if !accepted {
                    warn!(job_id = %report.job_id, "Sink did not acknowledge the outcome");
                }
                accepted
            }
            Err(QueueError::Rejected { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND =>
            {
                error!(job_id = %report.job_id, status = status.as_u16(), "Sink refused the outcome");
                false
            }
            Err(e) => {
                error!(job_id = %report.job_id, error = %e, "Failed to report outcome");
                false
            }
        }
    }
}
