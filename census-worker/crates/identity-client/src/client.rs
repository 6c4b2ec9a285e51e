use std::sync::Arc;

use async_trait::async_trait;
use census_captcha_service::{CaptchaSolver, SolveOutcome};
use census_utils::http::truncate_text;
use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::api::IdentityApiOperations;
use crate::error::IdentityError;
use crate::retry::RetryPolicy;
use crate::transport::{HttpIdentityTransport, IdentityTransport, RawResponse};
use crate::types::{LookupRequest, QueryResult};
use crate::{IdentityLookup, IdentityValidatedArgs};

/// Looks a subject up in the census: solve a CAPTCHA, then call the lookup endpoint under the
/// [`RetryPolicy`]. Holds no per-query state, so one instance serves every worker.
pub struct IdentityQueryClient {
    solver: Arc<dyn CaptchaSolver>,
    transport: Box<dyn IdentityTransport>,
    retry_policy: RetryPolicy,
    site_key: String,
    page_url: String,
    election_code: String,
}

impl IdentityQueryClient {
    pub fn new_with_args(args: &IdentityValidatedArgs, solver: Arc<dyn CaptchaSolver>) -> Result<Self, IdentityError> {
        let transport = HttpIdentityTransport::new(&args.api_url, &args.page_url)?;
        Ok(Self::with_transport(args, solver, transport))
    }

    pub fn with_transport(
        args: &IdentityValidatedArgs,
        solver: Arc<dyn CaptchaSolver>,
        transport: impl IdentityTransport + 'static,
    ) -> Self {
        Self {
            solver,
            transport: Box::new(transport),
            retry_policy: args.retry_policy.clone(),
            site_key: args.site_key.clone(),
            page_url: args.page_url.to_string(),
            election_code: args.election_code.clone(),
        }
    }

    /// Sends the lookup until a 200 arrives or the policy gives up on the returned status.
    async fn send_with_retry(&self, token: &str, request: &LookupRequest) -> Result<RawResponse, QueryResult> {
        let mut attempt: u32 = 0;
        loop {
            let response = self.transport.lookup(token, request).await.map_err(|e| {
                error!(attempt = attempt + 1, error = %e, "Lookup request failed");
                QueryResult::UpstreamError { code: None, detail: e.to_string() }
            })?;

            if response.status == StatusCode::OK {
                return Ok(response);
            }

            match self.retry_policy.delay_for(response.status, attempt) {
                Some(delay) => {
                    warn!(
                        status = response.status.as_u16(),
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs_f64(),
                        "Lookup rejected, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    error!(
                        status = response.status.as_u16(),
                        attempt = attempt + 1,
                        body = %truncate_text(&response.body, 200),
                        "Lookup failed"
                    );
                    return Err(self.exhausted(response.status));
                }
            }
        }
    }

    fn exhausted(&self, status: StatusCode) -> QueryResult {
        let code = status.as_u16();
        let detail = if self.retry_policy.retries(status) {
            format!("identity API unavailable ({})", code)
        } else {
            format!("identity API returned unexpected status {}", code)
        };
        QueryResult::UpstreamError { code: Some(code), detail }
    }
}

#[async_trait]
impl IdentityLookup for IdentityQueryClient {
    async fn query(&self, subject_id: &str) -> QueryResult {
        info!(subject_id = %subject_id, "Querying census");

        let token = match self.solver.solve(&self.site_key, &self.page_url).await {
            SolveOutcome::Token(token) => token,
            SolveOutcome::Failed(reason) => {
                error!(subject_id = %subject_id, reason = %reason, "No CAPTCHA token, skipping lookup");
                return QueryResult::CaptchaError { detail: format!("captcha {}", reason) };
            }
        };

        let request = IdentityApiOperations::build_lookup_request(subject_id, &self.election_code);
        let result = match self.send_with_retry(&token, &request).await {
            Ok(response) => IdentityApiOperations::classify(&response.body, subject_id),
            Err(result) => result,
        };

        debug!(subject_id = %subject_id, result = result.variant_name(), "Census query finished");
        result
    }
}
