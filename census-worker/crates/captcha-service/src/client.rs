use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::api::{CaptchaApiOperations, PollStep};
use crate::constants::{DEFAULT_MAX_POLLS, FAST_POLL_ATTEMPTS, FAST_POLL_DELAY, SLOW_POLL_DELAY};
use crate::error::CaptchaError;
use crate::transport::{CaptchaTransport, HttpCaptchaTransport};
use crate::types::{CaptchaTask, FailureReason, SolveOutcome};
use crate::{CaptchaSolver, CaptchaValidatedArgs};

/// Adaptive poll cadence: `fast_delay` for the first `fast_attempts` polls, `slow_delay`
/// afterwards, never more than `max_attempts` polls in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub fast_delay: Duration,
    pub fast_attempts: u32,
    pub slow_delay: Duration,
    pub max_attempts: u32,
}

impl PollSchedule {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay slept before poll number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt < self.fast_attempts {
            self.fast_delay
        } else {
            self.slow_delay
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            fast_delay: FAST_POLL_DELAY,
            fast_attempts: FAST_POLL_ATTEMPTS,
            slow_delay: SLOW_POLL_DELAY,
            max_attempts: DEFAULT_MAX_POLLS,
        }
    }
}

/// 2Captcha client. Submits a challenge, then polls `res.php` on the [`PollSchedule`].
pub struct CaptchaSolverClient {
    api_key: Option<String>,
    transport: Box<dyn CaptchaTransport>,
    schedule: PollSchedule,
}

impl CaptchaSolverClient {
    pub fn new_with_args(args: &CaptchaValidatedArgs) -> Result<Self, CaptchaError> {
        let transport = HttpCaptchaTransport::new(&args.service_url)?;
        Ok(Self::with_transport(args.api_key.clone(), transport, args.poll_schedule.clone()))
    }

    pub fn with_transport(
        api_key: Option<String>,
        transport: impl CaptchaTransport + 'static,
        schedule: PollSchedule,
    ) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Self { api_key, transport: Box::new(transport), schedule }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn submit(&self, api_key: &str, site_key: &str, page_url: &str) -> Result<CaptchaTask, FailureReason> {
        let form = CaptchaApiOperations::build_submit_form(api_key, site_key, page_url);
        let response = self.transport.submit(form).await.map_err(|e| {
            error!(error = %e, "CAPTCHA submission failed");
            FailureReason::Transport(e.to_string())
        })?;

        let challenge_id = CaptchaApiOperations::parse_submit(&response).inspect_err(|reason| {
            error!(reason = %reason, "CAPTCHA submission not accepted");
        })?;

        info!(challenge_id = %challenge_id, "CAPTCHA submitted");
        Ok(CaptchaTask { challenge_id, site_key: site_key.to_string(), page_url: page_url.to_string() })
    }

    async fn poll_until_solved(&self, api_key: &str, task: &CaptchaTask) -> SolveOutcome {
        for attempt in 0..self.schedule.max_attempts {
            sleep(self.schedule.delay_for(attempt)).await;

            let query = CaptchaApiOperations::build_poll_query(api_key, &task.challenge_id);
            let step = match self.transport.poll(query).await {
                Ok(response) => CaptchaApiOperations::classify_poll(&response),
                Err(e) => PollStep::Failed(FailureReason::Transport(e.to_string())),
            };

            match step {
                PollStep::Solved(token) => {
                    info!(challenge_id = %task.challenge_id, attempt = attempt + 1, "CAPTCHA solved");
                    return SolveOutcome::Token(token);
                }
                PollStep::NotReady | PollStep::Transient => {
                    debug!(challenge_id = %task.challenge_id, attempt = attempt + 1, "CAPTCHA not ready");
                }
                PollStep::Failed(reason) => {
                    error!(challenge_id = %task.challenge_id, attempt = attempt + 1, reason = %reason, "CAPTCHA failed");
                    return SolveOutcome::Failed(reason);
                }
            }
        }

        error!(
            challenge_id = %task.challenge_id,
            max_attempts = self.schedule.max_attempts,
            "CAPTCHA timed out"
        );
        SolveOutcome::Failed(FailureReason::Timeout)
    }
}

#[async_trait]
impl CaptchaSolver for CaptchaSolverClient {
    async fn solve(&self, site_key: &str, page_url: &str) -> SolveOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("CAPTCHA API key is not configured");
            return SolveOutcome::Failed(FailureReason::NotConfigured);
        };

        match self.submit(api_key, site_key, page_url).await {
            Ok(task) => self.poll_until_solved(api_key, &task).await,
            Err(reason) => SolveOutcome::Failed(reason),
        }
    }
}
