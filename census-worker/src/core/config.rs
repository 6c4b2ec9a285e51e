use std::time::Duration;

use census_captcha_service::{CaptchaValidatedArgs, PollSchedule};
use census_identity_client::{IdentityValidatedArgs, RetryPolicy};

use crate::cli::RunCmd;
use crate::core::client::queue::QueueValidatedArgs;
use crate::error::{WorkerError, WorkerResult};
use crate::worker::config::{DispatchMode, DispatchModeKind, DispatcherConfig};

/// Validated settings for every component, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    captcha_params: CaptchaValidatedArgs,
    identity_params: IdentityValidatedArgs,
    queue_params: QueueValidatedArgs,
    dispatcher_config: DispatcherConfig,
    shutdown_timeout: Duration,
}

impl Config {
    pub fn from_run_cmd(run_cmd: &RunCmd) -> WorkerResult<Self> {
        let captcha_args = &run_cmd.captcha_args;
        let identity_args = &run_cmd.identity_args;
        let queue_args = &run_cmd.queue_args;
        let dispatcher_args = &run_cmd.dispatcher_args;

        let api_key = required(captcha_args.twocaptcha_api_key.as_deref(), "TWOCAPTCHA_API_KEY")?;
        let api_token = required(queue_args.consulta_api_token.as_deref(), "CONSULTA_API_TOKEN")?;

        if captcha_args.captcha_max_polls == 0 {
            return Err(WorkerError::ConfigError("CENSUS_CAPTCHA_MAX_POLLS must be greater than 0".to_string()));
        }

        let captcha_params = CaptchaValidatedArgs {
            api_key: Some(api_key),
            service_url: captcha_args.captcha_service_url.clone(),
            poll_schedule: PollSchedule::default().with_max_attempts(captcha_args.captcha_max_polls),
        };

        let identity_params = IdentityValidatedArgs {
            api_url: identity_args.identity_api_url.clone(),
            site_key: identity_args.site_key.clone(),
            page_url: identity_args.page_url.clone(),
            election_code: identity_args.election_code.clone(),
            retry_policy: RetryPolicy::default(),
        };

        let queue_params = QueueValidatedArgs { service_url: queue_args.queue_service_url.clone(), api_token };

        let mode = match dispatcher_args.dispatch_mode {
            DispatchModeKind::Concurrent => DispatchMode::Concurrent { pool_size: dispatcher_args.worker_pool_size },
            DispatchModeKind::Sequential => DispatchMode::Sequential,
        };

        let dispatcher_config = DispatcherConfig {
            job_kind: queue_args.job_kind.clone(),
            batch_size: dispatcher_args.batch_size,
            mode,
            idle_interval: Duration::from_secs(dispatcher_args.idle_interval_secs),
            batch_pause: Duration::from_secs(dispatcher_args.batch_pause_secs),
            sequential_pause: Duration::from_secs(dispatcher_args.sequential_pause_secs),
            max_jitter: Duration::from_millis(dispatcher_args.max_jitter_ms),
            error_backoff: Duration::from_secs(dispatcher_args.error_backoff_secs),
        };

        Ok(Self {
            captcha_params,
            identity_params,
            queue_params,
            dispatcher_config,
            shutdown_timeout: Duration::from_secs(dispatcher_args.shutdown_timeout_secs),
        })
    }

    pub fn captcha_params(&self) -> &CaptchaValidatedArgs {
        &self.captcha_params
    }

    pub fn identity_params(&self) -> &IdentityValidatedArgs {
        &self.identity_params
    }

    pub fn queue_params(&self) -> &QueueValidatedArgs {
        &self.queue_params
    }

    pub fn dispatcher_config(&self) -> &DispatcherConfig {
        &self.dispatcher_config
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

fn required(value: Option<&str>, name: &str) -> WorkerResult<String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(WorkerError::ConfigError(format!("{} is not set", name))),
    }
}
