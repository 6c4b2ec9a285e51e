pub mod config;
pub mod dispatcher;

use std::sync::Arc;

use census_captcha_service::CaptchaSolverClient;
use census_identity_client::IdentityQueryClient;
pub use config::{DispatchMode, DispatcherConfig};
pub use dispatcher::{BatchStep, Dispatcher};
use tracing::debug;

use crate::core::client::JobQueueClient;
use crate::core::config::Config;
use crate::error::WorkerResult;

/// Wire the HTTP clients described by `config` into a dispatcher.
pub fn initialize_dispatcher(config: &Config) -> WorkerResult<Dispatcher> {
    let solver = Arc::new(CaptchaSolverClient::new_with_args(config.captcha_params())?);
    let lookup = Arc::new(IdentityQueryClient::new_with_args(config.identity_params(), solver)?);
    let queue = Arc::new(JobQueueClient::new_with_args(config.queue_params())?);
    debug!("Clients initialized");

    Ok(Dispatcher::new(queue, lookup, config.dispatcher_config().clone()))
}
