use clap::Args;

use crate::worker::config::DispatchModeKind;

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Args)]
pub struct DispatcherCliArgs {
    /// Jobs processed in parallel in concurrent mode.
    #[arg(env = "CENSUS_WORKER_POOL_SIZE", long, default_value = "3", value_parser = parse_positive_usize)]
    pub worker_pool_size: usize,

    /// Jobs fetched per batch.
    #[arg(env = "CENSUS_BATCH_SIZE", long, default_value = "5", value_parser = parse_positive_usize)]
    pub batch_size: usize,

    /// `concurrent` or `sequential`.
    #[arg(env = "CENSUS_DISPATCH_MODE", long, value_enum, default_value = "concurrent")]
    pub dispatch_mode: DispatchModeKind,

    /// Seconds to wait when the queue is empty.
    #[arg(env = "CENSUS_IDLE_INTERVAL_SECS", long, default_value = "30")]
    pub idle_interval_secs: u64,

    /// Seconds to wait after a batch.
    #[arg(env = "CENSUS_BATCH_PAUSE_SECS", long, default_value = "5")]
    pub batch_pause_secs: u64,

    /// Seconds between jobs in sequential mode.
    #[arg(env = "CENSUS_SEQUENTIAL_PAUSE_SECS", long, default_value = "2")]
    pub sequential_pause_secs: u64,

    /// Upper bound, in milliseconds, of the random delay before each concurrent job.
    #[arg(env = "CENSUS_MAX_JITTER_MS", long, default_value = "3000")]
    pub max_jitter_ms: u64,

    /// Seconds to back off after an unexpected loop failure.
    #[arg(env = "CENSUS_ERROR_BACKOFF_SECS", long, default_value = "10")]
    pub error_backoff_secs: u64,

    /// Seconds allowed for in-flight jobs to finish after a shutdown signal.
    #[arg(env = "CENSUS_SHUTDOWN_TIMEOUT_SECS", long, default_value = "120")]
    pub shutdown_timeout_secs: u64,
}
