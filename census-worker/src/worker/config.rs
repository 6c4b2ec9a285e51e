use std::time::Duration;

pub const DEFAULT_JOB_KIND: &str = "registraduria";
pub const DEFAULT_POOL_SIZE: usize = 3;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(5);
pub const DEFAULT_SEQUENTIAL_PAUSE: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(3000);
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// How a fetched batch is worked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Up to `pool_size` jobs in flight, each delayed by a random jitter.
    Concurrent { pool_size: usize },
    /// One job at a time with a fixed pause between jobs.
    Sequential,
}

impl DispatchMode {
    pub fn name(&self) -> &'static str {
        match self {
            DispatchMode::Concurrent { .. } => "concurrent",
            DispatchMode::Sequential => "sequential",
        }
    }
}

/// Mode names as accepted on the command line, before the pool size is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DispatchModeKind {
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Queue `tipo` the dispatcher asks for and reports under.
    pub job_kind: String,
    pub batch_size: usize,
    pub mode: DispatchMode,
    /// Pause after an empty fetch.
    pub idle_interval: Duration,
    /// Pause after a processed batch.
    pub batch_pause: Duration,
    pub sequential_pause: Duration,
    /// Upper bound of the random delay before each concurrent job starts.
    pub max_jitter: Duration,
    /// Pause after a loop iteration failed unexpectedly.
    pub error_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            job_kind: DEFAULT_JOB_KIND.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            mode: DispatchMode::Concurrent { pool_size: DEFAULT_POOL_SIZE },
            idle_interval: DEFAULT_IDLE_INTERVAL,
            batch_pause: DEFAULT_BATCH_PAUSE,
            sequential_pause: DEFAULT_SEQUENTIAL_PAUSE,
            max_jitter: DEFAULT_MAX_JITTER,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}
