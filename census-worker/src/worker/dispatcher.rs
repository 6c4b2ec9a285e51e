/// Dispatcher - pulls batches from the job queue and runs census lookups for them
///
/// Every job taken off the queue produces exactly one outcome report: a lookup result, a
/// generic failure when processing panicked, or a shutdown failure when the job never started.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use census_identity_client::IdentityLookup;
use futures::FutureExt;
use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::core::client::JobQueue;
use crate::types::report::{SHUTDOWN_MESSAGE, UNEXPECTED_MESSAGE};
use crate::types::{Job, OutcomeReport};
use crate::worker::config::{DispatchMode, DispatcherConfig};

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStep {
    /// The queue had nothing pending.
    Idle,
    /// This many jobs were taken and reported.
    Processed(usize),
}

pub struct Dispatcher {
    queue: Arc<dyn JobQueue>,
    lookup: Arc<dyn IdentityLookup>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn JobQueue>, lookup: Arc<dyn IdentityLookup>, config: DispatcherConfig) -> Self {
        Self { queue, lookup, config }
    }

    /// Run the fetch / process / pause loop until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            kind = %self.config.job_kind,
            mode = self.config.mode.name(),
            batch_size = self.config.batch_size,
            "Starting dispatcher"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Dispatcher received shutdown signal");
                break;
            }

            let pause = match AssertUnwindSafe(self.run_once(&shutdown)).catch_unwind().await {
                Ok(BatchStep::Idle) => {
                    info!(idle_secs = self.config.idle_interval.as_secs(), "No pending jobs, waiting");
                    self.config.idle_interval
                }
                Ok(BatchStep::Processed(count)) => {
                    debug!(count = count, "Batch finished");
                    self.config.batch_pause
                }
                Err(panic) => {
                    error!(
                        panic = %panic_message(&*panic),
                        backoff_secs = self.config.error_backoff.as_secs(),
                        "Dispatcher iteration failed"
                    );
                    self.config.error_backoff
                }
            };

            if !pause_unless_cancelled(pause, &shutdown).await {
                info!("Dispatcher received shutdown signal");
                break;
            }
        }

        info!("Dispatcher stopped");
    }

    /// Fetch one batch and process it to completion.
    pub async fn run_once(&self, shutdown: &CancellationToken) -> BatchStep {
        let jobs = self.queue.fetch_pending(&self.config.job_kind, self.config.batch_size).await;
        if jobs.is_empty() {
            return BatchStep::Idle;
        }

        let count = jobs.len();
        info!(count = count, mode = self.config.mode.name(), "Processing batch");
        match self.config.mode {
            DispatchMode::Concurrent { pool_size } => self.process_concurrent(jobs, pool_size, shutdown).await,
            DispatchMode::Sequential => self.process_sequential(jobs, shutdown).await,
        }
        BatchStep::Processed(count)
    }

    fn job_runner(&self, max_jitter: Duration, shutdown: &CancellationToken) -> JobRunner {
        JobRunner {
            queue: self.queue.clone(),
            lookup: self.lookup.clone(),
            kind: self.config.job_kind.clone(),
            max_jitter,
            shutdown: shutdown.clone(),
        }
    }

    async fn process_concurrent(&self, jobs: Vec<Job>, pool_size: usize, shutdown: &CancellationToken) {
        let permits = Arc::new(Semaphore::new(pool_size.max(1)));
        let mut tasks = JoinSet::new();

        for job in jobs {
            let runner = self.job_runner(self.config.max_jitter, shutdown);
            let permits = permits.clone();
            let shutdown = shutdown.clone();
            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        runner.report_not_started(&job).await;
                        return;
                    }
                };
                if shutdown.is_cancelled() {
                    runner.report_not_started(&job).await;
                    return;
                }
                runner.process(&job).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Job task ended abnormally");
            }
        }
    }

    async fn process_sequential(&self, jobs: Vec<Job>, shutdown: &CancellationToken) {
        let runner = self.job_runner(Duration::ZERO, shutdown);

        for (index, job) in jobs.iter().enumerate() {
            let started = !shutdown.is_cancelled()
                && (index == 0 || pause_unless_cancelled(self.config.sequential_pause, shutdown).await);
            if started {
                runner.process(job).await;
            } else {
                runner.report_not_started(job).await;
            }
        }
    }
}

/// Everything a single job needs, cheap to clone into a spawned task.
struct JobRunner {
    queue: Arc<dyn JobQueue>,
    lookup: Arc<dyn IdentityLookup>,
    kind: String,
    max_jitter: Duration,
    shutdown: CancellationToken,
}

impl JobRunner {
    async fn process(&self, job: &Job) {
        self.process_after(job, random_jitter(self.max_jitter)).await
    }

    /// Runs `job` once `jitter` has elapsed, unless shutdown starts first.
    async fn process_after(&self, job: &Job, jitter: Duration) {
        let span = info_span!("job", id = %job.id);
        async {
            if !jitter.is_zero() {
                debug!(jitter_ms = jitter.as_millis() as u64, "Delaying job start");
                if !pause_unless_cancelled(jitter, &self.shutdown).await {
                    self.report_not_started(job).await;
                    return;
                }
            }

            let lookup = async { self.lookup.query(&job.subject_id).await };
            let report = match AssertUnwindSafe(lookup).catch_unwind().await {
                Ok(result) => {
                    info!(subject_id = %job.subject_id, result = result.variant_name(), "Lookup finished");
                    OutcomeReport::from_query_result(job, &result)
                }
                Err(panic) => {
                    error!(subject_id = %job.subject_id, panic = %panic_message(&*panic), "Job processing panicked");
                    OutcomeReport::failure(job, UNEXPECTED_MESSAGE)
                }
            };
            self.report(&report).await;
        }
        .instrument(span)
        .await
    }

    async fn report_not_started(&self, job: &Job) {
        warn!(job_id = %job.id, "Shutdown requested before job started");
        self.report(&OutcomeReport::failure(job, SHUTDOWN_MESSAGE)).await;
    }

    async fn report(&self, report: &OutcomeReport) {
        if self.queue.report_outcome(&self.kind, report).await {
            info!(job_id = %report.job_id, succeeded = report.succeeded, "Outcome reported");
        } else {
            warn!(job_id = %report.job_id, succeeded = report.succeeded, "Outcome was not accepted by the sink");
        }
    }
}

fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Sleeps for `duration`; returns `false` early if `shutdown` fires first.
async fn pause_unless_cancelled(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = sleep(duration) => true,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
