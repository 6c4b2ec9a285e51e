use std::sync::{Arc, Mutex};
use std::time::Duration;

use census_identity_client::{PollingPlace, QueryResult};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::client::queue::MockJobQueue;
use crate::types::{Job, OutcomeReport};
use crate::worker::config::{DispatchMode, DispatcherConfig};

pub mod constants;

/// Everything a scripted queue saw.
#[derive(Clone, Default)]
pub struct QueueRecorder {
    pub fetches: Arc<Mutex<Vec<Instant>>>,
    pub reports: Arc<Mutex<Vec<OutcomeReport>>>,
}

impl QueueRecorder {
    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<OutcomeReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn report_for(&self, job_id: &str) -> Vec<OutcomeReport> {
        self.reports().into_iter().filter(|report| report.job_id == job_id).collect()
    }
}

/// Queue handing out `batches` in order. Once they run out it cancels `shutdown` and returns
/// nothing, which ends the dispatcher loop.
pub fn scripted_queue(batches: Vec<Vec<Job>>, shutdown: CancellationToken) -> (MockJobQueue, QueueRecorder) {
    let recorder = QueueRecorder::default();
    let mut queue = MockJobQueue::new();

    let fetches = recorder.fetches.clone();
    let mut remaining = batches.into_iter();
    queue.expect_fetch_pending().returning(move |_, _| {
        fetches.lock().unwrap().push(Instant::now());
        match remaining.next() {
            Some(batch) => batch,
            None => {
                shutdown.cancel();
                Vec::new()
            }
        }
    });

    let reports = recorder.reports.clone();
    queue.expect_report_outcome().returning(move |_, report| {
        reports.lock().unwrap().push(report.clone());
        true
    });

    (queue, recorder)
}

pub fn jobs(ids: &[(&str, &str)]) -> Vec<Job> {
    ids.iter().map(|(id, subject)| Job::new(*id, *subject)).collect()
}

pub fn test_dispatcher_config(mode: DispatchMode) -> DispatcherConfig {
    DispatcherConfig { mode, max_jitter: Duration::ZERO, ..DispatcherConfig::default() }
}

pub fn polling_place(subject_id: &str) -> PollingPlace {
    PollingPlace {
        nuip: subject_id.to_string(),
        department: "ANTIOQUIA".to_string(),
        municipality: "MEDELLIN".to_string(),
        station: "IE JAVIERA LONDONO".to_string(),
        address: "CL 48 # 40-20".to_string(),
        table: "12".to_string(),
        zone: "04".to_string(),
    }
}

pub fn success(subject_id: &str) -> QueryResult {
    QueryResult::Success(polling_place(subject_id))
}
