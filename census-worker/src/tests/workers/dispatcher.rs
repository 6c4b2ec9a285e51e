use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use census_identity_client::{IdentityLookup, MockIdentityLookup, QueryResult};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::client::queue::MockJobQueue;
use crate::core::client::JobQueue;
use crate::tests::common::constants::SUBJECT_ID;
use crate::tests::common::{jobs, scripted_queue, success, test_dispatcher_config};
use crate::types::report::{NOT_FOUND_MESSAGE, SHUTDOWN_MESSAGE, UNEXPECTED_MESSAGE};
use crate::types::{Job, OutcomeReport};
use crate::worker::config::DispatchMode;
use crate::worker::{BatchStep, Dispatcher};

/// Succeeds after `delay`, except for subject `boom` which panics.
struct ScriptedLookup {
    delay: Duration,
}

#[async_trait]
impl IdentityLookup for ScriptedLookup {
    async fn query(&self, subject_id: &str) -> QueryResult {
        tokio::time::sleep(self.delay).await;
        if subject_id == "boom" {
            panic!("lookup exploded");
        }
        success(subject_id)
    }
}

/// Panics on the first fetch, then cancels `shutdown` on the next one.
struct FlakyQueue {
    shutdown: CancellationToken,
    fetches: Mutex<Vec<Instant>>,
}

#[async_trait]
impl JobQueue for FlakyQueue {
    async fn fetch_pending(&self, _kind: &str, _limit: usize) -> Vec<Job> {
        let first = {
            let mut fetches = self.fetches.lock().unwrap();
            fetches.push(Instant::now());
            fetches.len() == 1
        };
        if first {
            panic!("queue client bug");
        }
        self.shutdown.cancel();
        Vec::new()
    }

    async fn report_outcome(&self, _kind: &str, _report: &OutcomeReport) -> bool {
        panic!("nothing should be reported");
    }
}

fn concurrent(pool_size: usize) -> DispatchMode {
    DispatchMode::Concurrent { pool_size }
}

#[tokio::test(start_paused = true)]
async fn end_to_end_success_is_reported_with_location_fields() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) = scripted_queue(vec![jobs(&[("q1", SUBJECT_ID)])], shutdown.clone());
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().withf(|subject| subject == SUBJECT_ID).times(1).returning(|subject| success(subject));

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    let reports = recorder.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.job_id, "q1");
    assert_eq!(report.subject_id, SUBJECT_ID);
    assert!(report.succeeded);
    assert_eq!(report.error, None);
    let data = report.data.as_ref().expect("success carries data");
    assert_eq!(data.len(), 6);
    assert_eq!(data["departamento_votacion"], "ANTIOQUIA");
    assert_eq!(data["mesa"], "12");
}

#[tokio::test(start_paused = true)]
async fn every_job_in_a_batch_is_reported_exactly_once() {
    let shutdown = CancellationToken::new();
    let batch = jobs(&[("q1", "1001"), ("q2", "1002"), ("q3", "1003"), ("q4", "1004"), ("q5", "1005")]);
    let (queue, recorder) = scripted_queue(vec![batch], shutdown.clone());
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().times(5).returning(|subject| match subject {
        "1002" => QueryResult::NotFound,
        "1004" => QueryResult::UpstreamError { code: Some(403), detail: "identity API unavailable (403)".to_string() },
        other => success(other),
    });

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    assert_eq!(recorder.reports().len(), 5);
    for id in ["q1", "q2", "q3", "q4", "q5"] {
        assert_eq!(recorder.report_for(id).len(), 1, "job {} should be reported once", id);
    }
    assert_eq!(recorder.report_for("q2")[0].error.as_deref(), Some(NOT_FOUND_MESSAGE));
    assert_eq!(recorder.report_for("q4")[0].error.as_deref(), Some("identity API unavailable (403)"));
    assert!(recorder.report_for("q5")[0].succeeded);
}

#[tokio::test(start_paused = true)]
async fn panicking_lookup_is_reported_as_failure_without_aborting_batch() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) =
        scripted_queue(vec![jobs(&[("q1", "1001"), ("q2", "boom"), ("q3", "1003")])], shutdown.clone());
    let lookup = ScriptedLookup { delay: Duration::ZERO };

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(2)));
    dispatcher.run(shutdown).await;

    assert_eq!(recorder.reports().len(), 3);
    let failed = &recorder.report_for("q2")[0];
    assert!(!failed.succeeded);
    assert_eq!(failed.error.as_deref(), Some(UNEXPECTED_MESSAGE));
    assert!(recorder.report_for("q1")[0].succeeded);
    assert!(recorder.report_for("q3")[0].succeeded);
}

#[tokio::test(start_paused = true)]
async fn pool_size_bounds_jobs_in_flight() {
    let shutdown = CancellationToken::new();
    let batch = jobs(&[("q1", "1"), ("q2", "2"), ("q3", "3"), ("q4", "4"), ("q5", "5"), ("q6", "6")]);
    let (queue, recorder) = scripted_queue(vec![batch], shutdown.clone());

    let dispatcher = Dispatcher::new(
        Arc::new(queue),
        Arc::new(ScriptedLookup { delay: Duration::from_secs(1) }),
        test_dispatcher_config(concurrent(2)),
    );
    let start = Instant::now();
    let step = dispatcher.run_once(&shutdown).await;

    assert_eq!(step, BatchStep::Processed(6));
    assert_eq!(recorder.reports().len(), 6);
    // six one-second lookups, two at a time
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn empty_queue_waits_idle_interval_between_fetches() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) = scripted_queue(vec![Vec::new(), Vec::new()], shutdown.clone());
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().never();

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    let fetches = recorder.fetch_times();
    assert_eq!(fetches.len(), 3);
    assert_eq!(fetches[1] - fetches[0], Duration::from_secs(30));
    assert_eq!(fetches[2] - fetches[1], Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn processed_batch_is_followed_by_short_pause() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) = scripted_queue(vec![jobs(&[("q1", "1001")])], shutdown.clone());
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().returning(|subject| success(subject));

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    let fetches = recorder.fetch_times();
    assert_eq!(fetches.len(), 2);
    assert_eq!(fetches[1] - fetches[0], Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn shutdown_reports_jobs_that_never_started() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) =
        scripted_queue(vec![jobs(&[("q1", "1001"), ("q2", "1002"), ("q3", "1003")])], shutdown.clone());

    let trigger = shutdown.clone();
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().times(1).returning(move |subject| {
        trigger.cancel();
        success(subject)
    });

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(1)));
    dispatcher.run(shutdown).await;

    assert_eq!(recorder.fetch_times().len(), 1, "no fetch after shutdown");
    let reports = recorder.reports();
    assert_eq!(reports.len(), 3);
    let started: Vec<_> = reports.iter().filter(|r| r.succeeded).collect();
    let skipped: Vec<_> = reports.iter().filter(|r| r.error.as_deref() == Some(SHUTDOWN_MESSAGE)).collect();
    assert_eq!(started.len(), 1);
    assert_eq!(skipped.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn sequential_mode_pauses_between_jobs() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) =
        scripted_queue(vec![jobs(&[("q1", "1001"), ("q2", "1002"), ("q3", "1003")])], shutdown.clone());

    let start = Instant::now();
    let started_at = Arc::new(Mutex::new(Vec::new()));
    let times = started_at.clone();
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().times(3).returning(move |subject| {
        times.lock().unwrap().push(Instant::now() - start);
        success(subject)
    });

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(DispatchMode::Sequential));
    let step = dispatcher.run_once(&shutdown).await;

    assert_eq!(step, BatchStep::Processed(3));
    assert_eq!(
        *started_at.lock().unwrap(),
        vec![Duration::ZERO, Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(recorder.reports().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn sequential_mode_stops_starting_jobs_after_shutdown() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) =
        scripted_queue(vec![jobs(&[("q1", "1001"), ("q2", "1002"), ("q3", "1003")])], shutdown.clone());

    let trigger = shutdown.clone();
    let mut lookup = MockIdentityLookup::new();
    lookup.expect_query().times(1).returning(move |_| {
        trigger.cancel();
        QueryResult::NotFound
    });

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(DispatchMode::Sequential));
    dispatcher.run(shutdown).await;

    assert_eq!(recorder.report_for("q1")[0].error.as_deref(), Some(NOT_FOUND_MESSAGE));
    assert_eq!(recorder.report_for("q2")[0].error.as_deref(), Some(SHUTDOWN_MESSAGE));
    assert_eq!(recorder.report_for("q3")[0].error.as_deref(), Some(SHUTDOWN_MESSAGE));
}

#[tokio::test(start_paused = true)]
async fn missing_captcha_configuration_is_reported_as_failure() {
    let shutdown = CancellationToken::new();
    let (queue, recorder) = scripted_queue(vec![jobs(&[("q1", SUBJECT_ID)])], shutdown.clone());
    let mut lookup = MockIdentityLookup::new();
    lookup
        .expect_query()
        .returning(|_| QueryResult::CaptchaError { detail: "captcha not configured".to_string() });

    let dispatcher = Dispatcher::new(Arc::new(queue), Arc::new(lookup), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    let report = &recorder.report_for("q1")[0];
    assert!(!report.succeeded);
    assert!(report.data.is_none());
    assert_eq!(report.error.as_deref(), Some("captcha not configured"));
}

#[tokio::test(start_paused = true)]
async fn loop_backs_off_after_unexpected_failure() {
    let shutdown = CancellationToken::new();
    let queue = Arc::new(FlakyQueue { shutdown: shutdown.clone(), fetches: Mutex::new(Vec::new()) });

    let dispatcher =
        Dispatcher::new(queue.clone(), Arc::new(MockIdentityLookup::new()), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;

    let times = queue.fetches.lock().unwrap().clone();
    assert_eq!(times.len(), 2);
    assert_eq!(times[1] - times[0], Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_before_first_fetch() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let mut queue = MockJobQueue::new();
    queue.expect_fetch_pending().never();

    let dispatcher =
        Dispatcher::new(Arc::new(queue), Arc::new(MockIdentityLookup::new()), test_dispatcher_config(concurrent(3)));
    dispatcher.run(shutdown).await;
}
