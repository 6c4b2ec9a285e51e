use httpmock::prelude::*;
use rstest::rstest;
use serde_json::json;
use url::Url;

use crate::core::client::queue::{JobQueue, JobQueueClient, QueueValidatedArgs};
use crate::tests::common::constants::{API_TOKEN, JOB_KIND, SUBJECT_ID};
use crate::tests::common::polling_place;
use crate::types::report::{location_fields, INVALID_ENTRY_MESSAGE, NOT_FOUND_MESSAGE};
use crate::types::{Job, OutcomeReport};

const PENDING_PATH: &str = "/functions/v1/consultas-pendientes";
const REPORT_PATH: &str = "/functions/v1/recibir-datos";

fn queue_client(server: &MockServer) -> JobQueueClient {
    // no trailing slash on purpose, the client normalises it
    let service_url = Url::parse(&server.url("/functions/v1")).expect("mock server url");
    JobQueueClient::new_with_args(&QueueValidatedArgs { service_url, api_token: API_TOKEN.to_string() })
        .expect("client should build")
}

fn failed_report() -> OutcomeReport {
    OutcomeReport::failure(&Job::new("q9", SUBJECT_ID), NOT_FOUND_MESSAGE)
}

#[tokio::test]
async fn fetch_sends_token_kind_and_limit() {
    let server = MockServer::start_async().await;
    let pending = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(PENDING_PATH)
                .header("authorization", format!("Bearer {}", API_TOKEN))
                .query_param("tipo", JOB_KIND)
                .query_param("limit", "5");
            then.status(200).json_body(json!({
                "consultas": [
                    { "id": "q1", "cedula": "12345678" },
                    { "id": 42, "cedula": 87654321 }
                ]
            }));
        })
        .await;

    let jobs = queue_client(&server).fetch_pending(JOB_KIND, 5).await;

    pending.assert_async().await;
    assert_eq!(jobs, vec![Job::new("q1", "12345678"), Job::new("42", "87654321")]);
}

#[tokio::test]
async fn fetch_without_consultas_key_is_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PENDING_PATH);
            then.status(200).json_body(json!({}));
        })
        .await;

    assert!(queue_client(&server).fetch_pending(JOB_KIND, 5).await.is_empty());
}

#[tokio::test]
async fn invalid_entries_do_not_hide_the_rest_of_the_batch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PENDING_PATH);
            then.status(200).json_body(json!({
                "consultas": [
                    { "id": "q1", "cedula": "111" },
                    { "id": "q2", "cedula": null },
                    { "cedula": "222" },
                    { "id": "q3", "cedula": "333" }
                ]
            }));
        })
        .await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST).path(REPORT_PATH).json_body(json!({
                "cola_id": "q2",
                "cedula": "",
                "tipo": JOB_KIND,
                "exito": false,
                "datos": null,
                "error": INVALID_ENTRY_MESSAGE
            }));
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    let jobs = queue_client(&server).fetch_pending(JOB_KIND, 5).await;

    assert_eq!(jobs, vec![Job::new("q1", "111"), Job::new("q3", "333")]);
    rejected.assert_hits_async(1).await;
}

#[rstest]
#[case::unauthorized(401, "{\"error\":\"invalid token\"}")]
#[case::server_error(500, "internal error")]
#[case::not_json(200, "<html>maintenance</html>")]
#[tokio::test]
async fn fetch_failures_yield_empty_batch(#[case] status: u16, #[case] body: &str) {
    let server = MockServer::start_async().await;
    let pending = server
        .mock_async(|when, then| {
            when.method(GET).path(PENDING_PATH);
            then.status(status).body(body);
        })
        .await;

    let jobs = queue_client(&server).fetch_pending(JOB_KIND, 5).await;

    pending.assert_async().await;
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn fetch_from_unreachable_queue_is_empty() {
    let args = QueueValidatedArgs {
        service_url: Url::parse("http://127.0.0.1:9/functions/v1/").expect("valid url"),
        api_token: API_TOKEN.to_string(),
    };
    let client = JobQueueClient::new_with_args(&args).expect("client should build");

    assert!(client.fetch_pending(JOB_KIND, 5).await.is_empty());
}

#[tokio::test]
async fn success_report_body_carries_location_fields() {
    let server = MockServer::start_async().await;
    let job = Job::new("q1", SUBJECT_ID);
    let report = OutcomeReport::success(&job, location_fields(&polling_place(SUBJECT_ID)));
    let sink = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(REPORT_PATH)
                .header("authorization", format!("Bearer {}", API_TOKEN))
                .header("content-type", "application/json")
                .json_body(json!({
                    "cola_id": "q1",
                    "cedula": SUBJECT_ID,
                    "tipo": JOB_KIND,
                    "exito": true,
                    "datos": {
                        "municipio_votacion": "MEDELLIN",
                        "departamento_votacion": "ANTIOQUIA",
                        "puesto_votacion": "IE JAVIERA LONDONO",
                        "direccion_puesto": "CL 48 # 40-20",
                        "mesa": "12",
                        "zona_votacion": "04"
                    },
                    "error": null
                }));
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    assert!(queue_client(&server).report_outcome(JOB_KIND, &report).await);
    sink.assert_async().await;
}

#[tokio::test]
async fn failure_report_body_carries_error() {
    let server = MockServer::start_async().await;
    let sink = server
        .mock_async(|when, then| {
            when.method(POST).path(REPORT_PATH).json_body(json!({
                "cola_id": "q9",
                "cedula": SUBJECT_ID,
                "tipo": JOB_KIND,
                "exito": false,
                "datos": null,
                "error": NOT_FOUND_MESSAGE
            }));
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    assert!(queue_client(&server).report_outcome(JOB_KIND, &failed_report()).await);
    sink.assert_async().await;
}

#[rstest]
#[case::unauthorized(401, "{\"error\":\"invalid token\"}")]
#[case::not_found(404, "not found")]
#[case::server_error(503, "unavailable")]
#[case::not_acknowledged(200, "{\"success\":false}")]
#[case::missing_flag(200, "{}")]
#[case::not_json(200, "ok")]
#[tokio::test]
async fn unacknowledged_reports_return_false(#[case] status: u16, #[case] body: &str) {
    let server = MockServer::start_async().await;
    let sink = server
        .mock_async(|when, then| {
            when.method(POST).path(REPORT_PATH);
            then.status(status).body(body);
        })
        .await;

    assert!(!queue_client(&server).report_outcome(JOB_KIND, &failed_report()).await);
    sink.assert_async().await;
}

#[tokio::test]
async fn identical_reports_are_each_delivered() {
    let server = MockServer::start_async().await;
    let sink = server
        .mock_async(|when, then| {
            when.method(POST).path(REPORT_PATH);
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;
    let client = queue_client(&server);
    let report = failed_report();

    assert!(client.report_outcome(JOB_KIND, &report).await);
    assert!(client.report_outcome(JOB_KIND, &report).await);
    sink.assert_hits_async(2).await;
}
