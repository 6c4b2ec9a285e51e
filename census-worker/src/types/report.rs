use census_identity_client::{PollingPlace, QueryResult};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::job::Job;

/// Stands in for every location field the sink cannot fill for a subject excluded from the
/// census.
pub const NOT_ENABLED: &str = "NO HABILITADA";
pub const NOT_ENABLED_TABLE: &str = "0";

pub const NOT_FOUND_MESSAGE: &str = "subject not found in census";
pub const NO_DATA_MESSAGE: &str = "no data found";
pub const SHUTDOWN_MESSAGE: &str = "worker shutting down";
pub const UNEXPECTED_MESSAGE: &str = "unexpected error while processing job";
pub const INVALID_ENTRY_MESSAGE: &str = "invalid job entry";

/// What gets reported to the sink for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeReport {
    pub job_id: String,
    pub subject_id: String,
    pub succeeded: bool,
    pub data: Option<Map<String, Value>>,
    pub error: Option<String>,
}

impl OutcomeReport {
    pub fn success(job: &Job, data: Map<String, Value>) -> Self {
        Self { job_id: job.id.clone(), subject_id: job.subject_id.clone(), succeeded: true, data: Some(data), error: None }
    }

    pub fn failure(job: &Job, error: impl Into<String>) -> Self {
        Self {
            job_id: job.id.clone(),
            subject_id: job.subject_id.clone(),
            succeeded: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn from_query_result(job: &Job, result: &QueryResult) -> Self {
        match result {
            QueryResult::Success(place) if place.has_no_location() => Self::failure(job, NO_DATA_MESSAGE),
            QueryResult::Success(place) => Self::success(job, location_fields(place)),
            QueryResult::NotInCensus { reassigned_station } => {
                Self::success(job, not_enabled_fields(reassigned_station.as_deref()))
            }
            QueryResult::NotFound => Self::failure(job, NOT_FOUND_MESSAGE),
            QueryResult::UpstreamError { detail, .. } => Self::failure(job, detail.clone()),
            QueryResult::CaptchaError { detail } => Self::failure(job, detail.clone()),
        }
    }
}

/// Sink keys for a polling place. Empty values are left out entirely.
pub fn location_fields(place: &PollingPlace) -> Map<String, Value> {
    [
        ("municipio_votacion", place.municipality.as_str()),
        ("departamento_votacion", place.department.as_str()),
        ("puesto_votacion", place.station.as_str()),
        ("direccion_puesto", place.address.as_str()),
        ("mesa", place.table.as_str()),
        ("zona_votacion", place.zone.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
    .collect()
}

fn not_enabled_fields(reassigned_station: Option<&str>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("municipio_votacion".to_string(), Value::from(NOT_ENABLED));
    fields.insert("departamento_votacion".to_string(), Value::from(NOT_ENABLED));
    fields.insert("puesto_votacion".to_string(), Value::from(reassigned_station.unwrap_or(NOT_ENABLED)));
    fields.insert("direccion_puesto".to_string(), Value::from(NOT_ENABLED));
    fields.insert("mesa".to_string(), Value::from(NOT_ENABLED_TABLE));
    fields
}

/// JSON body of `POST recibir-datos`.
#[derive(Debug, Serialize)]
pub struct ReportRequest<'a> {
    pub cola_id: &'a str,
    pub cedula: &'a str,
    pub tipo: &'a str,
    pub exito: bool,
    pub datos: Option<&'a Map<String, Value>>,
    pub error: Option<&'a str>,
}

impl<'a> ReportRequest<'a> {
    pub fn new(report: &'a OutcomeReport, kind: &'a str) -> Self {
        Self {
            cola_id: &report.job_id,
            cedula: &report.subject_id,
            tipo: kind,
            exito: report.succeeded,
            datos: report.data.as_ref(),
            error: report.error.as_deref(),
        }
    }
}
