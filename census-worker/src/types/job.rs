use census_utils::json::scalar_to_string;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A pending lookup handed out by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "cedula", deserialize_with = "string_or_number")]
    pub subject_id: String,
}

impl Job {
    pub fn new(id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self { id: id.into(), subject_id: subject_id.into() }
    }
}

/// Body of `GET consultas-pendientes`. Entries are kept raw so one bad entry cannot hide the
/// rest of the batch.
#[derive(Debug, Default, Deserialize)]
pub struct PendingJobsResponse {
    #[serde(default)]
    pub consultas: Vec<Value>,
}

/// A `consultas` entry that cannot be processed. `id` is `None` when the entry carries no usable
/// id, in which case it cannot be reported back either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub id: Option<String>,
    pub subject_id: String,
    pub reason: String,
}

impl PendingJobsResponse {
    /// Usable jobs and rejected entries, both in queue order.
    pub fn into_jobs(self) -> (Vec<Job>, Vec<RejectedEntry>) {
        let mut jobs = Vec::with_capacity(self.consultas.len());
        let mut rejected = Vec::new();

        for entry in self.consultas {
            match serde_json::from_value::<Job>(entry.clone()) {
                Ok(job) if !job.subject_id.trim().is_empty() => jobs.push(job),
                Ok(job) => rejected.push(RejectedEntry {
                    id: Some(job.id),
                    subject_id: job.subject_id,
                    reason: "empty cedula".to_string(),
                }),
                Err(e) => rejected.push(RejectedEntry {
                    id: scalar_field(&entry, "id").filter(|id| !id.trim().is_empty()),
                    subject_id: scalar_field(&entry, "cedula").unwrap_or_default(),
                    reason: e.to_string(),
                }),
            }
        }

        (jobs, rejected)
    }
}

fn scalar_field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key) {
        Some(value @ (Value::String(_) | Value::Number(_))) => Some(scalar_to_string(Some(value))),
        _ => None,
    }
}

/// The queue is not consistent about quoting ids, so accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(_) | Value::Number(_) => Ok(scalar_to_string(Some(&value))),
        other => Err(serde::de::Error::custom(format!("expected a string or number, got {}", other))),
    }
}
