use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a subject votes. Fields the upstream left out are empty strings, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollingPlace {
    pub nuip: String,
    pub department: String,
    pub municipality: String,
    pub station: String,
    pub address: String,
    pub table: String,
    pub zone: String,
}

impl PollingPlace {
    /// True when none of the location fields carry a value.
    pub fn has_no_location(&self) -> bool {
        [&self.department, &self.municipality, &self.station, &self.address, &self.table, &self.zone]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Outcome of one lookup. Exactly one of these is produced per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Success(PollingPlace),
    /// The upstream does not know the subject.
    NotFound,
    /// The subject exists but is excluded from the current census; `reassigned_station` is the
    /// name carried by the first reassignment record.
    NotInCensus { reassigned_station: Option<String> },
    /// `code` is `None` when no HTTP status was received at all.
    UpstreamError { code: Option<u16>, detail: String },
    CaptchaError { detail: String },
}

impl QueryResult {
    pub fn variant_name(&self) -> &'static str {
        match self {
            QueryResult::Success(_) => "success",
            QueryResult::NotFound => "not_found",
            QueryResult::NotInCensus { .. } => "not_in_census",
            QueryResult::UpstreamError { .. } => "upstream_error",
            QueryResult::CaptchaError { .. } => "captcha_error",
        }
    }
}

/// JSON body of `POST get-information`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub identification: String,
    pub identification_type: String,
    pub election_code: String,
    pub module: String,
    pub platform: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupData {
    #[serde(default)]
    pub voter: Option<Voter>,
    #[serde(default)]
    pub polling_place: Option<PollingPlaceRecord>,
    #[serde(default)]
    pub is_in_census: Option<bool>,
    #[serde(default)]
    pub novelty: Option<Vec<Novelty>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Voter {
    #[serde(default)]
    pub identification: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PollingPlaceRecord {
    #[serde(default)]
    pub stand: Option<Value>,
    #[serde(default)]
    pub table: Option<Value>,
    #[serde(default)]
    pub place_address: Option<PlaceAddress>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceAddress {
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub town: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub zone: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Novelty {
    #[serde(default)]
    pub name: Option<String>,
}
