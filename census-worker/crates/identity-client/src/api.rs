//! Payloads for the lookup endpoint and classification of its 200 replies.

use census_utils::http::truncate_text;
use census_utils::json::scalar_to_string;
use serde_json::Value;
use tracing::warn;

use crate::constants::{IDENTIFICATION_TYPE, LOOKUP_MODULE, LOOKUP_PLATFORM, NOT_FOUND_STATUS_CODE};
use crate::types::{LookupData, LookupRequest, LookupResponse, PollingPlace, QueryResult};

const INVALID_BODY: &str = "empty or invalid body";

pub struct IdentityApiOperations;

impl IdentityApiOperations {
    pub fn build_lookup_request(subject_id: &str, election_code: &str) -> LookupRequest {
        LookupRequest {
            identification: subject_id.to_string(),
            identification_type: IDENTIFICATION_TYPE.to_string(),
            election_code: election_code.to_string(),
            module: LOOKUP_MODULE.to_string(),
            platform: LOOKUP_PLATFORM.to_string(),
        }
    }

    /// Classifies the body of a 200 reply for `subject_id`.
    pub fn classify(body: &str, subject_id: &str) -> QueryResult {
        let response = match serde_json::from_str::<LookupResponse>(body) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, body = %truncate_text(body, 200), "Lookup reply is not valid JSON");
                return invalid_body();
            }
        };

        if response.status == Some(false) && response.status_code == Some(NOT_FOUND_STATUS_CODE) {
            return QueryResult::NotFound;
        }

        let data = match (response.status, response.data) {
            (Some(true), Some(data)) if !is_empty(&data) => data,
            _ => return invalid_body(),
        };

        let data = match serde_json::from_value::<LookupData>(data) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Lookup payload has an unexpected shape");
                return invalid_body();
            }
        };

        if !data.is_in_census.unwrap_or(true) {
            if let Some(novelty) = data.novelty.as_ref().and_then(|records| records.first()) {
                let reassigned_station = novelty.name.clone().filter(|name| !name.trim().is_empty());
                return QueryResult::NotInCensus { reassigned_station };
            }
        }

        QueryResult::Success(Self::polling_place(&data, subject_id))
    }

    fn polling_place(data: &LookupData, subject_id: &str) -> PollingPlace {
        let nuip = data
            .voter
            .as_ref()
            .and_then(|voter| voter.identification.as_ref())
            .filter(|id| !id.is_null())
            .map(|id| scalar_to_string(Some(id)))
            .unwrap_or_else(|| subject_id.to_string());

        let place = data.polling_place.as_ref();
        let address = place.and_then(|place| place.place_address.as_ref());

        PollingPlace {
            nuip,
            department: scalar_to_string(address.and_then(|a| a.state.as_ref())),
            municipality: scalar_to_string(address.and_then(|a| a.town.as_ref())),
            station: scalar_to_string(place.and_then(|p| p.stand.as_ref())),
            address: scalar_to_string(address.and_then(|a| a.address.as_ref())),
            table: scalar_to_string(place.and_then(|p| p.table.as_ref())),
            zone: scalar_to_string(address.and_then(|a| a.zone.as_ref())),
        }
    }
}

fn invalid_body() -> QueryResult {
    QueryResult::UpstreamError { code: Some(200), detail: INVALID_BODY.to_string() }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}
