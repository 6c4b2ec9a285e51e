//! Request building and response parsing for `in.php` / `res.php`.
//!
//! Nothing here sends requests or sleeps. The service is known to occasionally return
//! corrupted or concatenated JSON payloads, so parsing falls back to the first balanced
//! `{...}` object found in the raw text before giving up. That fallback is intentional
//! resilience and should stay.

use census_utils::http::truncate_text;
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{NOT_READY, RECAPTCHA_METHOD};
use crate::transport::{FormFields, RawResponse};
use crate::types::{FailureReason, TwoCaptchaResponse};

/// Result of a single `res.php` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Solved(String),
    NotReady,
    /// Unreadable reply; counts as an attempt but does not end polling.
    Transient,
    Failed(FailureReason),
}

pub struct CaptchaApiOperations;

impl CaptchaApiOperations {
    pub fn build_submit_form(api_key: &str, site_key: &str, page_url: &str) -> FormFields {
        vec![
            ("key", api_key.to_string()),
            ("method", RECAPTCHA_METHOD.to_string()),
            ("googlekey", site_key.to_string()),
            ("pageurl", page_url.to_string()),
            ("json", "1".to_string()),
        ]
    }

    pub fn build_poll_query(api_key: &str, challenge_id: &str) -> FormFields {
        vec![
            ("key", api_key.to_string()),
            ("action", "get".to_string()),
            ("id", challenge_id.to_string()),
            ("json", "1".to_string()),
        ]
    }

    /// Parses a solver reply, salvaging the first embedded object when the body is not valid
    /// JSON. Returns `None` for non-200 replies or bodies with nothing usable in them.
    pub fn parse_response(response: &RawResponse, operation: &str) -> Option<TwoCaptchaResponse> {
        if response.status != reqwest::StatusCode::OK {
            warn!(
                operation = operation,
                status = %response.status,
                body = %truncate_text(&response.body, 100),
                "Solver returned a non-200 status"
            );
            return None;
        }

        match serde_json::from_str::<TwoCaptchaResponse>(&response.body) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(
                    operation = operation,
                    error = %e,
                    raw = %truncate_text(&response.body, 200),
                    "Solver returned invalid JSON, attempting salvage"
                );
                let salvaged = extract_first_json_object(&response.body)
                    .and_then(|value| serde_json::from_value::<TwoCaptchaResponse>(value).ok());
                if salvaged.is_some() {
                    debug!(operation = operation, "Recovered solver response from malformed body");
                }
                salvaged
            }
        }
    }

    /// Maps a submission reply to the id of the accepted challenge.
    pub fn parse_submit(response: &RawResponse) -> Result<String, FailureReason> {
        let parsed = Self::parse_response(response, "submit").ok_or(FailureReason::Malformed)?;
        if !parsed.is_ok() {
            return Err(FailureReason::Rejected(parsed.request_text()));
        }
        Ok(parsed.request_text())
    }

    pub fn classify_poll(response: &RawResponse) -> PollStep {
        let Some(parsed) = Self::parse_response(response, "poll") else {
            return PollStep::Transient;
        };
        if parsed.is_ok() {
            return PollStep::Solved(parsed.request_text());
        }
        let code = parsed.request_text();
        if code == NOT_READY {
            PollStep::NotReady
        } else {
            PollStep::Failed(FailureReason::ServiceError(code))
        }
    }
}

/// Scans `text` for brace-balanced objects and returns the first one that parses.
///
/// Braces inside JSON strings are ignored, so a token containing `{` does not shift the
/// window.
pub fn extract_first_json_object(text: &str) -> Option<Value> {
    let text = text.trim();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=i]) {
                            return Some(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}
