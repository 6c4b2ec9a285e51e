use serde::Deserialize;
use serde_json::Value;

/// A challenge accepted by the solving service, alive until a token is returned or the
/// attempt fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaTask {
    pub challenge_id: String,
    pub site_key: String,
    pub page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Token(String),
    Failed(FailureReason),
}

impl SolveOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            SolveOutcome::Token(token) => Some(token),
            SolveOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No API key was configured; no request was sent.
    NotConfigured,
    /// `in.php` refused the challenge.
    Rejected(String),
    /// The body could not be read as JSON, even after salvage.
    Malformed,
    /// `res.php` answered with a terminal error code.
    ServiceError(String),
    /// The poll ceiling was reached without a solution.
    Timeout,
    Transport(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NotConfigured => write!(f, "not configured"),
            FailureReason::Rejected(reason) => write!(f, "submission rejected: {}", reason),
            FailureReason::Malformed => write!(f, "malformed response"),
            FailureReason::ServiceError(code) => write!(f, "service error: {}", code),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::Transport(message) => write!(f, "transport error: {}", message),
        }
    }
}

/// Shape shared by `in.php` and `res.php` when called with `json=1`.
#[derive(Debug, Clone, Deserialize)]
pub struct TwoCaptchaResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub request: Value,
}

impl TwoCaptchaResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 1
    }

    /// `request` holds the task id, the token or an error code depending on the call.
    pub fn request_text(&self) -> String {
        match &self.request {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
