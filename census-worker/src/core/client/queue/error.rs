use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Network error during {operation}: {message}")]
    NetworkError { operation: String, message: String },

    #[error("Queue service rejected {operation} with status {status}")]
    Rejected { operation: String, status: StatusCode },

    #[error("Failed to parse {operation} response: {message}")]
    ParseError { operation: String, message: String },

    #[error("Failed to build URL for {operation}: {message}")]
    UrlError { operation: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl QueueError {
    pub fn from_reqwest_error(operation: impl Into<String>, source: reqwest::Error) -> Self {
        let operation = operation.into();
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            format!("connection failed: {}", source)
        } else {
            source.to_string()
        };
        QueueError::NetworkError { operation, message }
    }

    pub fn parse_error(operation: impl Into<String>, source: serde_json::Error) -> Self {
        QueueError::ParseError { operation: operation.into(), message: source.to_string() }
    }
}
