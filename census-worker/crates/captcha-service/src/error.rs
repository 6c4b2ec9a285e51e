#[derive(Debug, thiserror::Error)]
pub enum CaptchaError {
    #[error("Network error during {operation}: {message}")]
    NetworkError { operation: String, message: String },

    #[error("Failed to build URL for {operation}: {message}")]
    UrlError { operation: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CaptchaError {
    pub fn from_reqwest_error(operation: impl Into<String>, source: reqwest::Error) -> Self {
        let operation = operation.into();
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            format!("connection failed: {}", source)
        } else {
            source.to_string()
        };
        CaptchaError::NetworkError { operation, message }
    }

    pub fn url_error(operation: impl Into<String>, source: url::ParseError) -> Self {
        CaptchaError::UrlError { operation: operation.into(), message: source.to_string() }
    }
}
