use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Authentication failed (Status: {status}): {details}")]
    Unauthorized { status: u16, details: String },

    #[error("Invalid request (Status: {status}): {details}")]
    InvalidRequest { status: u16, details: String },

    #[error("Server error (Status: {status}): {details}")]
    Server { status: u16, details: String },

    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// A superseded request, never shown to the operator
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Map a non-success HTTP status and its body text onto a variant
    pub fn from_status(status: u16, details: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized { status, details },
            400..=499 => ApiError::InvalidRequest { status, details },
            _ => ApiError::Server { status, details },
        }
    }
}
