use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("A submission is already in progress")]
    SubmitInProgress,

    #[error("Missing required entries: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build submission: {0}")]
    Encode(reqwest::Error),

    #[error("HTTP client error: {0}")]
    Request(reqwest::Error),

    #[error("Relay rejected submission with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Failed to read attachment: {0}")]
    Io(#[from] std::io::Error),
}
