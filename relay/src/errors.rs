use axum::extract::multipart::{MultipartError, MultipartRejection};
use http::StatusCode;
use thiserror::Error;

use crate::config::ValidationError;

/// Errors that can occur while relaying a submission
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("Failed to decode submission: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to build collector payload: {0}")]
    Encode(reqwest::Error),

    #[error("Forwarding failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("Collector rejected submission with status {0}")]
    CollectorRejected(StatusCode),
}

impl RelayError {
    /// Whether the failure happened at or after the outbound call.
    pub fn is_forwarding_failure(&self) -> bool {
        matches!(
            self,
            RelayError::Forward(_) | RelayError::CollectorRejected(_)
        )
    }

    /// Metric tag for a failure that happened before anything was forwarded.
    pub fn rejection_reason(&self) -> &'static str {
        match self {
            RelayError::Decode(_) => "decode_failed",
            RelayError::Encode(_) => "encode_failed",
            RelayError::Io(_) => "io",
            RelayError::Forward(_) | RelayError::CollectorRejected(_) => "forward_failed",
            RelayError::Config(_) | RelayError::HttpClient(_) => "internal",
        }
    }

    /// The opaque message returned to the caller. Never includes the
    /// collector address or the underlying error text.
    pub fn public_message(&self) -> &'static str {
        if self.is_forwarding_failure() {
            "Failed to submit complaint"
        } else {
            "Server error"
        }
    }
}

/// Errors raised while decoding the inbound multipart body
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("request is not a valid multipart body: {0}")]
    Rejected(#[from] MultipartRejection),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("file part {part} exceeds the {limit} byte limit")]
    FileTooLarge { part: String, limit: u64 },

    #[error("failed to stage file part: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the outbound call to the collector
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("collector request failed: {0}")]
    Request(reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_messages_are_opaque() {
        let rejected = RelayError::CollectorRejected(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rejected.public_message(), "Failed to submit complaint");
        assert!(rejected.is_forwarding_failure());

        let decode = RelayError::Decode(DecodeError::FileTooLarge {
            part: "aobContract".into(),
            limit: 10,
        });
        assert_eq!(decode.public_message(), "Server error");
        assert!(!decode.is_forwarding_failure());

        let io = RelayError::Io(std::io::Error::other("disk full"));
        assert_eq!(io.public_message(), "Server error");
    }

    #[test]
    fn test_rejection_reasons() {
        let decode = RelayError::Decode(DecodeError::FileTooLarge {
            part: "denial".into(),
            limit: 1,
        });
        assert_eq!(decode.rejection_reason(), "decode_failed");
        assert_eq!(
            RelayError::Io(std::io::Error::other("disk full")).rejection_reason(),
            "io"
        );
        assert_eq!(
            RelayError::CollectorRejected(StatusCode::BAD_GATEWAY).rejection_reason(),
            "forward_failed"
        );
    }
}
