use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformErrorKind {
    RemoteTransform,
    Network,
    InvalidEndpoint,
}

#[derive(Debug, Error)]
pub enum TransformError {
    /// The service answered with a non-success status. `body` is the raw diagnostic text.
    #[error("remote transform failed with HTTP {status}: {body}")]
    RemoteTransform { status: u16, body: String },
    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid transform endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

impl TransformError {
    pub fn kind(&self) -> TransformErrorKind {
        match self {
            TransformError::RemoteTransform { .. } => TransformErrorKind::RemoteTransform,
            TransformError::Network(_) => TransformErrorKind::Network,
            TransformError::InvalidEndpoint { .. } => TransformErrorKind::InvalidEndpoint,
        }
    }

    /// Text shown on the visible failure surface.
    pub fn user_message(&self) -> String {
        match self {
            TransformError::RemoteTransform { status, body } => {
                let diagnostic = ApiError::diagnostic_from_body(body);
                if diagnostic.is_empty() {
                    format!("Transformation service rejected the image (HTTP {status})")
                } else {
                    format!("Transformation service rejected the image (HTTP {status}): {diagnostic}")
                }
            }
            TransformError::Network(reason) => {
                format!("Could not reach the transformation service: {reason}")
            }
            TransformError::InvalidEndpoint { endpoint, reason } => {
                format!("Transformation endpoint '{endpoint}' is not usable: {reason}")
            }
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransformError::Network(format!("request timed out: {err}"))
        } else {
            TransformError::Network(err.to_string())
        }
    }
}
