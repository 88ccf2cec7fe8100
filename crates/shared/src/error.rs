use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    PayloadTooLarge,
    Upstream,
    Unavailable,
    Internal,
}

/// JSON error body returned by the transform relay: `{"error": "...", "code": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "error")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// Best-effort extraction of a diagnostic from a failed response body.
    /// JSON error bodies yield their `error` field, anything else is returned trimmed.
    pub fn diagnostic_from_body(body: &str) -> String {
        match serde_json::from_str::<ApiError>(body) {
            Ok(parsed) => parsed.message,
            Err(_) => body.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_message_under_error_key() {
        let body = serde_json::to_value(ApiError::new(
            ErrorCode::Validation,
            "No image file provided",
        ))
        .expect("json");
        assert_eq!(body["error"], "No image file provided");
        assert_eq!(body["code"], "validation");
    }

    #[test]
    fn diagnostic_prefers_json_error_field() {
        assert_eq!(
            ApiError::diagnostic_from_body(r#"{"error":"upstream exploded"}"#),
            "upstream exploded"
        );
        assert_eq!(ApiError::diagnostic_from_body("bad image\n"), "bad image");
    }
}
