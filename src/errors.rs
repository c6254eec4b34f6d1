use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}")]
    Status {
        status: StatusCode,
        /// Message extracted from a JSON error body, if the backend sent one.
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Text shown to the user for this failure.
    ///
    /// Structured server messages and local validation text win over the
    /// static `fallback`; everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Status {
                message: Some(m), ..
            } => m.clone(),
            ClientError::Validation(m) => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ..}`, `{"error": ..}` (string or `{ "message": .. }`)
/// and `{"detail": ..}`. Anything else yields `None`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    let candidate = v
        .get("message")
        .or_else(|| v.get("error").and_then(|e| e.get("message").or(Some(e))))
        .or_else(|| v.get("detail"))?;

    candidate
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_field() {
        let body = r#"{"message": "Current password is incorrect"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Current password is incorrect")
        );
    }

    #[test]
    fn test_extract_nested_error_message() {
        let body = r#"{"error": {"message": "email taken", "code": 409}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("email taken"));

        let body = r#"{"error": "invalid_request"}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("invalid_request")
        );
    }

    #[test]
    fn test_extract_ignores_non_json_and_blank() {
        assert!(extract_error_message("<html>502</html>").is_none());
        assert!(extract_error_message(r#"{"message": "  "}"#).is_none());
        assert!(extract_error_message(r#"{"status": 500}"#).is_none());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Password too short".into()),
        };
        assert_eq!(err.user_message("Failed"), "Password too short");

        let err = ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.user_message("Failed"), "Failed");

        let err = ClientError::Decode("eof".into());
        assert_eq!(err.user_message("Failed"), "Failed");
    }
}
