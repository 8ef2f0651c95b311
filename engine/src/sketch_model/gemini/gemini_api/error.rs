use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Gemini `generateContent` endpoint
#[derive(Debug, Error)]
pub enum GeminiApiError {
    #[error("Invalid argument (400): {message}")]
    InvalidArgument { message: String },

    /// A 400 whose details carry the `API_KEY_INVALID` reason
    #[error("API key not valid (400): {message}")]
    ApiKeyInvalid { message: String },

    #[error("Unauthenticated (401): {message}")]
    Unauthenticated { message: String },

    #[error("Permission denied (403): {message}")]
    PermissionDenied { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Resource exhausted (429): {message}")]
    ResourceExhausted { message: String },

    #[error("Internal API error (500): {message}")]
    Internal { message: String },

    #[error("Service unavailable (503): {message}")]
    Unavailable { message: String },

    #[error("Deadline exceeded (504): {message}")]
    DeadlineExceeded { message: String },

    /// Catch-all for statuses we don't know
    #[error("Unexpected API error {status}: {message}")]
    Unexpected { status: String, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Couldn't parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

impl GeminiApiError {
    pub fn from_status(status: &str, message: impl Into<String>) -> Self {
        let message = message.into();

        match status {
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" => Self::InvalidArgument { message },
            "UNAUTHENTICATED" => Self::Unauthenticated { message },
            "PERMISSION_DENIED" => Self::PermissionDenied { message },
            "NOT_FOUND" => Self::NotFound { message },
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted { message },
            "INTERNAL" => Self::Internal { message },
            "UNAVAILABLE" => Self::Unavailable { message },
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded { message },
            other => Self::Unexpected {
                status: other.to_string(),
                message,
            },
        }
    }

    /// Builds the error from a non-success response. Bodies that aren't the
    /// usual `{"error": {...}}` envelope end up in `Unexpected`.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let Ok(ErrorEnvelope { error }) = serde_json::from_str::<ErrorEnvelope>(body) else {
            return Self::Unexpected {
                status: status.to_string(),
                message: body.to_string(),
            };
        };

        let key_invalid = error
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"));
        if key_invalid {
            return Self::ApiKeyInvalid {
                message: error.message,
            };
        }

        Self::from_status(&error.status, error.message)
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument { message }
            | Self::ApiKeyInvalid { message }
            | Self::Unauthenticated { message }
            | Self::PermissionDenied { message }
            | Self::NotFound { message }
            | Self::ResourceExhausted { message }
            | Self::Internal { message }
            | Self::Unavailable { message }
            | Self::DeadlineExceeded { message }
            | Self::Unexpected { message, .. } => message.clone(),
            Self::Transport(e) => e.to_string(),
            Self::Decode(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_invalid_reason_wins_over_status() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT", "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID", "domain": "googleapis.com"}]}}"#;
        let err = GeminiApiError::from_response(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, GeminiApiError::ApiKeyInvalid { .. }));
    }

    #[test]
    fn status_mapping() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        let err = GeminiApiError::from_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, GeminiApiError::NotFound { .. }));
        assert_eq!(err.message(), "Requested entity was not found.");

        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = GeminiApiError::from_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, GeminiApiError::ResourceExhausted { .. }));
    }

    #[test]
    fn unparsable_body_is_unexpected() {
        let body = "<html>bad gateway</html>";
        let err = GeminiApiError::from_response(StatusCode::BAD_GATEWAY, body);
        let GeminiApiError::Unexpected { status, message } = err else {
            panic!("expected Unexpected, got {err:?}");
        };
        assert_eq!(status, "502 Bad Gateway");
        assert_eq!(message, "<html>bad gateway</html>");
    }
}
