use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport-level failure. Safe to retry manually; the UI renders this
    /// as a "check your connection" class of message.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx login/first-password response carrying a server message,
    /// surfaced verbatim to the UI.
    #[error("{0}")]
    Rejected(String),

    /// 401 that survived the single refresh-retry cycle.
    #[error("Unauthorized - session expired")]
    Unauthorized,

    /// 403 on a mutating call that survived the single CSRF rotation retry.
    #[error("Request rejected: {0}")]
    CsrfRejected(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// First-login completion attempted without a setup token.
    #[error("No pending password setup")]
    NoSetupToken,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Pull the `message` field out of an error payload, falling back to the
    /// raw body when the server didn't send JSON.
    pub(crate) fn server_message(body: &str) -> String {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: String,
        }
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.message,
            Err(_) => Self::truncate_body(body),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        match status.as_u16() {
            401 => AuthError::Unauthorized,
            403 => AuthError::CsrfRejected(message),
            404 => AuthError::NotFound(message),
            500..=599 => AuthError::Server(message),
            _ => AuthError::Rejected(message),
        }
    }

    /// Whether a manual retry of the same operation can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_json_field() {
        let body = r#"{"status":"fail","message":"Invalid username or password"}"#;
        assert_eq!(
            AuthError::server_message(body),
            "Invalid username or password"
        );
    }

    #[test]
    fn test_server_message_falls_back_to_raw_body() {
        assert_eq!(AuthError::server_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_truncates_oversized_bodies() {
        let body = "x".repeat(2000);
        let message = AuthError::server_message(&body);
        assert!(message.len() < 600);
        assert!(message.contains("truncated"));
    }

    #[test]
    fn test_from_status_taxonomy() {
        use reqwest::StatusCode;

        assert!(matches!(
            AuthError::from_status(StatusCode::UNAUTHORIZED, ""),
            AuthError::Unauthorized
        ));
        assert!(matches!(
            AuthError::from_status(StatusCode::FORBIDDEN, "nope"),
            AuthError::CsrfRejected(_)
        ));
        assert!(matches!(
            AuthError::from_status(StatusCode::BAD_GATEWAY, ""),
            AuthError::Server(_)
        ));
        assert!(matches!(
            AuthError::from_status(StatusCode::BAD_REQUEST, "bad creds"),
            AuthError::Rejected(_)
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AuthError::Timeout.is_retryable());
        assert!(!AuthError::Unauthorized.is_retryable());
        assert!(!AuthError::Rejected("x".into()).is_retryable());
    }
}
