//! Error types for sf-auth.
//!
//! Messages name configuration keys and endpoints, never their secret values.

use std::time::Duration;

/// Result alias for sf-auth.
pub type Result<T> = std::result::Result<T, Error>;

/// An authentication step that did not produce a session.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// A required key was absent, so the strategy should be skipped rather
    /// than counted as failed.
    pub fn is_missing_config(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingConfig(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// The org refused the credentials, session id or code.
    #[error("Authentication rejected: {0}")]
    AuthFailure(String),

    /// Non-200 from the token endpoint; `body` is exactly what it sent.
    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchange { status: u16, body: String },

    /// The callback socket could not be bound, or the request it got
    /// carried no code.
    #[error("Callback listener error: {0}")]
    Listener(String),

    #[error("No OAuth callback received within {0:?}")]
    CallbackTimeout(Duration),

    #[error("All authentication methods failed")]
    AllStrategiesFailed,

    /// The org could not be reached or answered unexpectedly.
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidInput(format!("invalid URL: {err}")), err)
    }
}

impl From<sfcases_client::Error> for Error {
    fn from(err: sfcases_client::Error) -> Self {
        use sfcases_client::ErrorKind as Client;

        let kind = match &err.kind {
            Client::Unauthorized { message, .. } => ErrorKind::AuthFailure(message.clone()),
            Client::Body(message) => ErrorKind::Json(message.clone()),
            Client::Setup(message) => ErrorKind::InvalidInput(message.clone()),
            other => {
                let message = other.to_string();
                if message.contains("Bearer ") {
                    ErrorKind::Transport("request failed (details withheld)".to_string())
                } else {
                    ErrorKind::Transport(message)
                }
            }
        };
        Error::with_source(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfcases_client::ErrorKind as Client;

    #[test]
    fn test_token_exchange_display_keeps_body() {
        let err = Error::new(ErrorKind::TokenExchange {
            status: 429,
            body: r#"{"error":"rate_limited"}"#.to_string(),
        });
        assert_eq!(
            err.to_string(),
            r#"Token exchange failed with status 429: {"error":"rate_limited"}"#
        );
        assert!(ErrorKind::CallbackTimeout(Duration::from_secs(120))
            .to_string()
            .ends_with("within 120s"));
    }

    #[test]
    fn test_only_missing_config_is_skippable() {
        assert!(Error::new(ErrorKind::MissingConfig("SALESFORCE_SESSION_ID".into())).is_missing_config());
        assert!(!Error::new(ErrorKind::AuthFailure("INVALID_LOGIN".into())).is_missing_config());
    }

    #[test]
    fn test_client_errors_are_mapped_by_kind() {
        let err: Error = sfcases_client::Error::new(Client::Unauthorized {
            status: 401,
            message: "INVALID_SESSION_ID: Session expired or invalid".into(),
        })
        .into();
        assert!(matches!(err.kind, ErrorKind::AuthFailure(ref m) if m.starts_with("INVALID_SESSION_ID")));
        assert!(err.source.is_some());

        let err: Error = sfcases_client::Error::new(Client::RateLimited).into();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));

        let err: Error = sfcases_client::Error::new(Client::Body("expected value".into())).into();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
    }

    #[test]
    fn test_bearer_values_are_withheld() {
        let err: Error =
            sfcases_client::Error::new(Client::Transport("Authorization: Bearer 00Dabc!x".into()))
                .into();
        assert!(!err.to_string().contains("00Dabc"));
    }
}
