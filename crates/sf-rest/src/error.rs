//! Error types for sf-rest.

/// Result alias for sf-rest.
pub type Result<T> = std::result::Result<T, Error>;

/// A query that could not be built or run.
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

    /// The org no longer accepts the session.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The org rejected the statement with an error code.
    #[error("{error_code}: {message}")]
    Salesforce { error_code: String, message: String },

    /// The statement was refused before anything was sent.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// No usable answer: transport failure, rate limit or bare status.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<sfcases_client::Error> for Error {
    fn from(err: sfcases_client::Error) -> Self {
        use sfcases_client::ErrorKind as Client;

        let kind = match &err.kind {
            Client::Api {
                error_code,
                message,
                ..
            } => ErrorKind::Salesforce {
                error_code: error_code.clone(),
                message: message.clone(),
            },
            Client::Unauthorized { message, .. } => ErrorKind::Authentication(message.clone()),
            Client::Body(message) => ErrorKind::Json(message.clone()),
            other => ErrorKind::Http(other.to_string()),
        };
        Error::with_source(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfcases_client::ErrorKind as Client;

    #[test]
    fn test_api_fault_keeps_code_and_cause() {
        let err: Error = sfcases_client::Error::new(Client::Api {
            status: 400,
            error_code: "MALFORMED_QUERY".into(),
            message: "unexpected token: FROM".into(),
        })
        .into();

        assert_eq!(err.to_string(), "MALFORMED_QUERY: unexpected token: FROM");
        assert!(err.source.is_some());
    }

    #[test]
    fn test_refused_session_is_auth_error() {
        let err: Error = sfcases_client::Error::new(Client::Unauthorized {
            status: 401,
            message: "INVALID_SESSION_ID: Session expired or invalid".into(),
        })
        .into();
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_other_failures_become_http() {
        for kind in [
            Client::RateLimited,
            Client::Transport("connection reset".into()),
            Client::Status {
                status: 502,
                message: "Bad Gateway".into(),
            },
        ] {
            let err: Error = sfcases_client::Error::new(kind).into();
            assert!(matches!(err.kind, ErrorKind::Http(_)), "{err}");
        }
    }
}
