//! Errors raised while talking to an org.

/// Result alias used throughout sf-client.
pub type Result<T> = std::result::Result<T, Error>;

/// A failed call, classified by where it went wrong.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Underlying transport or decoding error, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Wrap a kind with no underlying cause.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Wrap a kind together with the error that caused it.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// True when the org refused the session or token (401/403).
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized { .. })
    }
}

/// How a call failed.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// No response: DNS, connect, TLS or timeout.
    #[error("request did not complete: {0}")]
    Transport(String),

    /// The org answered 401 or 403.
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The org answered 429.
    #[error("request limit exceeded (429)")]
    RateLimited,

    /// The org answered with a `[{errorCode, message}]` document.
    #[error("{error_code}: {message}")]
    Api {
        status: u16,
        error_code: String,
        message: String,
    },

    /// Any other non-2xx answer without a recognizable error document.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// A body could not be encoded or decoded.
    #[error("malformed body: {0}")]
    Body(String),

    /// A URL or client setting was unusable.
    #[error("invalid client setup: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_decode() || err.is_body() {
            ErrorKind::Body(err.to_string())
        } else if err.is_builder() {
            ErrorKind::Setup(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Body(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Body(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Setup(format!("bad URL: {err}")), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unauthorized_is_auth_error() {
        let err = Error::new(ErrorKind::Unauthorized {
            status: 403,
            message: "API_DISABLED_FOR_ORG".into(),
        });
        assert!(err.is_auth_error());
        assert_eq!(err.to_string(), "unauthorized (403): API_DISABLED_FOR_ORG");

        assert!(!Error::new(ErrorKind::RateLimited).is_auth_error());
        assert!(!Error::new(ErrorKind::Transport("reset".into())).is_auth_error());
    }

    #[test]
    fn test_api_error_shows_code_and_message() {
        let err = Error::new(ErrorKind::Api {
            status: 400,
            error_code: "MALFORMED_QUERY".into(),
            message: "unexpected token: LAST_N".into(),
        });
        assert_eq!(err.to_string(), "MALFORMED_QUERY: unexpected token: LAST_N");
    }

    #[test]
    fn test_json_and_url_failures_keep_their_cause() {
        let err: Error = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err.kind, ErrorKind::Body(_)));
        assert!(err.source.is_some());

        let err: Error = url::Url::parse("::nope").unwrap_err().into();
        assert!(matches!(err.kind, ErrorKind::Setup(_)));
        assert!(err.to_string().contains("bad URL"));
    }
}
