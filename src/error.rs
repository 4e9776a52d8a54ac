//! Error types for the case fetcher.

/// Result alias for the fetcher.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a run could not finish.
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

    /// Every message in the source chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut next = std::error::Error::source(self);
        while let Some(err) = next {
            messages.push(err.to_string());
            next = err.source();
        }
        messages.dedup();
        messages
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Argument rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication or session setup failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The case query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Writing the results file failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Encoding the results failed.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<sfcases_rest::Error> for Error {
    fn from(err: sfcases_rest::Error) -> Self {
        Error::with_source(ErrorKind::Query(err.kind.to_string()), err)
    }
}

impl From<sfcases_auth::Error> for Error {
    fn from(err: sfcases_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.kind.to_string()), err)
    }
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
