//! # sf-auth
//!
//! Salesforce authentication for the case fetcher.
//!
//! ## Security
//!
//! - Sensitive data (tokens, passwords, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Supported Authentication Methods
//!
//! Tried in this order by [`Authenticator::standard`]:
//!
//! 1. **Username/Password** - SOAP partner login with the security token
//!    appended to the password
//! 2. **Session ID** - a browser session id, checked with one REST call
//! 3. **OAuth 2.0 Web Server Flow** - browser redirect captured by a
//!    one-shot local [`CallbackListener`], then a token exchange
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfcases_auth::{Authenticator, CredentialStore};
//!
//! let store = CredentialStore::from_env();
//! let outcome = Authenticator::default().authenticate(&store).await;
//! let session = outcome.result?;
//! ```

mod authenticator;
mod callback;
mod error;
mod login;
mod oauth;
mod session;
pub mod store;

pub use authenticator::{
    system_browser, AttemptStatus, AuthAttempt, AuthOutcome, AuthStrategy, Authenticator,
    BrowserLauncher, OAuthStrategy, SessionIdStrategy, UsernamePasswordStrategy,
    FALLBACK_GUIDANCE,
};
pub use callback::{CallbackListener, PendingCode};
pub use error::{Error, ErrorKind, Result};
pub use login::{LoginCredentials, SoapLogin};
pub use oauth::{OAuthConfig, TokenResponse, WebFlowAuth};
pub use session::{AuthMethod, Session};
pub use store::CredentialStore;

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
