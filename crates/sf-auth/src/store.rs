//! Credential store: an immutable snapshot of the `SALESFORCE_*` settings.
//!
//! Values are read once (from the process environment, after loading an
//! optional `.env` file) and then passed explicitly to every strategy.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

/// Salesforce username (email).
pub const USERNAME: &str = "SALESFORCE_USERNAME";
/// Salesforce password.
pub const PASSWORD: &str = "SALESFORCE_PASSWORD";
/// Security token appended to the password for API logins.
pub const SECURITY_TOKEN: &str = "SALESFORCE_SECURITY_TOKEN";
/// Login domain: `login`, `test`, `<name>.my` or a full URL.
pub const DOMAIN: &str = "SALESFORCE_DOMAIN";
/// Instance URL used by the session id and OAuth strategies.
pub const INSTANCE_URL: &str = "SALESFORCE_INSTANCE_URL";
/// Browser session id.
pub const SESSION_ID: &str = "SALESFORCE_SESSION_ID";
/// Connected app consumer key.
pub const CLIENT_ID: &str = "SALESFORCE_CLIENT_ID";
/// Connected app consumer secret.
pub const CLIENT_SECRET: &str = "SALESFORCE_CLIENT_SECRET";
/// OAuth redirect URI; also decides where the callback listener binds.
pub const REDIRECT_URI: &str = "SALESFORCE_REDIRECT_URI";
/// REST/SOAP API version.
pub const API_VERSION: &str = "SALESFORCE_API_VERSION";
/// Seconds to wait for the OAuth callback.
pub const OAUTH_TIMEOUT_SECS: &str = "SALESFORCE_OAUTH_TIMEOUT_SECS";

/// Every key the store picks up from the environment.
pub const KEYS: &[&str] = &[
    USERNAME,
    PASSWORD,
    SECURITY_TOKEN,
    DOMAIN,
    INSTANCE_URL,
    SESSION_ID,
    CLIENT_ID,
    CLIENT_SECRET,
    REDIRECT_URI,
    API_VERSION,
    OAUTH_TIMEOUT_SECS,
];

/// Default instance when `SALESFORCE_INSTANCE_URL` is not set.
pub const DEFAULT_INSTANCE_URL: &str = "https://uipath.my.salesforce.com";
/// Default login domain.
pub const DEFAULT_DOMAIN: &str = "login";
/// Default OAuth redirect URI.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
/// Default wait for the OAuth callback.
pub const DEFAULT_OAUTH_TIMEOUT: Duration = Duration::from_secs(300);

/// Immutable key/value view of the configuration.
///
/// Empty values are dropped on construction, so `get` never returns `Some("")`.
/// Secrets are redacted in Debug output.
#[derive(Clone, Default)]
pub struct CredentialStore {
    values: HashMap<String, String>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("CredentialStore")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Load `.env` from the working directory (if any) and snapshot the
    /// recognised `SALESFORCE_*` variables.
    ///
    /// Variables already set in the process environment take precedence over
    /// the file.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
        }

        Self::from_pairs(
            KEYS.iter()
                .filter_map(|key| std::env::var(key).ok().map(|value| (*key, value))),
        )
    }

    /// Build a store from explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { values }
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Look up a value, falling back to a default.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Returns the names in `names` that have no value.
    pub fn missing<'n>(&self, names: &[&'n str]) -> Vec<&'n str> {
        names
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }

    /// The instance URL, without a trailing slash.
    pub fn instance_url(&self) -> &str {
        self.get_or(INSTANCE_URL, DEFAULT_INSTANCE_URL)
            .trim_end_matches('/')
    }

    /// The API version.
    pub fn api_version(&self) -> &str {
        self.get_or(API_VERSION, sfcases_client::DEFAULT_API_VERSION)
    }

    /// The OAuth redirect URI.
    pub fn redirect_uri(&self) -> &str {
        self.get_or(REDIRECT_URI, DEFAULT_REDIRECT_URI)
    }

    /// How long the OAuth strategy waits for its callback.
    ///
    /// Zero or unparseable values fall back to the default.
    pub fn oauth_timeout(&self) -> Duration {
        self.get(OAUTH_TIMEOUT_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_OAUTH_TIMEOUT)
    }

    /// The base URL for SOAP logins, derived from `SALESFORCE_DOMAIN`.
    ///
    /// `login` -> `https://login.salesforce.com`, `test` ->
    /// `https://test.salesforce.com`, `acme.my` ->
    /// `https://acme.my.salesforce.com`. A value that already is an
    /// `http(s)://` URL is used as-is.
    pub fn login_url(&self) -> String {
        match self.get_or(DOMAIN, DEFAULT_DOMAIN) {
            "login" => crate::PRODUCTION_LOGIN_URL.to_string(),
            "test" => crate::SANDBOX_LOGIN_URL.to_string(),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                url.trim_end_matches('/').to_string()
            }
            domain => format!("https://{domain}.salesforce.com"),
        }
    }
}
