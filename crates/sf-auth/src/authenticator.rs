//! Authentication strategies and the selector that tries them in order.
//!
//! The order is fixed: username/password login, then an existing session
//! id, then the OAuth web flow. A strategy whose configuration is absent is
//! skipped and its setup guidance is printed; a strategy that fails hands
//! over to the next one. The first session obtained ends the search.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sfcases_client::ClientConfig;
use tracing::{debug, info, instrument, warn};

use crate::callback::CallbackListener;
use crate::error::{Error, ErrorKind, Result};
use crate::login::{LoginCredentials, SoapLogin};
use crate::oauth::{OAuthConfig, WebFlowAuth};
use crate::session::{AuthMethod, Session};
use crate::store::{self, CredentialStore};

/// Opens a URL for the user. Returns an error if no browser could be started.
pub type BrowserLauncher = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Launcher backed by the platform's default browser.
pub fn system_browser() -> BrowserLauncher {
    Arc::new(|url: &str| open::that(url))
}

/// Printed when every strategy has been skipped or has failed.
pub const FALLBACK_GUIDANCE: &str = "\
For SSO, try one of these methods:
1. Username/Password + Security Token (recommended for automation)
2. Session ID (extract from browser after SSO login)
3. OAuth (requires Connected App setup by IT)";

const RULE: &str = "================================================================================";

/// One way of obtaining a [`Session`].
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Which method this strategy implements.
    fn method(&self) -> AuthMethod;

    /// Heading used in operator output, e.g. "Username/Password".
    fn display_name(&self) -> &'static str;

    /// Configuration keys that must be present for an attempt.
    fn required_keys(&self) -> &'static [&'static str];

    /// Setup instructions shown when the strategy is skipped.
    fn guidance(&self, store: &CredentialStore) -> String;

    /// Configuration keys that are absent.
    fn missing_keys(&self, store: &CredentialStore) -> Vec<&'static str> {
        store.missing(self.required_keys())
    }

    /// Try to authenticate.
    async fn attempt(&self, store: &CredentialStore) -> Result<Session>;
}

fn require<'a>(store: &'a CredentialStore, key: &str) -> Result<&'a str> {
    store
        .get(key)
        .ok_or_else(|| Error::new(ErrorKind::MissingConfig(key.to_string())))
}

/// Strategy 1: SOAP login with username, password and security token.
#[derive(Debug, Clone, Default)]
pub struct UsernamePasswordStrategy {
    client_config: ClientConfig,
}

impl UsernamePasswordStrategy {
    /// Create the strategy with custom HTTP settings.
    pub fn new(client_config: ClientConfig) -> Self {
        Self { client_config }
    }
}

#[async_trait]
impl AuthStrategy for UsernamePasswordStrategy {
    fn method(&self) -> AuthMethod {
        AuthMethod::UsernamePassword
    }

    fn display_name(&self) -> &'static str {
        "Username/Password"
    }

    fn required_keys(&self) -> &'static [&'static str] {
        &[store::USERNAME, store::PASSWORD, store::SECURITY_TOKEN]
    }

    fn guidance(&self, _store: &CredentialStore) -> String {
        format!(
            "\n{RULE}\nUSERNAME/PASSWORD AUTHENTICATION\n{RULE}\n\
             \nFor SSO with security token, you need:\n\
             1. Your Salesforce username (email)\n\
             2. Your Salesforce password\n\
             3. Your security token (reset in Salesforce: My Settings > Reset Security Token)\n\
             4. Add to .env file:\n   \
             SALESFORCE_USERNAME=your-email@company.com\n   \
             SALESFORCE_PASSWORD=your-password\n   \
             SALESFORCE_SECURITY_TOKEN=your-security-token\n\
             {RULE}\n"
        )
    }

    #[instrument(skip(self, store))]
    async fn attempt(&self, store: &CredentialStore) -> Result<Session> {
        let credentials = LoginCredentials::new(
            require(store, store::USERNAME)?,
            require(store, store::PASSWORD)?,
            require(store, store::SECURITY_TOKEN)?,
        );

        let login = SoapLogin::with_config(
            store.login_url(),
            store.api_version(),
            self.client_config.clone(),
        )?;
        login.login(&credentials).await
    }
}

/// Strategy 2: a session id copied from a browser, checked with one REST call.
#[derive(Debug, Clone, Default)]
pub struct SessionIdStrategy {
    client_config: ClientConfig,
}

impl SessionIdStrategy {
    /// Create the strategy with custom HTTP settings.
    pub fn new(client_config: ClientConfig) -> Self {
        Self { client_config }
    }
}

#[async_trait]
impl AuthStrategy for SessionIdStrategy {
    fn method(&self) -> AuthMethod {
        AuthMethod::SessionId
    }

    fn display_name(&self) -> &'static str {
        "Session ID"
    }

    fn required_keys(&self) -> &'static [&'static str] {
        &[store::SESSION_ID]
    }

    fn guidance(&self, store: &CredentialStore) -> String {
        format!(
            "\n{RULE}\nSESSION ID AUTHENTICATION\n{RULE}\n\
             \nTo get your Session ID:\n\
             1. Open your browser and go to: {}\n\
             2. Log in via SSO\n\
             3. Open Developer Tools (F12)\n\
             4. Go to Console tab and run:\n   \
             document.cookie.split(';').find(c => c.includes('sid')).split('=')[1]\n\
             5. Copy the session ID and set it in .env file:\n   \
             SALESFORCE_SESSION_ID=your-session-id\n\
             {RULE}\n",
            store.instance_url()
        )
    }

    #[instrument(skip(self, store))]
    async fn attempt(&self, store: &CredentialStore) -> Result<Session> {
        let session = Session::new(
            store.instance_url(),
            require(store, store::SESSION_ID)?,
            store.api_version(),
            AuthMethod::SessionId,
        );

        // Any failure reading the REST root means the session id is unusable.
        let client = session.client_with_config(self.client_config.clone())?;
        client
            .rest_get::<serde_json::Value>("")
            .await
            .map_err(|e| {
                Error::with_source(
                    ErrorKind::AuthFailure(format!("session id was not accepted: {e}")),
                    e,
                )
            })?;

        Ok(session)
    }
}

/// Strategy 3: OAuth web server flow through the user's browser.
#[derive(Clone)]
pub struct OAuthStrategy {
    client_config: ClientConfig,
    launcher: BrowserLauncher,
}

impl std::fmt::Debug for OAuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthStrategy")
            .field("client_config", &self.client_config)
            .finish_non_exhaustive()
    }
}

impl Default for OAuthStrategy {
    fn default() -> Self {
        Self::new(ClientConfig::default(), system_browser())
    }
}

impl OAuthStrategy {
    /// Create the strategy with custom HTTP settings and browser launcher.
    pub fn new(client_config: ClientConfig, launcher: BrowserLauncher) -> Self {
        Self {
            client_config,
            launcher,
        }
    }
}

#[async_trait]
impl AuthStrategy for OAuthStrategy {
    fn method(&self) -> AuthMethod {
        AuthMethod::OAuth
    }

    fn display_name(&self) -> &'static str {
        "OAuth"
    }

    fn required_keys(&self) -> &'static [&'static str] {
        &[store::CLIENT_ID, store::CLIENT_SECRET]
    }

    fn guidance(&self, store: &CredentialStore) -> String {
        format!(
            "\n{RULE}\nOAUTH AUTHENTICATION\n{RULE}\n\
             \nOAuth requires a Connected App in Salesforce:\n\
             1. In Salesforce Setup, search for 'App Manager'\n\
             2. Create a New Connected App\n\
             3. Enable OAuth Settings\n\
             4. Set Callback URL to: {}\n\
             5. Add OAuth Scopes: api, refresh_token\n\
             6. Copy Consumer Key and Consumer Secret to .env:\n   \
             SALESFORCE_CLIENT_ID=your-consumer-key\n   \
             SALESFORCE_CLIENT_SECRET=your-consumer-secret\n\
             {RULE}\n",
            store.redirect_uri()
        )
    }

    #[instrument(skip(self, store))]
    async fn attempt(&self, store: &CredentialStore) -> Result<Session> {
        let config = OAuthConfig::new(
            require(store, store::CLIENT_ID)?,
            require(store, store::CLIENT_SECRET)?,
            store.redirect_uri(),
        );
        let flow =
            WebFlowAuth::with_client_config(config, store.instance_url(), self.client_config.clone())?;
        let auth_url = flow.authorization_url();

        // Listen before the browser can possibly redirect.
        let listener = CallbackListener::for_redirect_uri(store.redirect_uri()).await?;
        debug!(addrs = ?listener.local_addrs().ok(), "OAuth callback listener bound");
        let pending = listener.spawn();

        println!("\nOpening browser for authentication...");
        println!("If browser doesn't open, go to: {auth_url}\n");
        if let Err(e) = (self.launcher)(&auth_url) {
            warn!(error = %e, "Could not open a browser");
        }

        println!("Waiting for authentication callback...");
        let code = pending.wait(store.oauth_timeout()).await?;

        let token = flow.exchange_code(&code).await?;
        Ok(token.into_session(store.api_version()))
    }
}

/// What happened to one strategy during [`Authenticator::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Required configuration was absent; nothing was attempted.
    Skipped { missing: Vec<&'static str> },
    /// The attempt was made and failed.
    Failed(String),
    /// The attempt produced the session.
    Succeeded,
}

/// Record of a single strategy considered by the authenticator.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    /// The strategy's method.
    pub method: AuthMethod,
    /// Outcome of the strategy.
    pub status: AttemptStatus,
    /// How long the attempt took.
    pub duration: Duration,
}

/// The outcome of an authentication run.
#[derive(Debug)]
pub struct AuthOutcome {
    /// The session, or [`ErrorKind::AllStrategiesFailed`].
    pub result: Result<Session>,
    /// Every strategy considered, in order.
    pub attempts: Vec<AuthAttempt>,
}

impl AuthOutcome {
    /// Returns true if a session was obtained.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Status of the given method, or `None` if it was never reached.
    pub fn status_of(&self, method: AuthMethod) -> Option<&AttemptStatus> {
        self.attempts
            .iter()
            .find(|a| a.method == method)
            .map(|a| &a.status)
    }

    /// Failure reasons of the strategies that were attempted.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.status {
                AttemptStatus::Failed(reason) => Some(reason.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Tries strategies in order until one yields a session.
pub struct Authenticator {
    strategies: Vec<Box<dyn AuthStrategy>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.display_name()).collect();
        f.debug_struct("Authenticator")
            .field("strategies", &names)
            .finish()
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::standard(ClientConfig::default(), system_browser())
    }
}

impl Authenticator {
    /// An authenticator over an explicit strategy list, tried as given.
    pub fn new(strategies: Vec<Box<dyn AuthStrategy>>) -> Self {
        Self { strategies }
    }

    /// Username/password, then session id, then OAuth.
    pub fn standard(client_config: ClientConfig, launcher: BrowserLauncher) -> Self {
        Self::new(vec![
            Box::new(UsernamePasswordStrategy::new(client_config.clone())),
            Box::new(SessionIdStrategy::new(client_config.clone())),
            Box::new(OAuthStrategy::new(client_config, launcher)),
        ])
    }

    /// The strategies, in the order they are tried.
    pub fn methods(&self) -> Vec<AuthMethod> {
        self.strategies.iter().map(|s| s.method()).collect()
    }

    /// Run the strategies in order and stop at the first session.
    ///
    /// Progress and setup guidance go to stdout.
    #[instrument(skip(self, store), fields(strategies = self.strategies.len()))]
    pub async fn authenticate(&self, store: &CredentialStore) -> AuthOutcome {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (index, strategy) in self.strategies.iter().enumerate() {
            let method = strategy.method();
            let lead = if index == 0 { "" } else { "\n" };
            println!("{lead}Attempting {} authentication...", strategy.display_name());

            let missing = strategy.missing_keys(store);
            if !missing.is_empty() {
                debug!(%method, ?missing, "Strategy not configured, skipping");
                println!("{}", strategy.guidance(store));
                attempts.push(AuthAttempt {
                    method,
                    status: AttemptStatus::Skipped { missing },
                    duration: Duration::ZERO,
                });
                continue;
            }

            let start = Instant::now();
            match strategy.attempt(store).await {
                Ok(session) => {
                    let duration = start.elapsed();
                    info!(%method, ?duration, "Strategy succeeded");
                    println!("✓ Authenticated successfully using {method}");
                    attempts.push(AuthAttempt {
                        method,
                        status: AttemptStatus::Succeeded,
                        duration,
                    });
                    return AuthOutcome {
                        result: Ok(session),
                        attempts,
                    };
                }
                Err(e) if e.is_missing_config() => {
                    println!("{}", strategy.guidance(store));
                    attempts.push(AuthAttempt {
                        method,
                        status: AttemptStatus::Skipped {
                            missing: Vec::new(),
                        },
                        duration: start.elapsed(),
                    });
                }
                Err(e) => {
                    let duration = start.elapsed();
                    info!(%method, error = %e, ?duration, "Strategy failed");
                    println!("✗ Authentication failed: {e}");
                    attempts.push(AuthAttempt {
                        method,
                        status: AttemptStatus::Failed(e.to_string()),
                        duration,
                    });
                }
            }
        }

        warn!("All authentication strategies failed");
        AuthOutcome {
            result: Err(Error::new(ErrorKind::AllStrategiesFailed)),
            attempts,
        }
    }
}
