//! OAuth 2.0 web server flow: the authorize URL and the code-for-token
//! exchange. A code is exchanged once; a refusal is final.

use serde::Deserialize;
use sfcases_client::{ClientConfig, SfHttpClient};
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::session::{AuthMethod, Session};

/// Scopes asked for on the authorize URL.
const SCOPES: &str = "api refresh_token";

/// Connected app credentials and its registered callback.
#[derive(Clone)]
pub struct OAuthConfig {
    consumer_key: String,
    consumer_secret: String,
    redirect_uri: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl OAuthConfig {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }
}

/// The web server flow against one instance's `/services/oauth2` endpoints.
#[derive(Clone)]
pub struct WebFlowAuth {
    config: OAuthConfig,
    instance_url: String,
    http: SfHttpClient,
}

impl std::fmt::Debug for WebFlowAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebFlowAuth")
            .field("config", &self.config)
            .field("instance_url", &self.instance_url)
            .finish_non_exhaustive()
    }
}

impl WebFlowAuth {
    pub fn new(config: OAuthConfig, instance_url: impl Into<String>) -> Result<Self> {
        Self::with_client_config(config, instance_url, ClientConfig::default())
    }

    /// Fails with [`ErrorKind::InvalidInput`] when the consumer key is empty.
    pub fn with_client_config(
        config: OAuthConfig,
        instance_url: impl Into<String>,
        client_config: ClientConfig,
    ) -> Result<Self> {
        if config.consumer_key.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "the web flow needs a consumer key".to_string(),
            )));
        }

        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }

        Ok(Self {
            config,
            instance_url,
            http: SfHttpClient::new(client_config)?,
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/services/oauth2/token", self.instance_url)
    }

    /// Where the user's browser is sent to grant access.
    pub fn authorization_url(&self) -> String {
        format!(
            "{}/services/oauth2/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}",
            self.instance_url,
            urlencoding::encode(self.config.consumer_key.as_str()),
            urlencoding::encode(self.config.redirect_uri.as_str()),
            urlencoding::encode(SCOPES),
        )
    }

    /// Trade an authorization code for an access token.
    ///
    /// Any answer other than 200, including 429, becomes
    /// [`ErrorKind::TokenExchange`] holding the status and the body exactly
    /// as the provider sent it.
    #[instrument(skip(self, code), fields(instance = %self.instance_url))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.consumer_key.as_str()),
            ("client_secret", self.config.consumer_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self.http.post_form(&self.token_url(), &form).await?;
        let status = response.status();
        if status != 200 {
            debug!(status, "token endpoint refused the code");
            return Err(Error::new(ErrorKind::TokenExchange {
                status,
                body: response.into_body(),
            }));
        }

        Ok(response.json()?)
    }
}

/// The parts of a token endpoint answer this tool reads.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
    /// Present when `refresh_token` scope was granted; never stored.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("instance_url", &self.instance_url)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

impl TokenResponse {
    /// Session for the granted token. The refresh token is dropped.
    pub fn into_session(self, api_version: &str) -> Session {
        Session::new(
            self.instance_url,
            self.access_token,
            api_version,
            AuthMethod::OAuth,
        )
    }
}
