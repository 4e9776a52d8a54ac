//! Authenticated session handle.
//!
//! The access token is redacted in Debug output.

use std::fmt;

use sfcases_client::{ClientConfig, SalesforceClient};

use crate::error::Result;

/// Which strategy produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// SOAP login with username, password and security token.
    UsernamePassword,
    /// A session id copied from a logged-in browser.
    SessionId,
    /// OAuth 2.0 web server flow.
    OAuth,
}

impl AuthMethod {
    /// Human-readable name used in operator output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::UsernamePassword => "username/password",
            Self::SessionId => "Session ID",
            Self::OAuth => "OAuth",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An authenticated Salesforce session: instance URL plus access token.
///
/// Created by exactly one strategy and only read afterwards.
#[derive(Clone)]
pub struct Session {
    instance_url: String,
    access_token: String,
    api_version: String,
    method: AuthMethod,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("method", &self.method)
            .finish()
    }
}

impl Session {
    /// Create a session.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
        method: AuthMethod,
    ) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            method,
        }
    }

    /// The instance URL, without a trailing slash.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// The access token or session id.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The API version requests should use.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The strategy that produced this session.
    pub fn method(&self) -> AuthMethod {
        self.method
    }

    /// Build an API client bound to this session.
    pub fn client(&self) -> Result<SalesforceClient> {
        self.client_with_config(ClientConfig::default())
    }

    /// Build an API client bound to this session with custom HTTP settings.
    pub fn client_with_config(&self, config: ClientConfig) -> Result<SalesforceClient> {
        let client = SalesforceClient::with_config(&self.instance_url, &self.access_token, config)?
            .with_api_version(&self.api_version);
        Ok(client)
    }
}
