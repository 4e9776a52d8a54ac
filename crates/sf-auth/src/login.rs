//! Username/password login through the SOAP partner API.
//!
//! The password sent to Salesforce is the account password immediately
//! followed by the user's security token.

use sfcases_client::security::xml;
use sfcases_client::{ClientConfig, SfHttpClient};
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::session::{AuthMethod, Session};

/// Username, password and security token for a SOAP login.
///
/// Password and token are redacted in Debug output.
#[derive(Clone)]
pub struct LoginCredentials {
    username: String,
    password: String,
    security_token: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .finish()
    }
}

impl LoginCredentials {
    /// Create login credentials.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            security_token: security_token.into(),
        }
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// SOAP partner API login client.
#[derive(Debug, Clone)]
pub struct SoapLogin {
    http: SfHttpClient,
    login_url: String,
    api_version: String,
}

impl SoapLogin {
    /// Create a login client for the given login host (e.g. `https://login.salesforce.com`).
    pub fn new(login_url: impl Into<String>, api_version: impl Into<String>) -> Result<Self> {
        Self::with_config(login_url, api_version, ClientConfig::default())
    }

    /// Create a login client with custom HTTP settings.
    pub fn with_config(
        login_url: impl Into<String>,
        api_version: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            http: SfHttpClient::new(config)?,
            login_url: login_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    /// The partner API endpoint logins are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/services/Soap/u/{}", self.login_url, self.api_version)
    }

    /// Log in and build a session from the returned session id and server URL.
    ///
    /// A SOAP fault or any non-200 answer is an [`ErrorKind::AuthFailure`].
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Session> {
        let envelope = build_login_envelope(credentials);

        let response = self
            .http
            .post_soap(&self.endpoint(), "login", envelope)
            .await?;
        let status = response.status();
        let body = response.into_body();

        debug!(status, "SOAP login response received");

        if status != 200 {
            let reason = extract_element(&body, "faultstring")
                .map(|s| unescape(&s))
                .unwrap_or_else(|| format!("login failed with HTTP {status}"));
            return Err(Error::new(ErrorKind::AuthFailure(reason)));
        }

        let session_id = extract_element(&body, "sessionId").ok_or_else(|| {
            Error::new(ErrorKind::AuthFailure(
                "login response is missing sessionId".to_string(),
            ))
        })?;
        let server_url = extract_element(&body, "serverUrl").ok_or_else(|| {
            Error::new(ErrorKind::AuthFailure(
                "login response is missing serverUrl".to_string(),
            ))
        })?;

        let instance_url = instance_from_server_url(&unescape(&server_url))?;

        Ok(Session::new(
            instance_url,
            unescape(&session_id),
            &self.api_version,
            AuthMethod::UsernamePassword,
        ))
    }
}

fn build_login_envelope(credentials: &LoginCredentials) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:urn="urn:partner.soap.sforce.com">
  <env:Body>
    <urn:login>
      <urn:username>{}</urn:username>
      <urn:password>{}{}</urn:password>
    </urn:login>
  </env:Body>
</env:Envelope>"#,
        xml::escape(&credentials.username),
        xml::escape(&credentials.password),
        xml::escape(&credentials.security_token),
    )
}

/// Scheme, host and port of the `serverUrl` returned by login.
fn instance_from_server_url(server_url: &str) -> Result<String> {
    let url = url::Url::parse(server_url)?;
    if url.host_str().is_none() {
        return Err(Error::new(ErrorKind::AuthFailure(format!(
            "login returned an unusable serverUrl: {server_url}"
        ))));
    }
    Ok(url.origin().ascii_serialization())
}

/// Extract the text content of the first element named `tag`, with or
/// without a namespace prefix.
fn extract_element(xml: &str, tag: &str) -> Option<String> {
    let plain = format!("<{tag}>");
    let prefixed = format!(":{tag}>");

    let content_start = if let Some(idx) = xml.find(&plain) {
        idx + plain.len()
    } else {
        let idx = xml.find(&prefixed)?;
        // the match must be the tail of an opening tag like `<sf:tag>`
        let open = xml[..idx].rfind('<')?;
        if xml[open + 1..idx].contains(['/', ' ', '>']) {
            return None;
        }
        idx + prefixed.len()
    };

    let rest = &xml[content_start..];
    let end = rest.find("</")?;
    Some(rest[..end].to_string())
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
