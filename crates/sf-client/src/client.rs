//! The HTTP transport shared by login, token exchange and REST calls.

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};
use crate::response::RawResponse;

/// Transport settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request deadline.
    pub timeout: Duration,
    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,
    /// Sent as `User-Agent`.
    pub user_agent: String,
    /// Emit a debug event per request and an info event per non-2xx answer.
    pub log_requests: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            log_requests: true,
        }
    }
}

impl ClientConfig {
    /// Turn per-request log events on or off.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }
}

/// Sends each request exactly once and buffers the body.
///
/// Compressed bodies are decoded transparently. Only
/// [`get_json`](Self::get_json) interprets the status; the POST helpers
/// hand every answer back so callers can read SOAP faults and OAuth error
/// documents verbatim.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    log_requests: bool,
}

impl SfHttpClient {
    /// Build a transport from the given settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Setup(e.to_string()), e))?;

        Ok(Self {
            inner,
            log_requests: config.log_requests,
        })
    }

    /// POST a SOAP envelope with the given `SOAPAction`.
    pub async fn post_soap(&self, url: &str, action: &str, envelope: String) -> Result<RawResponse> {
        let request = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"))
            .header("SOAPAction", action)
            .body(envelope);
        self.send(request).await
    }

    /// POST `params` as `application/x-www-form-urlencoded`.
    pub async fn post_form<P: Serialize + ?Sized>(&self, url: &str, params: &P) -> Result<RawResponse> {
        let body = serde_urlencoded::to_string(params)?;
        let request = self
            .inner
            .post(url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body);
        self.send(request).await
    }

    /// GET `url` with a bearer token and optional query pairs, failing on
    /// any non-2xx answer and decoding the JSON body otherwise.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let mut target = url::Url::parse(url)?;
        if !query.is_empty() {
            target.query_pairs_mut().extend_pairs(query);
        }

        let request = self.inner.get(target).bearer_auth(bearer);
        self.send(request).await?.error_for_status()?.json()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let request = request.build()?;
        let method = request.method().clone();
        // Log without the query string; it may carry a full SOQL statement.
        let path = request.url().path().to_string();

        if self.log_requests {
            debug!(%method, %path, "sending request");
        }

        let response = self.inner.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if self.log_requests {
            if (200..300).contains(&status) {
                debug!(%method, %path, status, bytes = body.len(), "response received");
            } else {
                info!(%method, %path, status, "non-success response");
            }
        }

        Ok(RawResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> SfHttpClient {
        SfHttpClient::new(ClientConfig::default().with_request_logging(false)).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("sfcases/"));
        assert!(config.log_requests);
        assert!(!config.with_request_logging(false).log_requests);
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/query"))
            .and(query_param("q", "SELECT Id FROM Case WHERE Type = 'A&B'"))
            .and(header("Authorization", "Bearer 00Dxx!tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"n": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let value: serde_json::Value = client()
            .get_json(
                &format!("{}/services/data/v62.0/query", server.uri()),
                "00Dxx!tok",
                &[("q", "SELECT Id FROM Case WHERE Type = 'A&B'")],
            )
            .await
            .unwrap();
        assert_eq!(value["n"], 3);
    }

    #[tokio::test]
    async fn test_get_json_classifies_failures_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client()
            .get_json::<serde_json::Value>(&format!("{}/busy", server.uri()), "t", &[])
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RateLimited));

        let err = client()
            .get_json::<serde_json::Value>(&format!("{}/down", server.uri()), "t", &[])
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_posts_return_every_status_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/soap"))
            .and(header("SOAPAction", "login"))
            .and(body_string("<env/>"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<faultstring>no</faultstring>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string("grant_type=authorization_code&code=a%21b"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let soap = client()
            .post_soap(&format!("{}/soap", server.uri()), "login", "<env/>".into())
            .await
            .unwrap();
        assert_eq!(soap.status(), 500);
        assert_eq!(soap.into_body(), "<faultstring>no</faultstring>");

        let params = [("grant_type", "authorization_code"), ("code", "a!b")];
        let token = client()
            .post_form(&format!("{}/token", server.uri()), &params)
            .await
            .unwrap();
        assert_eq!(token.status(), 429);
        assert_eq!(token.into_body(), "slow down");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let err = client()
            .get_json::<serde_json::Value>("http://127.0.0.1:1/", "t", &[])
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
    }
}
