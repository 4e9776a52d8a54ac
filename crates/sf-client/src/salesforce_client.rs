//! A transport bound to one authenticated session.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::client::{ClientConfig, SfHttpClient};
use crate::error::Result;
use crate::DEFAULT_API_VERSION;

/// Instance URL and bearer token of a session, plus the REST version to
/// address. The token never appears in Debug output or spans.
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Bind a session using default transport settings.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Bind a session using the given transport settings.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }

        Ok(Self {
            http: SfHttpClient::new(config)?,
            instance_url,
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Address a different REST version, e.g. `"59.0"`.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `<instance>/services/data/v<version>/<path>`.
    pub fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// GET a resource under the versioned REST root.
    ///
    /// `rest_get("")` reads the version root itself, which any valid
    /// session may do.
    #[instrument(skip(self), fields(instance = %self.instance_url))]
    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.http
            .get_json(&self.rest_url(path), &self.access_token, &[])
            .await
    }

    /// Run one SOQL statement and return the first batch of records.
    #[instrument(skip(self, soql), fields(instance = %self.instance_url))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        self.http
            .get_json(&self.rest_url("query"), &self.access_token, &[("q", soql)])
            .await
    }
}

/// One batch of a SOQL result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    /// Matching rows across all batches.
    pub total_size: u64,
    /// False when more batches remain.
    pub done: bool,
    /// Locator of the next batch; never followed here.
    #[serde(default)]
    pub next_records_url: Option<String>,
    pub records: Vec<T>,
}
