//! REST calls made with an authenticated session.

use serde::de::DeserializeOwned;
use sfcases_client::SalesforceClient;
use tracing::instrument;

use crate::error::Result;
use crate::QueryResult;

/// Query access for one session. Build the statement with
/// [`QueryBuilder`](crate::QueryBuilder) rather than formatting input
/// into SOQL by hand.
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    session: SalesforceClient,
}

impl SalesforceRestClient {
    pub fn new(session: SalesforceClient) -> Self {
        Self { session }
    }

    /// Run `soql` and return the first batch; later batches are not read.
    #[instrument(skip(self, soql), fields(instance = %self.session.instance_url()))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        Ok(self.session.query(soql).await?)
    }
}
