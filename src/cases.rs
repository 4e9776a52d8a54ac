//! Integration Service case query.
//!
//! One fixed-shape SOQL statement: cases of type `Integration Service`
//! created in the last N days, newest first. Records are kept close to the
//! wire shape so the persisted file carries every field Salesforce returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sfcases_auth::Session;
use sfcases_rest::{QueryBuilder, SalesforceRestClient};
use tracing::{debug, info, instrument};

use crate::error::{Error, ErrorKind, Result};

/// Case type the query filters on.
pub const CASE_TYPE: &str = "Integration Service";

/// Look-back window used when none is given.
pub const DEFAULT_DAYS: u32 = 7;

/// Fields selected, in order.
pub const CASE_FIELDS: &[&str] = &[
    "Id",
    "CaseNumber",
    "Subject",
    "Status",
    "Priority",
    "CreatedDate",
    "LastModifiedDate",
    "Description",
    "Type",
    "Account.Name",
    "Owner.Name",
];

/// One Case row as returned by the query endpoint.
///
/// Timestamps stay as the text Salesforce sent. Anything not modelled here
/// (the `attributes` block, fields added to the query later) is kept in
/// `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CaseRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "CaseNumber")]
    pub case_number: String,
    #[serde(rename = "Subject", default)]
    pub subject: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Priority", default)]
    pub priority: Option<String>,
    #[serde(rename = "CreatedDate")]
    pub created_date: String,
    #[serde(rename = "LastModifiedDate", default)]
    pub last_modified_date: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Type", default)]
    pub case_type: Option<String>,
    #[serde(rename = "Account", default)]
    pub account: Option<RelatedName>,
    #[serde(rename = "Owner", default)]
    pub owner: Option<RelatedName>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CaseRecord {
    /// Account name, if the case has an account.
    pub fn account_name(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.name.as_deref())
    }

    /// Owner name, if known.
    pub fn owner_name(&self) -> Option<&str> {
        self.owner.as_ref().and_then(|o| o.name.as_deref())
    }
}

/// A parent record reached through a relationship field (`Account.Name`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RelatedName {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Records returned by one query, with the server's total count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub total_size: u64,
    pub records: Vec<CaseRecord>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validated look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseQuery {
    days: u32,
}

impl Default for CaseQuery {
    fn default() -> Self {
        Self { days: DEFAULT_DAYS }
    }
}

impl CaseQuery {
    /// Accepts `0..=u32::MAX`. `0` means "today".
    pub fn new(days: i64) -> Result<Self> {
        let days = u32::try_from(days).map_err(|_| {
            Error::new(ErrorKind::InvalidInput(format!(
                "days must be a non-negative whole number, got {days}"
            )))
        })?;
        Ok(Self { days })
    }

    /// Parse a command-line argument such as `"14"`.
    pub fn parse(text: &str) -> Result<Self> {
        let days = text.trim().parse::<i64>().map_err(|_| {
            Error::new(ErrorKind::InvalidInput(format!(
                "days must be a non-negative whole number, got {text:?}"
            )))
        })?;
        Self::new(days)
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// The query as a builder over [`CaseRecord`].
    pub fn builder(&self) -> Result<QueryBuilder<CaseRecord>> {
        Ok(QueryBuilder::new("Case")?
            .select(CASE_FIELDS)?
            .where_eq("Type", CASE_TYPE)?
            .where_last_n_days("CreatedDate", self.days)?
            .order_by("CreatedDate", false)?)
    }

    /// The SOQL text sent to the server.
    pub fn soql(&self) -> Result<String> {
        Ok(self.builder()?.build()?)
    }
}

/// Run the case query with an authenticated session.
///
/// Only the first page is read. Any failure is returned as
/// [`ErrorKind::Query`] (or [`ErrorKind::Auth`] if the session cannot be
/// turned into a client).
#[instrument(skip(session), fields(instance = %session.instance_url()))]
pub async fn fetch_cases(session: &Session, query: &CaseQuery) -> Result<ResultSet> {
    let client = SalesforceRestClient::new(session.client()?);
    let builder = query.builder()?;
    debug!(soql = %builder.build()?, "Running case query");

    let result = builder.execute(&client).await?;
    if !result.done {
        debug!(
            next = result.next_records_url.as_deref().unwrap_or_default(),
            "Only the first page of cases is read"
        );
    }

    info!(
        total = result.total_size,
        returned = result.records.len(),
        "Case query complete"
    );
    Ok(ResultSet {
        total_size: result.total_size,
        records: result.records,
    })
}
