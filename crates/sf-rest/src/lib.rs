//! # sf-rest
//!
//! SOQL over the REST API: [`QueryBuilder`] renders a statement from
//! checked identifiers and escaped literals, and [`SalesforceRestClient`]
//! runs it for a session and returns the first batch.
//!
//! ```rust,ignore
//! use sfcases_rest::{QueryBuilder, SalesforceRestClient};
//!
//! let client = SalesforceRestClient::new(session.client()?);
//! let page = QueryBuilder::<serde_json::Value>::new("Case")?
//!     .select(&["Id", "CaseNumber"])?
//!     .where_last_n_days("CreatedDate", 7)?
//!     .execute(&client)
//!     .await?;
//! ```

mod client;
mod error;
mod query_builder;

pub use client::SalesforceRestClient;
pub use error::{Error, ErrorKind, Result};
pub use query_builder::QueryBuilder;
pub use sfcases_client::QueryResult;
