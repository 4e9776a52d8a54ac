//! # sf-client
//!
//! HTTP plumbing shared by the auth and REST crates.
//!
//! [`SfHttpClient`] sends a request once, decodes gzip/deflate bodies and
//! buffers the response. Its POST helpers return every status untouched;
//! [`SfHttpClient::get_json`] classifies non-2xx answers into
//! [`ErrorKind`], reading Salesforce's `[{errorCode, message}]` documents
//! and masking tokens in what it keeps.
//!
//! [`SalesforceClient`] binds that transport to one session's instance URL
//! and bearer token.
//!
//! ```rust,ignore
//! use sfcases_client::{QueryResult, SalesforceClient};
//!
//! let client = SalesforceClient::new("https://acme.my.salesforce.com", token)?;
//! let page: QueryResult<serde_json::Value> =
//!     client.query("SELECT Id FROM Case LIMIT 1").await?;
//! ```

mod client;
mod error;
mod response;
mod salesforce_client;
pub mod security;

pub use client::{ClientConfig, SfHttpClient};
pub use error::{Error, ErrorKind, Result};
pub use response::RawResponse;
pub use salesforce_client::{QueryResult, SalesforceClient};

/// REST and SOAP API version used unless configured otherwise.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("sfcases/", env!("CARGO_PKG_VERSION"));
