//! # sfcases
//!
//! Fetch Salesforce cases of type `Integration Service` created in the last
//! N days, print them grouped by status and save them as JSON.
//!
//! ## Security
//!
//! - Sensitive data (tokens, passwords, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Crates
//!
//! - **sfcases-client** - HTTP plumbing, Salesforce error parsing, SOQL/XML escaping
//! - **sfcases-auth** - Credential store, the three login strategies and the selector
//! - **sfcases-rest** - Query client and injection-safe SOQL builder
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfcases::auth::{Authenticator, CredentialStore};
//! use sfcases::cases::{fetch_cases, CaseQuery};
//!
//! let store = CredentialStore::from_env();
//! let session = Authenticator::default().authenticate(&store).await.result?;
//! let result = fetch_cases(&session, &CaseQuery::new(7)?).await?;
//! sfcases::report::render_report(&mut std::io::stdout(), &result, 7)?;
//! ```

pub mod cases;
mod error;
pub mod report;

// Re-export all crates for convenient access
pub use sfcases_auth as auth;
pub use sfcases_client as client;
pub use sfcases_rest as rest;

pub use cases::{fetch_cases, CaseQuery, CaseRecord, ResultSet};
pub use error::{Error, ErrorKind, Result};
