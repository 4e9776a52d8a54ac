//! Assembles SELECT statements from validated identifiers and escaped
//! literals, so caller input never reaches SOQL unquoted.
//!
//! ```rust,ignore
//! use sfcases_rest::QueryBuilder;
//!
//! let page = QueryBuilder::<serde_json::Value>::new("Case")?
//!     .select(&["Id", "CaseNumber", "Owner.Name"])?
//!     .where_eq("Type", "Integration Service")?
//!     .where_last_n_days("CreatedDate", 7)?
//!     .order_by("CreatedDate", false)?
//!     .execute(&client)
//!     .await?;
//! ```

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use sfcases_client::security::soql;

use crate::{Error, ErrorKind, QueryResult, Result, SalesforceRestClient};

/// A SELECT over one object, decoding records into `T`.
///
/// Conditions are joined with `AND`; sort terms apply in the order added.
#[derive(Debug)]
pub struct QueryBuilder<T> {
    object: String,
    columns: Vec<String>,
    filters: Vec<String>,
    sort: Vec<String>,
    record: PhantomData<fn() -> T>,
}

fn checked_path(path: &str) -> Result<&str> {
    if soql::is_safe_field_path(path) {
        Ok(path)
    } else {
        Err(Error::new(ErrorKind::InvalidQuery(format!(
            "unsafe field reference {path:?}"
        ))))
    }
}

impl<T: DeserializeOwned> QueryBuilder<T> {
    pub fn new(object: impl AsRef<str>) -> Result<Self> {
        let object = object.as_ref();
        if !soql::is_safe_identifier(object) {
            return Err(Error::new(ErrorKind::InvalidQuery(format!(
                "unsafe object name {object:?}"
            ))));
        }

        Ok(Self {
            object: object.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            sort: Vec::new(),
            record: PhantomData,
        })
    }

    /// Append columns. Relationship paths like `Owner.Name` are allowed;
    /// one bad name rejects the whole call.
    pub fn select(mut self, columns: &[impl AsRef<str>]) -> Result<Self> {
        let checked = columns
            .iter()
            .map(|c| checked_path(c.as_ref()).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        self.columns.extend(checked);
        Ok(self)
    }

    /// `field = '<escaped value>'`.
    pub fn where_eq(mut self, field: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let field = checked_path(field.as_ref())?;
        self.filters
            .push(format!("{field} = '{}'", soql::escape_string(value.as_ref())));
        Ok(self)
    }

    /// `field = LAST_N_DAYS:days`. Zero days means today only.
    pub fn where_last_n_days(mut self, field: impl AsRef<str>, days: u32) -> Result<Self> {
        let field = checked_path(field.as_ref())?;
        self.filters.push(format!("{field} = LAST_N_DAYS:{days}"));
        Ok(self)
    }

    pub fn order_by(mut self, field: impl AsRef<str>, ascending: bool) -> Result<Self> {
        let field = checked_path(field.as_ref())?;
        let direction = if ascending { "ASC" } else { "DESC" };
        self.sort.push(format!("{field} {direction}"));
        Ok(self)
    }

    /// Render the statement. At least one column is required.
    pub fn build(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::new(ErrorKind::InvalidQuery(
                "no columns selected".to_string(),
            )));
        }

        let mut statement = format!("SELECT {} FROM {}", self.columns.join(", "), self.object);
        if !self.filters.is_empty() {
            statement += " WHERE ";
            statement += &self.filters.join(" AND ");
        }
        if !self.sort.is_empty() {
            statement += " ORDER BY ";
            statement += &self.sort.join(", ");
        }
        Ok(statement)
    }

    /// Render and run the statement, returning the first batch.
    pub async fn execute(self, client: &SalesforceRestClient) -> Result<QueryResult<T>> {
        client.query(&self.build()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Builder = QueryBuilder<serde_json::Value>;

    fn rejected(result: Result<Builder>) -> String {
        match result.unwrap_err().kind {
            ErrorKind::InvalidQuery(reason) => reason,
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_full_statement() {
        let statement = Builder::new("Case")
            .unwrap()
            .select(&["Id", "Account.Name"])
            .unwrap()
            .select(&["Owner.Name"])
            .unwrap()
            .where_eq("Type", "Integration Service")
            .unwrap()
            .where_last_n_days("CreatedDate", 0)
            .unwrap()
            .order_by("Priority", true)
            .unwrap()
            .order_by("CreatedDate", false)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            statement,
            "SELECT Id, Account.Name, Owner.Name FROM Case \
             WHERE Type = 'Integration Service' AND CreatedDate = LAST_N_DAYS:0 \
             ORDER BY Priority ASC, CreatedDate DESC"
        );
    }

    #[test]
    fn test_minimal_statement() {
        let statement = Builder::new("Case")
            .unwrap()
            .select(&["Id"])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(statement, "SELECT Id FROM Case");
    }

    #[test]
    fn test_values_are_escaped() {
        let statement = Builder::new("Case")
            .unwrap()
            .select(&["Id"])
            .unwrap()
            .where_eq("Subject", "it's down' OR Id != '")
            .unwrap()
            .build()
            .unwrap();
        assert!(statement.ends_with(r"WHERE Subject = 'it\'s down\' OR Id != \''"));
    }

    #[test]
    fn test_unsafe_identifiers_are_rejected() {
        assert!(rejected(Builder::new("Case; DELETE")).contains("object"));

        let builder = || Builder::new("Case").unwrap();
        assert!(rejected(builder().select(&["Id", "Name FROM User--"])).contains("field"));
        assert!(builder().where_eq("Type)", "x").is_err());
        assert!(builder().where_last_n_days("Created Date", 7).is_err());
        assert!(builder().order_by("Owner.", true).is_err());
    }

    #[test]
    fn test_build_requires_columns() {
        let err = Builder::new("Case").unwrap().build().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidQuery(_)));
    }
}
