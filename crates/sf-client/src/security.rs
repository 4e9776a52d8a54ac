//! Escaping for values spliced into SOQL statements and SOAP envelopes.

/// SOQL literals and identifiers.
///
/// ```rust
/// use sfcases_client::security::soql;
///
/// let clause = format!("Type = '{}'", soql::escape_string("Partner's Sync"));
/// assert_eq!(clause, r"Type = 'Partner\'s Sync'");
/// assert!(soql::is_safe_field_path("Owner.Name"));
/// ```
pub mod soql {
    /// Backslash-escape everything that could end or alter a quoted SOQL
    /// literal.
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            let replacement = match ch {
                '\\' => r"\\",
                '\'' => r"\'",
                '"' => r#"\""#,
                '\n' => r"\n",
                '\r' => r"\r",
                '\t' => r"\t",
                _ => {
                    out.push(ch);
                    continue;
                }
            };
            out.push_str(replacement);
        }
        out
    }

    /// An ASCII letter followed by letters, digits or underscores. Covers
    /// standard names as well as `__c` and `__r` suffixes.
    #[must_use]
    pub fn is_safe_identifier(name: &str) -> bool {
        let bytes = name.as_bytes();
        match bytes.split_first() {
            Some((first, rest)) => {
                first.is_ascii_alphabetic()
                    && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
            }
            None => false,
        }
    }

    /// A dotted relationship path such as `Account.Owner.Name`, where every
    /// segment is a safe identifier.
    #[must_use]
    pub fn is_safe_field_path(path: &str) -> bool {
        path.split('.').all(is_safe_identifier)
    }
}

/// XML character data.
pub mod xml {
    /// Replace the five characters XML reserves with their entities.
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '&' => out.push_str("&amp;"),
                '\'' => out.push_str("&apos;"),
                '"' => out.push_str("&quot;"),
                other => out.push(other),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{soql, xml};

    #[test]
    fn test_soql_literal_cannot_be_closed_early() {
        assert_eq!(soql::escape_string("Acme"), "Acme");
        assert_eq!(
            soql::escape_string("x' OR Name != '"),
            r"x\' OR Name != \'"
        );
        assert_eq!(soql::escape_string(r"C:\temp"), r"C:\\temp");
        assert_eq!(soql::escape_string("a\r\nb\tc"), r"a\r\nb\tc");
        assert_eq!(soql::escape_string(r#"say "hi""#), r#"say \"hi\""#);
    }

    #[test]
    fn test_identifiers() {
        for ok in ["Id", "CreatedDate", "Sync_Target__c", "Account__r", "A1"] {
            assert!(soql::is_safe_identifier(ok), "{ok}");
        }
        for bad in ["", "_Id", "9Lives", "Owner.Name", "Id,Name", "Id--", "Näme"] {
            assert!(!soql::is_safe_identifier(bad), "{bad}");
        }
    }

    #[test]
    fn test_field_paths() {
        assert!(soql::is_safe_field_path("Status"));
        assert!(soql::is_safe_field_path("Account.Owner.Name"));

        for bad in ["", ".", "Owner.", ".Name", "Owner..Name", "Owner.Name)"] {
            assert!(!soql::is_safe_field_path(bad), "{bad}");
        }
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml::escape("plain"), "plain");
        assert_eq!(
            xml::escape(r#"p<w>&'q""#),
            "p&lt;w&gt;&amp;&apos;q&quot;"
        );
    }
}
