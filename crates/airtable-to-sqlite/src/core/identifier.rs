//! Identifier validation and quoting for SQLite.
//!
//! Table and column names come straight from Airtable display names, so they
//! routinely contain spaces, punctuation and quotes. Identifiers cannot be bound
//! as statement parameters, so every name that reaches SQL goes through
//! [`quote_ident`]:
//! 1. Reject names SQLite cannot represent (empty, embedded NUL)
//! 2. Wrap in double quotes, doubling any embedded double quote

use crate::error::{ExportError, Result};

/// Validate an identifier before it is embedded in SQL.
///
/// # Errors
///
/// Returns `ExportError::Identifier` for empty names or names containing a NUL byte.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ExportError::Identifier(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ExportError::Identifier(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    Ok(())
}

/// Quote a SQLite identifier.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(quote_ident("My Table")?, "\"My Table\"");
/// assert_eq!(quote_ident("say \"hi\"")?, "\"say \"\"hi\"\"\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a list of identifiers and join them with `", "`.
pub fn quote_list<S: AsRef<str>>(names: &[S]) -> Result<String> {
    let quoted = names
        .iter()
        .map(|n| quote_ident(n.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}
