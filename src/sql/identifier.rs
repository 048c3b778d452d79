//! Identifier validation and quoting.

use std::collections::HashSet;
use std::sync::LazyLock;

use thiserror::Error;

/// Maximum length for a table or column identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// YQL keywords that cannot be used as bare identifiers.
static RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "select", "from", "where", "insert", "upsert", "replace", "update", "delete", "create",
        "drop", "alter", "table", "index", "view", "and", "or", "not", "null", "true", "false",
        "in", "is", "like", "between", "join", "on", "as", "order", "by", "group", "having",
        "limit", "offset", "union", "all", "distinct", "case", "when", "then", "else", "end",
        "exists", "declare", "pragma", "values",
    ]
    .into_iter()
    .collect()
});

/// Error type for identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,

    #[error("identifier exceeds maximum length of {max} (got {0})", max = MAX_IDENTIFIER_LENGTH)]
    TooLong(usize),

    #[error("identifier must start with a letter or underscore, got '{0}'")]
    InvalidFirstChar(char),

    #[error("identifier contains invalid character '{0}'")]
    InvalidChar(char),

    #[error("'{0}' is a reserved word and cannot be used as an identifier")]
    ReservedWord(String),
}

/// Validate a bare identifier.
///
/// A valid identifier must:
/// - Not be empty
/// - Not exceed 128 characters
/// - Start with a letter or underscore
/// - Contain only alphanumeric characters and underscores
/// - Not be a reserved word
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    validate_word(name)?;

    let lower = name.to_lowercase();
    if RESERVED_WORDS.contains(lower.as_str()) {
        return Err(IdentifierError::ReservedWord(name.to_string()));
    }

    Ok(())
}

/// Validate a bare word such as a hint name. Same rules as
/// [`validate_identifier`] except that reserved words are allowed.
pub fn validate_word(name: &str) -> Result<(), IdentifierError> {
    if name.is_empty() {
        return Err(IdentifierError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong(name.len()));
    }

    let mut chars = name.chars();

    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(IdentifierError::InvalidFirstChar(first));
        }
    }

    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(IdentifierError::InvalidChar(c));
        }
    }

    Ok(())
}

/// Quote an identifier with backticks, escaping embedded backticks and
/// backslashes.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        if c == '`' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}
