use std::fmt;

use thiserror::Error;

use crate::client::ClientError;
use crate::schema::ColumnError;
use crate::types::DescriptorError;

/// Write path a verification cycle exercised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePath {
    /// Single-row insert with inline literals.
    InlineInsert,
    /// The inserted row read back through a bound-parameter filter.
    ParameterizedInsert,
    /// The inserted row read back through a forced-literal filter.
    LiteralInsert,
    /// Bulk copy issuing one insert per row.
    BulkRowByRow,
    /// Bulk copy issuing one multi-row insert.
    BulkBatch,
}

impl fmt::Display for WritePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InlineInsert => "inline insert",
            Self::ParameterizedInsert => "parameterized read",
            Self::LiteralInsert => "literal read",
            Self::BulkRowByRow => "bulk row-by-row",
            Self::BulkBatch => "bulk batch",
        };
        f.write_str(name)
    }
}

/// Errors that fail a conformance case.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid type descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("cannot encode test row: {0}")]
    Encode(#[source] ColumnError),

    #[error("table setup failed: {0}")]
    Setup(#[source] ClientError),

    #[error("{path}: expected {expected} row(s), found {actual}")]
    RowCount {
        path: WritePath,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: column {column} expected {expected}, found {actual}")]
    ValueMismatch {
        path: WritePath,
        column: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{path}: column {column} value {actual} failed its predicate")]
    PredicateFailed {
        path: WritePath,
        column: &'static str,
        actual: String,
    },

    #[error("{path}: expected {expected} bound parameter(s), command had {actual}")]
    ParameterCount {
        path: WritePath,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: interceptor observed {observed} command(s), expected exactly one")]
    CommandsObserved { path: WritePath, observed: usize },

    #[error("{path}: cannot decode stored row: {source}")]
    Decode {
        path: WritePath,
        #[source]
        source: ColumnError,
    },

    #[error("{path}: {source}")]
    Client {
        path: WritePath,
        #[source]
        source: ClientError,
    },
}

impl HarnessError {
    /// The write path the failure was detected on, if any.
    pub fn path(&self) -> Option<WritePath> {
        match self {
            Self::RowCount { path, .. }
            | Self::ValueMismatch { path, .. }
            | Self::PredicateFailed { path, .. }
            | Self::ParameterCount { path, .. }
            | Self::CommandsObserved { path, .. }
            | Self::Decode { path, .. }
            | Self::Client { path, .. } => Some(*path),
            Self::Descriptor(_) | Self::Encode(_) | Self::Setup(_) => None,
        }
    }
}
