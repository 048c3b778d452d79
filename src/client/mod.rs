//! Client contracts the harness drives.
//!
//! A [`Connection`] owns table lifecycle, writes and filtered reads against
//! one store, generating YQL [`Command`]s either with inline literals or with
//! bound parameters. Opening a connection is the only asynchronous step and
//! goes through a [`ConnectionFactory`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConnectionConfig;
use crate::hints::HintDirective;
use crate::schema::TableMapping;
use crate::sql::{Command, Condition, LiteralError, SqlError};
use crate::types::StorageType;
use crate::value::{RangeError, Value};

pub use memory::MemoryConnectionFactory;

/// One row, in the column order of its table mapping.
pub type Row = Vec<Value>;

/// Errors reported by a connection or the store behind it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command generation failed: {0}")]
    Sql(#[from] SqlError),

    #[error("store could not parse literal: {0}")]
    Literal(#[from] LiteralError),

    #[error("no mapping registered for table '{0}'")]
    MappingNotRegistered(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("parameter {name} is NULL and has no declared type")]
    UntypedNullParameter { name: String },

    #[error("parameter {0} is not bound")]
    UnknownParameter(String),

    #[error("column '{column}' of type {expected} cannot hold {found}")]
    TypeMismatch {
        column: String,
        expected: StorageType,
        found: String,
    },

    #[error("column '{column}': {source}")]
    OutOfRange {
        column: String,
        #[source]
        source: RangeError,
    },

    #[error("column '{column}' is not nullable")]
    NullViolation { column: String },

    #[error("duplicate primary key in table '{table}'")]
    DuplicateKey { table: String },

    #[error("column '{column}' of type {storage} does not support equality filters")]
    NotComparable {
        column: String,
        storage: StorageType,
    },

    #[error("command failed: {0}")]
    Execution(String),

    #[error("store state is poisoned")]
    Poisoned,
}

/// Observes each generated command right before it executes.
pub trait CommandInterceptor {
    fn command_initialized(&self, command: &Command);
}

/// Strategy for [`Connection::bulk_copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCopyType {
    /// One insert command per row.
    RowByRow,
    /// One insert command carrying every row.
    MultipleRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCopyOptions {
    pub kind: BulkCopyType,
    /// Bind values as parameters instead of inlining literals.
    pub use_parameters: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCopyResult {
    pub rows_copied: u64,
}

/// Extra clauses for [`Connection::select`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Hints rendered ahead of the statement, in order.
    pub hints: Vec<HintDirective>,
}

impl SelectOptions {
    pub fn with_hints(mut self, hints: Vec<HintDirective>) -> Self {
        self.hints = hints;
        self
    }
}

/// A live connection to a store.
pub trait Connection: Send {
    /// Register the schema used by later calls naming `mapping.table()`.
    fn add_mapping(&mut self, mapping: TableMapping);

    fn create_table(&mut self, table: &str) -> Result<(), ClientError>;

    /// Drop a table; an absent table yields [`ClientError::TableNotFound`].
    fn drop_table(&mut self, table: &str) -> Result<(), ClientError>;

    /// Insert one row using the current inline-parameters mode.
    fn insert(&mut self, table: &str, row: &Row) -> Result<u64, ClientError>;

    fn delete_all(&mut self, table: &str) -> Result<u64, ClientError>;

    fn bulk_copy(
        &mut self,
        table: &str,
        rows: &[Row],
        options: BulkCopyOptions,
    ) -> Result<BulkCopyResult, ClientError>;

    /// Read rows matching every condition. The interceptor, if any, observes
    /// only the command generated for this call.
    fn select(
        &mut self,
        table: &str,
        conditions: &[Condition],
        options: &SelectOptions,
        interceptor: Option<&dyn CommandInterceptor>,
    ) -> Result<Vec<Row>, ClientError>;

    /// Choose inline literals (`true`) or bound parameters (`false`) for
    /// subsequently generated commands.
    fn set_inline_parameters(&mut self, inline: bool);

    fn inline_parameters(&self) -> bool;
}

/// Opens connections from explicit configuration.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, ClientError>;
}
