//! In-process store implementing the client contracts.
//!
//! The memory store executes the structured form of each generated
//! [`Command`] the way a YDB server would treat the text: literal operands
//! are parsed back from their YQL form, bound parameters are matched against
//! their declarations, and every written value is checked against the
//! column's storage type and range. It also reproduces the store-side
//! limitation that a NULL parameter without a declared type cannot be bound.
//!
//! Failure switches (`set_fail_drop` and friends) let tests provoke the
//! error paths of callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::{
    BulkCopyOptions, BulkCopyResult, BulkCopyType, ClientError, CommandInterceptor, Connection,
    ConnectionFactory, Row, SelectOptions,
};
use crate::config::ConnectionConfig;
use crate::schema::{ColumnSpec, TableMapping};
use crate::sql::{self, literal, Command, Condition, Operand, Parameter, Predicate, Statement};
use crate::value::Value;

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<ColumnSpec>,
    rows: Vec<Row>,
}

impl MemoryTable {
    fn column_index(&self, table: &str, name: &str) -> Result<usize, ClientError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ClientError::Execution(format!("table '{}' has no column '{}'", table, name)))
    }
}

enum Outcome {
    Done,
    Affected(u64),
    Rows(Vec<Row>),
}

#[derive(Debug, Default)]
struct MemoryStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    log: Mutex<Vec<String>>,
    fail_drop: AtomicBool,
    ignore_inline_mode: AtomicBool,
    reject_connections: AtomicBool,
}

impl MemoryStore {
    fn execute(&self, command: &Command) -> Result<Outcome, ClientError> {
        debug!(command = %command.text(), parameters = command.parameters().len(), "executing");

        self.log
            .lock()
            .map_err(|_| ClientError::Poisoned)?
            .push(command.text().to_string());

        let mut tables = self.tables.lock().map_err(|_| ClientError::Poisoned)?;

        match command.statement() {
            Statement::CreateTable { table, columns } => {
                if tables.contains_key(table) {
                    return Err(ClientError::TableExists(table.clone()));
                }
                tables.insert(
                    table.clone(),
                    MemoryTable {
                        columns: columns.clone(),
                        rows: Vec::new(),
                    },
                );
                Ok(Outcome::Done)
            }
            Statement::DropTable { table } => {
                if self.fail_drop.load(Ordering::SeqCst) {
                    return Err(ClientError::Execution(format!(
                        "drop of '{}' rejected",
                        table
                    )));
                }
                tables
                    .remove(table)
                    .map(|_| Outcome::Done)
                    .ok_or_else(|| ClientError::TableNotFound(table.clone()))
            }
            Statement::DeleteAll { table } => {
                let target = tables
                    .get_mut(table)
                    .ok_or_else(|| ClientError::TableNotFound(table.clone()))?;
                let removed = target.rows.len() as u64;
                target.rows.clear();
                Ok(Outcome::Affected(removed))
            }
            Statement::Insert {
                table,
                columns,
                rows,
            } => {
                let target = tables
                    .get_mut(table)
                    .ok_or_else(|| ClientError::TableNotFound(table.clone()))?;
                let staged = stage_rows(table, target, columns, rows, command.parameters())?;
                let inserted = staged.len() as u64;
                target.rows.extend(staged);
                Ok(Outcome::Affected(inserted))
            }
            Statement::Select {
                table,
                columns,
                predicates,
            } => {
                let target = tables
                    .get(table)
                    .ok_or_else(|| ClientError::TableNotFound(table.clone()))?;
                select_rows(table, target, columns, predicates, command.parameters())
                    .map(Outcome::Rows)
            }
        }
    }
}

/// Resolve, coerce and validate inserted rows without touching the table.
fn stage_rows(
    table: &str,
    target: &MemoryTable,
    columns: &[String],
    rows: &[Vec<Operand>],
    parameters: &[Parameter],
) -> Result<Vec<Row>, ClientError> {
    let mut staged: Vec<Row> = Vec::with_capacity(rows.len());

    for operands in rows {
        let mut stored = vec![Value::Null; target.columns.len()];

        for (name, operand) in columns.iter().zip(operands) {
            let index = target.column_index(table, name)?;
            let column = &target.columns[index];
            let value = resolve(operand, parameters, column)?;
            stored[index] = coerce(value, column)?;
        }

        for (column, value) in target.columns.iter().zip(&stored) {
            if !column.nullable && value.is_null() {
                return Err(ClientError::NullViolation {
                    column: column.name.clone(),
                });
            }
        }

        staged.push(stored);
    }

    let keys: Vec<usize> = target
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key)
        .map(|(i, _)| i)
        .collect();
    let key_of = |row: &Row| -> Vec<Value> { keys.iter().map(|&i| row[i].clone()).collect() };

    let mut seen: Vec<Vec<Value>> = target.rows.iter().map(key_of).collect();
    for row in &staged {
        let key = key_of(row);
        if seen.contains(&key) {
            return Err(ClientError::DuplicateKey {
                table: table.to_string(),
            });
        }
        seen.push(key);
    }

    Ok(staged)
}

fn select_rows(
    table: &str,
    target: &MemoryTable,
    columns: &[String],
    predicates: &[Predicate],
    parameters: &[Parameter],
) -> Result<Vec<Row>, ClientError> {
    let mut filters: Vec<(usize, Option<Value>)> = Vec::with_capacity(predicates.len());
    for predicate in predicates {
        match predicate {
            Predicate::Eq { column, operand } => {
                let index = target.column_index(table, column)?;
                let spec = &target.columns[index];
                if !spec.storage.is_comparable() {
                    return Err(ClientError::NotComparable {
                        column: spec.name.clone(),
                        storage: spec.storage,
                    });
                }
                let value = coerce(resolve(operand, parameters, spec)?, spec)?;
                filters.push((index, Some(value)));
            }
            Predicate::IsNull { column } => {
                filters.push((target.column_index(table, column)?, None));
            }
        }
    }

    let projection = columns
        .iter()
        .map(|name| target.column_index(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(target
        .rows
        .iter()
        .filter(|row| {
            filters.iter().all(|(index, expected)| match expected {
                // SQL equality: NULL never matches and NaN never equals itself.
                Some(value) => !row[*index].is_null() && row[*index] == *value,
                None => row[*index].is_null(),
            })
        })
        .map(|row| projection.iter().map(|&i| row[i].clone()).collect())
        .collect())
}

fn resolve(operand: &Operand, parameters: &[Parameter], column: &ColumnSpec) -> Result<Value, ClientError> {
    let mismatch = |found: String| ClientError::TypeMismatch {
        column: column.name.clone(),
        expected: column.storage,
        found,
    };

    match operand {
        Operand::Literal(text) => {
            let parsed = literal::parse(text)?;
            match parsed.storage {
                Some(storage) if storage != column.storage => Err(mismatch(storage.to_string())),
                _ => Ok(parsed.value),
            }
        }
        Operand::Parameter(name) => {
            let parameter = parameters
                .iter()
                .find(|p| &p.name == name)
                .ok_or_else(|| ClientError::UnknownParameter(name.clone()))?;
            match parameter.declared_type {
                None if parameter.value.is_null() => Err(ClientError::UntypedNullParameter {
                    name: name.clone(),
                }),
                Some(declared) if declared != column.storage => Err(mismatch(declared.to_string())),
                _ => Ok(parameter.value.clone()),
            }
        }
    }
}

/// Check a value against its column and normalise it for storage.
fn coerce(value: Value, column: &ColumnSpec) -> Result<Value, ClientError> {
    if value.is_null() {
        return Ok(value);
    }

    if !value.conforms_to(column.storage) {
        return Err(ClientError::TypeMismatch {
            column: column.name.clone(),
            expected: column.storage,
            found: value.kind().to_string(),
        });
    }

    value
        .check_bounds(column.storage)
        .map_err(|source| ClientError::OutOfRange {
            column: column.name.clone(),
            source,
        })?;

    let invalid_json = |e: serde_json::Error| {
        ClientError::Execution(format!("column '{}': invalid JSON: {}", column.name, e))
    };

    match value {
        Value::Json(text) => {
            serde_json::from_str::<serde_json::Value>(&text).map_err(invalid_json)?;
            Ok(Value::Json(text))
        }
        Value::JsonDocument(text) => {
            // Binary JSON keeps the document, not its formatting.
            let document: serde_json::Value = serde_json::from_str(&text).map_err(invalid_json)?;
            Ok(Value::JsonDocument(document.to_string()))
        }
        other => Ok(other),
    }
}

/// Factory for connections sharing one in-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnectionFactory {
    store: Arc<MemoryStore>,
}

impl MemoryConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `DROP TABLE` fail.
    pub fn set_fail_drop(&self, fail: bool) {
        self.store.fail_drop.store(fail, Ordering::SeqCst);
    }

    /// Bind parameters even when connections ask for inline literals.
    pub fn set_ignore_inline_mode(&self, ignore: bool) {
        self.store.ignore_inline_mode.store(ignore, Ordering::SeqCst);
    }

    /// Refuse new connections.
    pub fn set_reject_connections(&self, reject: bool) {
        self.store.reject_connections.store(reject, Ordering::SeqCst);
    }

    /// Names of existing tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .store
            .tables
            .lock()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Stored rows of `table` in storage column order.
    pub fn rows(&self, table: &str) -> Option<Vec<Row>> {
        self.store
            .tables
            .lock()
            .ok()
            .and_then(|tables| tables.get(table).map(|t| t.rows.clone()))
    }

    /// Text of every command executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.store
            .log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConnectionFactory for MemoryConnectionFactory {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>, ClientError> {
        if self.store.reject_connections.load(Ordering::SeqCst) {
            return Err(ClientError::Connection(format!(
                "{}:{} refused the connection",
                config.host,
                config.effective_port()
            )));
        }

        debug!(connection = %config.connection_string(), "opening in-memory connection");

        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
            mappings: HashMap::new(),
            inline: false,
        }))
    }
}

/// Connection handed out by [`MemoryConnectionFactory`].
#[derive(Debug)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
    mappings: HashMap<String, TableMapping>,
    inline: bool,
}

impl MemoryConnection {
    fn mapping(&self, table: &str) -> Result<&TableMapping, ClientError> {
        self.mappings
            .get(table)
            .ok_or_else(|| ClientError::MappingNotRegistered(table.to_string()))
    }

    fn inline_for(&self, requested: bool) -> bool {
        requested && !self.store.ignore_inline_mode.load(Ordering::SeqCst)
    }

    fn affected(&self, command: &Command) -> Result<u64, ClientError> {
        match self.store.execute(command)? {
            Outcome::Affected(count) => Ok(count),
            _ => Ok(0),
        }
    }
}

impl Connection for MemoryConnection {
    fn add_mapping(&mut self, mapping: TableMapping) {
        self.mappings.insert(mapping.table().to_string(), mapping);
    }

    fn create_table(&mut self, table: &str) -> Result<(), ClientError> {
        let command = sql::create_table(self.mapping(table)?);
        self.store.execute(&command).map(|_| ())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), ClientError> {
        self.store.execute(&sql::drop_table(table)).map(|_| ())
    }

    fn insert(&mut self, table: &str, row: &Row) -> Result<u64, ClientError> {
        let inline = self.inline_for(self.inline);
        let command = sql::insert(self.mapping(table)?, std::slice::from_ref(row), inline)?;
        self.affected(&command)
    }

    fn delete_all(&mut self, table: &str) -> Result<u64, ClientError> {
        self.affected(&sql::delete_all(table))
    }

    fn bulk_copy(
        &mut self,
        table: &str,
        rows: &[Row],
        options: BulkCopyOptions,
    ) -> Result<BulkCopyResult, ClientError> {
        let inline = self.inline_for(!options.use_parameters);
        let mapping = self.mapping(table)?;

        let commands = match options.kind {
            BulkCopyType::RowByRow => rows
                .iter()
                .map(|row| sql::insert(mapping, std::slice::from_ref(row), inline))
                .collect::<Result<Vec<_>, _>>()?,
            BulkCopyType::MultipleRows => vec![sql::insert(mapping, rows, inline)?],
        };

        let mut rows_copied = 0;
        for command in &commands {
            rows_copied += self.affected(command)?;
        }
        Ok(BulkCopyResult { rows_copied })
    }

    fn select(
        &mut self,
        table: &str,
        conditions: &[Condition],
        options: &SelectOptions,
        interceptor: Option<&dyn CommandInterceptor>,
    ) -> Result<Vec<Row>, ClientError> {
        let inline = self.inline_for(self.inline);
        let command = sql::select(self.mapping(table)?, conditions, &options.hints, inline)?;

        if let Some(interceptor) = interceptor {
            interceptor.command_initialized(&command);
        }

        match self.store.execute(&command)? {
            Outcome::Rows(rows) => Ok(rows),
            _ => Ok(Vec::new()),
        }
    }

    fn set_inline_parameters(&mut self, inline: bool) {
        self.inline = inline;
    }

    fn inline_parameters(&self) -> bool {
        self.inline
    }
}
