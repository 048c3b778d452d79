//! Command generation.
//!
//! Every operation the client performs is described by a [`Command`]: the
//! YQL text sent to the store, its bound [`Parameter`]s, and the structured
//! [`Statement`] the text was rendered from. Values are emitted either as
//! inline literals or as `$pN` parameters depending on the connection's
//! inline-parameters mode. A NULL filter value always becomes `IS NULL` and
//! never binds a parameter.

pub mod identifier;
pub mod literal;

use thiserror::Error;

use crate::hints::{self, HintDirective, HintError};
use crate::schema::{ColumnSpec, TableMapping};
use crate::types::StorageType;
use crate::value::Value;

pub use identifier::quote_identifier;
pub use literal::LiteralError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error(transparent)]
    Hint(#[from] HintError),

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("row has {actual} values but table '{table}' has {expected} columns")]
    RowShape {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// A value position in a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Rendered literal text.
    Literal(String),
    /// Name of a bound parameter, including the `$`.
    Parameter(String),
}

impl Operand {
    fn text(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Parameter(text) => text,
        }
    }
}

/// A bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    /// Declared YQL type; `None` for a NULL bound without a type.
    pub declared_type: Option<StorageType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { column: String, operand: Operand },
    IsNull { column: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        table: String,
        columns: Vec<ColumnSpec>,
    },
    DropTable {
        table: String,
    },
    DeleteAll {
        table: String,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        rows: Vec<Vec<Operand>>,
    },
    Select {
        table: String,
        columns: Vec<String>,
        predicates: Vec<Predicate>,
    },
}

/// A generated command, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    text: String,
    parameters: Vec<Parameter>,
    statement: Statement,
}

impl Command {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
}

/// An equality filter on one column. A NULL value filters with `IS NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Accumulates operands for one command, as literals or bound parameters.
struct OperandWriter {
    inline: bool,
    typed_nulls: bool,
    parameters: Vec<Parameter>,
}

impl OperandWriter {
    fn new(inline: bool, typed_nulls: bool) -> Self {
        Self {
            inline,
            typed_nulls,
            parameters: Vec::new(),
        }
    }

    fn operand(&mut self, value: &Value, storage: StorageType) -> Result<Operand, LiteralError> {
        if self.inline {
            return literal::render(value, storage).map(Operand::Literal);
        }

        if !value.conforms_to(storage) {
            return Err(LiteralError::Mismatch {
                kind: value.kind(),
                storage,
            });
        }

        let name = format!("$p{}", self.parameters.len());
        let declared_type = if value.is_null() && !self.typed_nulls {
            None
        } else {
            Some(storage)
        };

        self.parameters.push(Parameter {
            name: name.clone(),
            value: value.clone(),
            declared_type,
        });
        Ok(Operand::Parameter(name))
    }

    fn finish(self, statement: Statement, hints: &[HintDirective]) -> Result<Command, SqlError> {
        let mut text = hints::render(hints)?;

        for parameter in &self.parameters {
            let declared = match parameter.declared_type {
                Some(ty) if parameter.value.is_null() => format!("Optional<{}>", ty),
                Some(ty) => ty.to_string(),
                None => "Null".to_string(),
            };
            text.push_str(&format!("DECLARE {} AS {};\n", parameter.name, declared));
        }

        text.push_str(&statement_text(&statement));

        Ok(Command {
            text,
            parameters: self.parameters,
            statement,
        })
    }
}

fn statement_text(statement: &Statement) -> String {
    match statement {
        Statement::CreateTable { table, columns } => {
            let mut lines: Vec<String> = columns
                .iter()
                .map(|c| {
                    format!(
                        "    {} {}{}",
                        quote_identifier(&c.name),
                        c.storage,
                        if c.nullable { "" } else { " NOT NULL" }
                    )
                })
                .collect();

            let keys: Vec<String> = columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| quote_identifier(&c.name))
                .collect();
            if !keys.is_empty() {
                lines.push(format!("    PRIMARY KEY ({})", keys.join(", ")));
            }

            format!(
                "CREATE TABLE {} (\n{}\n)",
                quote_identifier(table),
                lines.join(",\n")
            )
        }
        Statement::DropTable { table } => format!("DROP TABLE {}", quote_identifier(table)),
        Statement::DeleteAll { table } => format!("DELETE FROM {}", quote_identifier(table)),
        Statement::Insert {
            table,
            columns,
            rows,
        } => {
            let columns: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
            let rows: Vec<String> = rows
                .iter()
                .map(|row| {
                    let values: Vec<&str> = row.iter().map(Operand::text).collect();
                    format!("({})", values.join(", "))
                })
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES {}",
                quote_identifier(table),
                columns.join(", "),
                rows.join(", ")
            )
        }
        Statement::Select {
            table,
            columns,
            predicates,
        } => {
            let columns: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
            let mut text = format!(
                "SELECT {} FROM {}",
                columns.join(", "),
                quote_identifier(table)
            );

            let conditions: Vec<String> = predicates
                .iter()
                .map(|p| match p {
                    Predicate::Eq { column, operand } => {
                        format!("{} = {}", quote_identifier(column), operand.text())
                    }
                    Predicate::IsNull { column } => format!("{} IS NULL", quote_identifier(column)),
                })
                .collect();
            if !conditions.is_empty() {
                text.push_str(" WHERE ");
                text.push_str(&conditions.join(" AND "));
            }
            text
        }
    }
}

pub fn create_table(mapping: &TableMapping) -> Command {
    let statement = Statement::CreateTable {
        table: mapping.table().to_string(),
        columns: mapping.columns().to_vec(),
    };
    Command {
        text: statement_text(&statement),
        parameters: Vec::new(),
        statement,
    }
}

pub fn drop_table(table: &str) -> Command {
    let statement = Statement::DropTable {
        table: table.to_string(),
    };
    Command {
        text: statement_text(&statement),
        parameters: Vec::new(),
        statement,
    }
}

pub fn delete_all(table: &str) -> Command {
    let statement = Statement::DeleteAll {
        table: table.to_string(),
    };
    Command {
        text: statement_text(&statement),
        parameters: Vec::new(),
        statement,
    }
}

/// Build a single `INSERT` carrying all `rows`, each in the mapping's column
/// order.
pub fn insert(mapping: &TableMapping, rows: &[Vec<Value>], inline: bool) -> Result<Command, SqlError> {
    let mut writer = OperandWriter::new(inline, mapping.typed_null_parameters());
    let columns = mapping.columns();

    let mut operands = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != columns.len() {
            return Err(SqlError::RowShape {
                table: mapping.table().to_string(),
                expected: columns.len(),
                actual: row.len(),
            });
        }

        let row = row
            .iter()
            .zip(columns)
            .map(|(value, column)| writer.operand(value, column.storage))
            .collect::<Result<Vec<_>, _>>()?;
        operands.push(row);
    }

    let statement = Statement::Insert {
        table: mapping.table().to_string(),
        columns: columns.iter().map(|c| c.name.clone()).collect(),
        rows: operands,
    };
    writer.finish(statement, &[])
}

/// Build a `SELECT` of all mapped columns filtered by `conditions`.
pub fn select(
    mapping: &TableMapping,
    conditions: &[Condition],
    hints: &[HintDirective],
    inline: bool,
) -> Result<Command, SqlError> {
    let mut writer = OperandWriter::new(inline, mapping.typed_null_parameters());

    let mut predicates = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let column = mapping
            .column(&condition.column)
            .ok_or_else(|| SqlError::UnknownColumn {
                table: mapping.table().to_string(),
                column: condition.column.clone(),
            })?;

        predicates.push(if condition.value.is_null() {
            Predicate::IsNull {
                column: column.name.clone(),
            }
        } else {
            Predicate::Eq {
                column: column.name.clone(),
                operand: writer.operand(&condition.value, column.storage)?,
            }
        });
    }

    let statement = Statement::Select {
        table: mapping.table().to_string(),
        columns: mapping.columns().iter().map(|c| c.name.clone()).collect(),
        predicates,
    };
    writer.finish(statement, hints)
}
