//! Schema binding for conformance tables.
//!
//! A conformance table always has the same shape: an `Id` primary key, a
//! non-nullable `Value` column and, unless the case opts out, a nullable
//! `ValueNullable` column configured identically to `Value`. [`bind`] turns a
//! [`TypeDescriptor`] into that concrete [`TableMapping`]; the mapping is then
//! registered with the connection so table creation and row encoding agree on
//! the physical column types.

use std::any::type_name;

use thiserror::Error;

use crate::mapping::{decode_nullable, encode_nullable, ColumnValue, MappingError};
use crate::types::{DescriptorError, StorageType, TypeDescriptor};
use crate::value::Value;

pub const ID_COLUMN: &str = "Id";
pub const VALUE_COLUMN: &str = "Value";
pub const NULLABLE_COLUMN: &str = "ValueNullable";

/// Primary key of the single conformance row.
pub const ROW_ID: i32 = 1;

/// Physical definition of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub storage: StorageType,
    pub nullable: bool,
    pub primary_key: bool,
    pub length: Option<u32>,
}

impl ColumnSpec {
    fn new(name: &str, storage: StorageType) -> Self {
        Self {
            name: name.to_string(),
            storage,
            nullable: false,
            primary_key: false,
            length: None,
        }
    }
}

/// Concrete table schema produced by [`bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    table: String,
    columns: Vec<ColumnSpec>,
    typed_null_parameters: bool,
}

impl TableMapping {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns in declaration order: `Id`, `Value`, then `ValueNullable` if bound.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_nullable_column(&self) -> bool {
        self.column(NULLABLE_COLUMN).is_some()
    }

    /// Whether NULL parameters bound for this table carry a declared type.
    pub fn typed_null_parameters(&self) -> bool {
        self.typed_null_parameters
    }

    /// Storage type shared by the value columns.
    pub fn value_storage(&self) -> StorageType {
        self.column(VALUE_COLUMN)
            .map(|c| c.storage)
            .unwrap_or(StorageType::Int32)
    }
}

/// Build the conformance table mapping for `descriptor`.
///
/// With `skip_nullable` the `ValueNullable` column is left out of the schema
/// entirely.
pub fn bind(
    table: impl Into<String>,
    descriptor: &TypeDescriptor,
    skip_nullable: bool,
) -> Result<TableMapping, DescriptorError> {
    let storage = descriptor.storage_type()?;

    let mut id = ColumnSpec::new(ID_COLUMN, StorageType::Int32);
    id.primary_key = true;

    let mut value = ColumnSpec::new(VALUE_COLUMN, storage);
    value.length = descriptor.length();

    let mut columns = vec![id, value.clone()];
    if !skip_nullable {
        let mut nullable = value;
        nullable.name = NULLABLE_COLUMN.to_string();
        nullable.nullable = true;
        columns.push(nullable);
    }

    Ok(TableMapping {
        table: table.into(),
        columns,
        typed_null_parameters: descriptor.typed_null_parameters(),
    })
}

/// A column that failed to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {column}: {source}")]
pub struct ColumnError {
    pub column: String,
    #[source]
    pub source: MappingError,
}

impl ColumnError {
    fn new(column: &str, source: MappingError) -> Self {
        Self {
            column: column.to_string(),
            source,
        }
    }
}

/// The single row written to a conformance table.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRow<T, N = T> {
    pub id: i32,
    pub value: T,
    pub nullable_value: Option<N>,
}

impl<T: ColumnValue, N: ColumnValue> TestRow<T, N> {
    pub fn new(value: T, nullable_value: Option<N>) -> Self {
        Self {
            id: ROW_ID,
            value,
            nullable_value,
        }
    }

    /// Deterministic table name for this row shape, e.g. `TestRow_i8_i8`.
    pub fn table_name() -> String {
        format!(
            "TestRow_{}_{}",
            short_type_name(type_name::<T>()),
            short_type_name(type_name::<N>())
        )
    }

    /// Encode the row in the mapping's column order.
    pub fn encode(&self, mapping: &TableMapping) -> Result<Vec<Value>, ColumnError> {
        mapping
            .columns()
            .iter()
            .map(|column| {
                let encoded = match column.name.as_str() {
                    ID_COLUMN => self.id.to_value(column.storage),
                    VALUE_COLUMN => self.value.to_value(column.storage),
                    _ => encode_nullable(self.nullable_value.as_ref(), column.storage),
                };
                encoded.map_err(|e| ColumnError::new(&column.name, e))
            })
            .collect()
    }

    /// Decode a row read back in the mapping's column order.
    pub fn decode(row: &[Value], mapping: &TableMapping) -> Result<Self, ColumnError> {
        let cell = |name: &str| -> Result<(&Value, StorageType), ColumnError> {
            let index = mapping
                .column_index(name)
                .ok_or_else(|| ColumnError::new(name, MappingError::UnexpectedNull))?;
            let value = row
                .get(index)
                .ok_or_else(|| ColumnError::new(name, MappingError::UnexpectedNull))?;
            Ok((value, mapping.columns()[index].storage))
        };

        let (id, storage) = cell(ID_COLUMN)?;
        let id = i32::from_value(id, storage).map_err(|e| ColumnError::new(ID_COLUMN, e))?;

        let (value, storage) = cell(VALUE_COLUMN)?;
        let value = T::from_value(value, storage).map_err(|e| ColumnError::new(VALUE_COLUMN, e))?;

        let nullable_value = if mapping.has_nullable_column() {
            let (nullable, storage) = cell(NULLABLE_COLUMN)?;
            decode_nullable(nullable, storage).map_err(|e| ColumnError::new(NULLABLE_COLUMN, e))?
        } else {
            None
        };

        Ok(Self {
            id,
            value,
            nullable_value,
        })
    }
}

/// Strip module paths from a type name and flatten generics into `_`-joined
/// segments: `chrono::datetime::DateTime<chrono::offset::utc::Utc>` becomes
/// `DateTime_Utc`.
fn short_type_name(full: &str) -> String {
    full.split(|c: char| matches!(c, '<' | '>' | ',' | '(' | ')' | '[' | ']' | ';' | '&' | ' '))
        .filter_map(|segment| segment.rsplit("::").next())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}
