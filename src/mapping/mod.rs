//! Conversion between in-process typed values and storage [`Value`]s.
//!
//! Every Rust type that can sit in a conformance row implements
//! [`ColumnValue`]. Conversions are driven by the column's [`StorageType`], so
//! the same Rust type may be written into several physical types (a `bool`
//! into `Uint8`, an `f32` into `Int32`, a `String` into `Decimal(22,9)`).
//! Conversions that would lose information fail instead of silently
//! truncating; sub-unit truncation of temporal values is the one documented
//! exception and follows the store's own units.

mod numeric;
pub mod temporal;

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::types::StorageType;
use crate::value::Value;

pub(crate) use numeric::Number;

/// Errors raised while converting between typed and storage values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{rust_type} cannot be mapped to {storage}")]
    Unsupported {
        rust_type: &'static str,
        storage: StorageType,
    },

    #[error("{value} does not fit {target}")]
    OutOfRange { value: String, target: String },

    #[error("{value} cannot be represented exactly as {target}")]
    Inexact { value: String, target: String },

    #[error("invalid {target} text '{text}': {reason}")]
    Parse {
        text: String,
        target: String,
        reason: String,
    },

    #[error("expected a value for {storage} column, found {found}")]
    UnexpectedValue {
        storage: StorageType,
        found: &'static str,
    },

    #[error("unexpected NULL in a non-nullable column")]
    UnexpectedNull,
}

/// A Rust type that can be written to and read back from a typed column.
pub trait ColumnValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Encode `self` for a column of the given storage type.
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError>;

    /// Decode a non-NULL storage value read from a column of the given type.
    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError>;
}

/// Encode an optional value; `None` becomes [`Value::Null`].
pub fn encode_nullable<V: ColumnValue>(
    value: Option<&V>,
    storage: StorageType,
) -> Result<Value, MappingError> {
    match value {
        Some(value) => value.to_value(storage),
        None => Ok(Value::Null),
    }
}

/// Decode a nullable column; [`Value::Null`] becomes `None`.
pub fn decode_nullable<V: ColumnValue>(
    value: &Value,
    storage: StorageType,
) -> Result<Option<V>, MappingError> {
    if value.is_null() {
        Ok(None)
    } else {
        V::from_value(value, storage).map(Some)
    }
}

pub(crate) fn unexpected(value: &Value, storage: StorageType) -> MappingError {
    if value.is_null() {
        MappingError::UnexpectedNull
    } else {
        MappingError::UnexpectedValue {
            storage,
            found: value.kind(),
        }
    }
}

fn parse_error(text: &str, target: impl fmt::Display, reason: impl fmt::Display) -> MappingError {
    MappingError::Parse {
        text: text.to_string(),
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_json(text: &str, storage: StorageType) -> Result<(), MappingError> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|_| ())
        .map_err(|e| parse_error(text, storage, e))
}

impl ColumnValue for bool {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::Bool => Ok(Value::Bool(*self)),
            _ => Number::Int(i128::from(*self)).into_value(storage, "bool"),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        if let Value::Bool(flag) = value {
            return Ok(*flag);
        }

        match Number::from_value(value, storage)?.integer::<i128>("bool")? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MappingError::Inexact {
                value: other.to_string(),
                target: "bool".to_string(),
            }),
        }
    }
}

impl ColumnValue for String {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::String => Ok(Value::Bytes(self.as_bytes().to_vec())),
            StorageType::Utf8 => Ok(Value::Utf8(self.clone())),
            StorageType::Json => {
                validate_json(self, storage)?;
                Ok(Value::Json(self.clone()))
            }
            StorageType::JsonDocument => {
                validate_json(self, storage)?;
                Ok(Value::JsonDocument(self.clone()))
            }
            StorageType::Decimal { .. } => {
                let decimal = self
                    .parse()
                    .map_err(|e| parse_error(self, storage, e))?;
                Number::Decimal(decimal).into_value(storage, "String")
            }
            StorageType::Uuid => Uuid::parse_str(self)
                .map(Value::Uuid)
                .map_err(|e| parse_error(self, storage, e)),
            _ => Err(MappingError::Unsupported {
                rust_type: "String",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Value::Utf8(text) | Value::Json(text) | Value::JsonDocument(text) => Ok(text.clone()),
            Value::Decimal(decimal) => Ok(decimal.to_string()),
            Value::Uuid(uuid) => Ok(uuid.to_string()),
            other => Err(unexpected(other, storage)),
        }
    }
}

impl ColumnValue for char {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::String | StorageType::Utf8 => self.to_string().to_value(storage),
            _ => Err(MappingError::Unsupported {
                rust_type: "char",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        let text = String::from_value(value, storage)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MappingError::Inexact {
                value: format!("{:?}", text),
                target: "char".to_string(),
            }),
        }
    }
}

impl ColumnValue for Vec<u8> {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::String => Ok(Value::Bytes(self.clone())),
            StorageType::Utf8 => String::from_utf8(self.clone())
                .map(Value::Utf8)
                .map_err(|e| parse_error(&String::from_utf8_lossy(self), storage, e)),
            _ => Err(MappingError::Unsupported {
                rust_type: "Vec<u8>",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Utf8(text) => Ok(text.as_bytes().to_vec()),
            other => Err(unexpected(other, storage)),
        }
    }
}

impl ColumnValue for Uuid {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::Uuid => Ok(Value::Uuid(*self)),
            StorageType::Utf8 => Ok(Value::Utf8(self.to_string())),
            _ => Err(MappingError::Unsupported {
                rust_type: "Uuid",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Uuid(uuid) => Ok(*uuid),
            Value::Utf8(text) => Uuid::parse_str(text).map_err(|e| parse_error(text, "Uuid", e)),
            other => Err(unexpected(other, storage)),
        }
    }
}

impl ColumnValue for serde_json::Value {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::Json => Ok(Value::Json(self.to_string())),
            StorageType::JsonDocument => Ok(Value::JsonDocument(self.to_string())),
            StorageType::Utf8 => Ok(Value::Utf8(self.to_string())),
            _ => Err(MappingError::Unsupported {
                rust_type: "serde_json::Value",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Json(text) | Value::JsonDocument(text) | Value::Utf8(text) => {
                serde_json::from_str(text).map_err(|e| parse_error(text, storage, e))
            }
            other => Err(unexpected(other, storage)),
        }
    }
}
