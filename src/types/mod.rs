//! Logical column types, their physical YDB storage types, and the immutable
//! [`TypeDescriptor`] that ties the two together.
//!
//! A descriptor is what a conformance case hands to the schema binder: the
//! logical type under test plus the optional precision/scale/length and an
//! optional explicit storage-type override.

use std::fmt;

use thiserror::Error;

/// Default precision used for `Decimal` columns without an explicit precision.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 22;

/// Default scale used for `Decimal` columns without an explicit precision.
pub const DEFAULT_DECIMAL_SCALE: u8 = 9;

/// Largest precision the store accepts for `Decimal(p, s)`.
pub const MAX_DECIMAL_PRECISION: u8 = 35;

/// Logical type of a column, independent of its physical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    /// Fixed binary payload.
    Binary,
    /// Variable binary payload.
    VarBinary,
    /// Unicode text.
    NVarChar,
    /// Textual JSON document.
    Json,
    /// Binary-encoded JSON document.
    BinaryJson,
    Guid,
    Date,
    DateTime,
    DateTime2,
    Timestamp,
    Interval,
}

impl DataType {
    /// Whether precision/scale may be configured for this type.
    pub fn supports_precision(self) -> bool {
        matches!(self, Self::Decimal)
    }

    /// Whether a length may be configured for this type.
    pub fn supports_length(self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary | Self::NVarChar)
    }

    /// Storage type used when no override is given.
    fn default_storage(self, precision: Option<u8>, scale: Option<u8>) -> StorageType {
        match self {
            Self::Boolean => StorageType::Bool,
            Self::SByte => StorageType::Int8,
            Self::Byte => StorageType::Uint8,
            Self::Int16 => StorageType::Int16,
            Self::UInt16 => StorageType::Uint16,
            Self::Int32 => StorageType::Int32,
            Self::UInt32 => StorageType::Uint32,
            Self::Int64 => StorageType::Int64,
            Self::UInt64 => StorageType::Uint64,
            Self::Single => StorageType::Float,
            Self::Double => StorageType::Double,
            Self::Decimal => match precision {
                Some(precision) => StorageType::Decimal {
                    precision,
                    scale: scale.unwrap_or(0),
                },
                None => StorageType::Decimal {
                    precision: DEFAULT_DECIMAL_PRECISION,
                    scale: DEFAULT_DECIMAL_SCALE,
                },
            },
            Self::Binary | Self::VarBinary => StorageType::String,
            Self::NVarChar => StorageType::Utf8,
            Self::Json => StorageType::Json,
            Self::BinaryJson => StorageType::JsonDocument,
            Self::Guid => StorageType::Uuid,
            Self::Date => StorageType::Date,
            Self::DateTime => StorageType::Datetime,
            Self::DateTime2 | Self::Timestamp => StorageType::Timestamp,
            Self::Interval => StorageType::Interval,
        }
    }

    /// Storage types an explicit override may select for this logical type,
    /// in addition to the default one.
    fn allowed_overrides(self) -> &'static [StorageType] {
        match self {
            Self::Date => &[StorageType::Date, StorageType::Date32],
            Self::DateTime | Self::DateTime2 | Self::Timestamp => &[
                StorageType::Datetime,
                StorageType::Datetime64,
                StorageType::Timestamp,
                StorageType::Timestamp64,
            ],
            Self::Interval => &[StorageType::Interval, StorageType::Interval64],
            _ => &[],
        }
    }
}

/// Physical YDB column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    /// Arbitrary bytes (YDB `String`).
    String,
    Utf8,
    Json,
    JsonDocument,
    Uuid,
    Date,
    Date32,
    Datetime,
    Datetime64,
    Timestamp,
    Timestamp64,
    Interval,
    Interval64,
}

impl StorageType {
    /// YQL type name without parameters.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int8 => "Int8",
            Self::Uint8 => "Uint8",
            Self::Int16 => "Int16",
            Self::Uint16 => "Uint16",
            Self::Int32 => "Int32",
            Self::Uint32 => "Uint32",
            Self::Int64 => "Int64",
            Self::Uint64 => "Uint64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Decimal { .. } => "Decimal",
            Self::String => "String",
            Self::Utf8 => "Utf8",
            Self::Json => "Json",
            Self::JsonDocument => "JsonDocument",
            Self::Uuid => "Uuid",
            Self::Date => "Date",
            Self::Date32 => "Date32",
            Self::Datetime => "Datetime",
            Self::Datetime64 => "Datetime64",
            Self::Timestamp => "Timestamp",
            Self::Timestamp64 => "Timestamp64",
            Self::Interval => "Interval",
            Self::Interval64 => "Interval64",
        }
    }

    /// Look up a parameterless storage type by its YQL name (case-insensitive).
    ///
    /// `Decimal` resolves with the default precision and scale.
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMED: [StorageType; 25] = [
            StorageType::Bool,
            StorageType::Int8,
            StorageType::Uint8,
            StorageType::Int16,
            StorageType::Uint16,
            StorageType::Int32,
            StorageType::Uint32,
            StorageType::Int64,
            StorageType::Uint64,
            StorageType::Float,
            StorageType::Double,
            StorageType::Decimal {
                precision: DEFAULT_DECIMAL_PRECISION,
                scale: DEFAULT_DECIMAL_SCALE,
            },
            StorageType::String,
            StorageType::Utf8,
            StorageType::Json,
            StorageType::JsonDocument,
            StorageType::Uuid,
            StorageType::Date,
            StorageType::Date32,
            StorageType::Datetime,
            StorageType::Datetime64,
            StorageType::Timestamp,
            StorageType::Timestamp64,
            StorageType::Interval,
            StorageType::Interval64,
        ];

        NAMED
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    /// Whether the store can evaluate `=` predicates on this type.
    pub fn is_comparable(self) -> bool {
        !matches!(self, Self::Json | Self::JsonDocument)
    }

    /// Whether two storage types carry the same value family, e.g. `Date`
    /// and `Date32` both hold day counts.
    pub fn same_family(self, other: Self) -> bool {
        use StorageType::*;

        match (self, other) {
            (Decimal { .. }, Decimal { .. }) => true,
            (Date | Date32, Date | Date32) => true,
            (Datetime | Datetime64, Datetime | Datetime64) => true,
            (Timestamp | Timestamp64, Timestamp | Timestamp64) => true,
            (Interval | Interval64, Interval | Interval64) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "Decimal({},{})", precision, scale),
            other => f.write_str(other.name()),
        }
    }
}

/// Configuration errors raised while building a [`TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("{data_type:?} does not support precision or scale")]
    PrecisionNotSupported { data_type: DataType },

    #[error("{data_type:?} does not support a length")]
    LengthNotSupported { data_type: DataType },

    #[error("scale {scale} given without a precision")]
    ScaleWithoutPrecision { scale: u8 },

    #[error("scale {scale} exceeds precision {precision}")]
    ScaleExceedsPrecision { precision: u8, scale: u8 },

    #[error("precision {precision} is outside 1..={max}", max = MAX_DECIMAL_PRECISION)]
    PrecisionOutOfRange { precision: u8 },

    #[error("unknown storage type '{0}'")]
    UnknownStorageType(String),

    #[error("storage type {storage} cannot hold {data_type:?} values")]
    IncompatibleStorageType {
        data_type: DataType,
        storage: StorageType,
    },
}

/// Immutable description of a logical column type under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    data_type: DataType,
    storage_override: Option<String>,
    precision: Option<u8>,
    scale: Option<u8>,
    length: Option<u32>,
    typed_null_parameters: bool,
}

impl TypeDescriptor {
    /// Descriptor for `data_type` with its default storage.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            storage_override: None,
            precision: None,
            scale: None,
            length: None,
            typed_null_parameters: false,
        }
    }

    /// Map onto an explicitly named physical storage type.
    pub fn with_storage(mut self, name: impl Into<String>) -> Self {
        self.storage_override = Some(name.into());
        self
    }

    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_scale(mut self, scale: u8) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Declare that the client binds NULL parameters of this type with an
    /// explicit type, which keeps bulk writes usable for NULL samples.
    pub fn with_typed_null_parameters(mut self, enabled: bool) -> Self {
        self.typed_null_parameters = enabled;
        self
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn storage_override(&self) -> Option<&str> {
        self.storage_override.as_deref()
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn scale(&self) -> Option<u8> {
        self.scale
    }

    pub fn length(&self) -> Option<u32> {
        self.length
    }

    pub fn typed_null_parameters(&self) -> bool {
        self.typed_null_parameters
    }

    /// Validate the descriptor and resolve its physical storage type.
    pub fn storage_type(&self) -> Result<StorageType, DescriptorError> {
        self.validate_shape()?;

        let default = self.data_type.default_storage(self.precision, self.scale);

        let Some(name) = self.storage_override.as_deref() else {
            return Ok(default);
        };

        let named = StorageType::from_name(name)
            .ok_or_else(|| DescriptorError::UnknownStorageType(name.to_string()))?;

        // An override naming the default keeps its configured parameters.
        if named.name() == default.name() {
            return Ok(default);
        }

        if self.data_type.allowed_overrides().contains(&named) {
            Ok(named)
        } else {
            Err(DescriptorError::IncompatibleStorageType {
                data_type: self.data_type,
                storage: named,
            })
        }
    }

    fn validate_shape(&self) -> Result<(), DescriptorError> {
        if (self.precision.is_some() || self.scale.is_some())
            && !self.data_type.supports_precision()
        {
            return Err(DescriptorError::PrecisionNotSupported {
                data_type: self.data_type,
            });
        }

        if self.length.is_some() && !self.data_type.supports_length() {
            return Err(DescriptorError::LengthNotSupported {
                data_type: self.data_type,
            });
        }

        match (self.precision, self.scale) {
            (None, Some(scale)) => Err(DescriptorError::ScaleWithoutPrecision { scale }),
            (Some(precision), _) if precision == 0 || precision > MAX_DECIMAL_PRECISION => {
                Err(DescriptorError::PrecisionOutOfRange { precision })
            }
            (Some(precision), Some(scale)) if scale > precision => {
                Err(DescriptorError::ScaleExceedsPrecision { precision, scale })
            }
            _ => Ok(()),
        }
    }
}

impl From<DataType> for TypeDescriptor {
    fn from(data_type: DataType) -> Self {
        Self::new(data_type)
    }
}
