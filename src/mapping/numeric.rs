use rust_decimal::Decimal;

use super::{unexpected, ColumnValue, MappingError};
use crate::types::StorageType;
use crate::value::{DecimalValue, Value};

/// Numeric intermediate shared by every numeric storage and Rust type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i128),
    Float(f64),
    Decimal(DecimalValue),
}

impl Number {
    pub(crate) fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        Ok(match value {
            Value::Int8(v) => Self::Int(i128::from(*v)),
            Value::Uint8(v) => Self::Int(i128::from(*v)),
            Value::Int16(v) => Self::Int(i128::from(*v)),
            Value::Uint16(v) => Self::Int(i128::from(*v)),
            Value::Int32(v) => Self::Int(i128::from(*v)),
            Value::Uint32(v) => Self::Int(i128::from(*v)),
            Value::Int64(v) => Self::Int(i128::from(*v)),
            Value::Uint64(v) => Self::Int(i128::from(*v)),
            Value::Float(v) => Self::Float(f64::from(*v)),
            Value::Double(v) => Self::Float(*v),
            Value::Decimal(v) => Self::Decimal(*v),
            other => return Err(unexpected(other, storage)),
        })
    }

    fn describe(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Decimal(v) => v.to_string(),
        }
    }

    /// Convert to an integer type, failing on fractional or out-of-range values.
    pub(crate) fn integer<I: TryFrom<i128>>(&self, target: &str) -> Result<I, MappingError> {
        let wide = match *self {
            Self::Int(v) => v,
            Self::Float(v) => {
                if !v.is_finite() || v.fract() != 0.0 {
                    return Err(self.inexact(target));
                }
                // Saturates outside i128, which try_from below rejects.
                v as i128
            }
            Self::Decimal(v) => {
                if !v.is_integer() {
                    return Err(self.inexact(target));
                }
                v.trunc()
            }
        };

        I::try_from(wide).map_err(|_| MappingError::OutOfRange {
            value: self.describe(),
            target: target.to_string(),
        })
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
            Self::Decimal(v) => v.to_f64(),
        }
    }

    /// Narrow to `f32`. Finite values beyond the `f32` range are rejected
    /// instead of becoming infinities.
    fn to_f32(self, target: &str) -> Result<f32, MappingError> {
        let wide = self.to_f64();
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(MappingError::OutOfRange {
                value: self.describe(),
                target: target.to_string(),
            });
        }
        Ok(narrow)
    }

    fn to_decimal(self, precision: u8, scale: u8, target: &str) -> Result<DecimalValue, MappingError> {
        let out_of_range = || MappingError::OutOfRange {
            value: self.describe(),
            target: target.to_string(),
        };

        let decimal: DecimalValue = match self {
            Self::Int(v) => DecimalValue::from_integer(v),
            Self::Float(v) if v.is_finite() => v.to_string().parse().map_err(|_| out_of_range())?,
            Self::Float(_) => return Err(out_of_range()),
            Self::Decimal(v) => v,
        };

        let scaled = decimal.rescale(scale).ok_or_else(out_of_range)?;
        if scaled.total_digits() > u32::from(precision) {
            return Err(out_of_range());
        }
        Ok(scaled)
    }

    fn inexact(&self, target: &str) -> MappingError {
        MappingError::Inexact {
            value: self.describe(),
            target: target.to_string(),
        }
    }

    /// Encode for a numeric storage type.
    pub(crate) fn into_value(
        self,
        storage: StorageType,
        rust_type: &'static str,
    ) -> Result<Value, MappingError> {
        let target = storage.to_string();

        Ok(match storage {
            StorageType::Int8 => Value::Int8(self.integer(&target)?),
            StorageType::Uint8 => Value::Uint8(self.integer(&target)?),
            StorageType::Int16 => Value::Int16(self.integer(&target)?),
            StorageType::Uint16 => Value::Uint16(self.integer(&target)?),
            StorageType::Int32 => Value::Int32(self.integer(&target)?),
            StorageType::Uint32 => Value::Uint32(self.integer(&target)?),
            StorageType::Int64 => Value::Int64(self.integer(&target)?),
            StorageType::Uint64 => Value::Uint64(self.integer(&target)?),
            StorageType::Float => match self {
                Self::Int(v) if (v as f32) as i128 != v => return Err(self.inexact(&target)),
                _ => Value::Float(self.to_f32(&target)?),
            },
            StorageType::Double => match self {
                Self::Int(v) if (v as f64) as i128 != v => return Err(self.inexact(&target)),
                _ => Value::Double(self.to_f64()),
            },
            StorageType::Decimal { precision, scale } => {
                Value::Decimal(self.to_decimal(precision, scale, &target)?)
            }
            _ => return Err(MappingError::Unsupported { rust_type, storage }),
        })
    }
}

macro_rules! integer_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
                    Number::Int(i128::from(*self)).into_value(storage, stringify!($ty))
                }

                fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
                    Number::from_value(value, storage)?.integer(stringify!($ty))
                }
            }
        )*
    };
}

integer_column!(i8, u8, i16, u16, i32, u32, i64, u64);

impl ColumnValue for f32 {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        Number::Float(f64::from(*self)).into_value(storage, "f32")
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Float(v) => Ok(*v),
            other => Number::from_value(other, storage)?.to_f32("f32"),
        }
    }
}

impl ColumnValue for f64 {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        Number::Float(*self).into_value(storage, "f64")
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        Ok(Number::from_value(value, storage)?.to_f64())
    }
}

impl ColumnValue for Decimal {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        // rust_decimal scales never exceed 28.
        let decimal = u8::try_from(self.scale())
            .ok()
            .and_then(|scale| DecimalValue::new(self.mantissa(), scale))
            .ok_or_else(|| MappingError::OutOfRange {
                value: self.to_string(),
                target: storage.to_string(),
            })?;
        Number::Decimal(decimal).into_value(storage, "Decimal")
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        let number = Number::from_value(value, storage)?;
        let out_of_range = || MappingError::OutOfRange {
            value: number.describe(),
            target: "rust_decimal::Decimal".to_string(),
        };

        match number {
            Number::Int(v) => Decimal::try_from_i128_with_scale(v, 0).map_err(|_| out_of_range()),
            Number::Float(v) => Decimal::try_from(v).map_err(|_| out_of_range()),
            Number::Decimal(v) => Decimal::try_from_i128_with_scale(v.unscaled(), u32::from(v.scale()))
                .map_err(|_| out_of_range()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_integer_range_is_enforced() {
        assert_eq!(127i64.to_value(StorageType::Int8).unwrap(), Value::Int8(127));
        let err = 128i64.to_value(StorageType::Int8).unwrap_err();
        assert!(matches!(err, MappingError::OutOfRange { .. }));
        assert!((-1i32).to_value(StorageType::Uint32).is_err());
    }

    #[test]
    fn test_float_into_integer_storage() {
        assert_eq!(
            16_777_216f32.to_value(StorageType::Int32).unwrap(),
            Value::Int32(16_777_216)
        );
        assert!(matches!(
            0.5f32.to_value(StorageType::Int32).unwrap_err(),
            MappingError::Inexact { .. }
        ));
        assert!(f64::NAN.to_value(StorageType::Int64).is_err());
    }

    #[test]
    fn test_large_integer_into_double_must_be_exact() {
        assert!(i64::MAX.to_value(StorageType::Double).is_err());
        assert_eq!(
            (1i64 << 53).to_value(StorageType::Double).unwrap(),
            Value::Double(9_007_199_254_740_992.0)
        );
    }

    #[test]
    fn test_double_beyond_single_range_is_rejected() {
        for wide in [f64::MAX, 1e39, -1e39] {
            let err = wide.to_value(StorageType::Float).unwrap_err();
            assert!(matches!(err, MappingError::OutOfRange { .. }), "{:?}", err);
        }
        assert_eq!(
            f64::from(f32::MAX).to_value(StorageType::Float).unwrap(),
            Value::Float(f32::MAX)
        );
        assert_eq!(
            f64::INFINITY.to_value(StorageType::Float).unwrap(),
            Value::Float(f32::INFINITY)
        );

        let err = f32::from_value(&Value::Double(1e39), StorageType::Double).unwrap_err();
        assert!(matches!(err, MappingError::OutOfRange { .. }));
    }

    #[test]
    fn test_decimal_storage_rounds_and_checks_precision() {
        let storage = StorageType::Decimal {
            precision: 4,
            scale: 1,
        };
        let value = Decimal::from_str("12.35").unwrap().to_value(storage).unwrap();
        assert_eq!(value, Value::Decimal(DecimalValue::new(124, 1).unwrap()));

        assert!(Decimal::from_str("1000").unwrap().to_value(storage).is_err());
    }

    #[test]
    fn test_decimal_reads_back_numerically_equal() {
        let storage = StorageType::Decimal {
            precision: 22,
            scale: 9,
        };
        let written = Decimal::from_str("6251426433751.935439503").unwrap();
        let value = written.to_value(storage).unwrap();
        assert_eq!(Decimal::from_value(&value, storage).unwrap(), written);
    }

    #[test]
    fn test_f64_into_decimal() {
        let storage = StorageType::Decimal {
            precision: 10,
            scale: 2,
        };
        assert_eq!(
            1.5f64.to_value(storage).unwrap(),
            Value::Decimal(DecimalValue::new(150, 2).unwrap())
        );
        assert!(f64::INFINITY.to_value(storage).is_err());
    }
}
