//! Storage-level value model.
//!
//! [`Value`] is what travels between the client and the store: one variant per
//! value family, with the concrete [`StorageType`] of the column deciding
//! which range applies. Temporal values are kept in their wire units (days,
//! seconds, microseconds) relative to the Unix epoch.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::types::StorageType;

pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const MICROS_PER_DAY: i64 = SECONDS_PER_DAY * MICROS_PER_SECOND;

/// Number of days in the narrow temporal range `[1970-01-01, 2106-01-01)`.
pub const NARROW_RANGE_DAYS: i64 = 49_673;

const DATE32_MIN_DAYS: i64 = -53_375_809;
const DATE32_MAX_DAYS: i64 = 53_375_807;
const DATETIME64_MIN_SECONDS: i64 = -4_611_669_897_600;
const DATETIME64_MAX_SECONDS: i64 = 4_611_669_811_199;
const TIMESTAMP64_MIN_MICROS: i64 = -4_611_669_897_600_000_000;
const TIMESTAMP64_MAX_MICROS: i64 = 4_611_669_811_199_999_999;
const INTERVAL64_MAX_MICROS: i64 = 9_223_339_708_799_999_999;

/// A single column value as seen by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Decimal(DecimalValue),
    Bytes(Vec<u8>),
    Utf8(String),
    Json(String),
    JsonDocument(String),
    Uuid(Uuid),
    /// Days since the epoch (`Date`, `Date32`).
    Date(i32),
    /// Seconds since the epoch (`Datetime`, `Datetime64`).
    Datetime(i64),
    /// Microseconds since the epoch (`Timestamp`, `Timestamp64`).
    Timestamp(i64),
    /// Signed microseconds (`Interval`, `Interval64`).
    Interval(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value family, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int8(_) => "Int8",
            Self::Uint8(_) => "Uint8",
            Self::Int16(_) => "Int16",
            Self::Uint16(_) => "Uint16",
            Self::Int32(_) => "Int32",
            Self::Uint32(_) => "Uint32",
            Self::Int64(_) => "Int64",
            Self::Uint64(_) => "Uint64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::Decimal(_) => "Decimal",
            Self::Bytes(_) => "String",
            Self::Utf8(_) => "Utf8",
            Self::Json(_) => "Json",
            Self::JsonDocument(_) => "JsonDocument",
            Self::Uuid(_) => "Uuid",
            Self::Date(_) => "Date",
            Self::Datetime(_) => "Datetime",
            Self::Timestamp(_) => "Timestamp",
            Self::Interval(_) => "Interval",
        }
    }

    /// Whether this value's family can be stored in a column of `storage`.
    /// `Null` conforms to every storage type.
    pub fn conforms_to(&self, storage: StorageType) -> bool {
        use StorageType as S;

        matches!(
            (self, storage),
            (Self::Null, _)
                | (Self::Bool(_), S::Bool)
                | (Self::Int8(_), S::Int8)
                | (Self::Uint8(_), S::Uint8)
                | (Self::Int16(_), S::Int16)
                | (Self::Uint16(_), S::Uint16)
                | (Self::Int32(_), S::Int32)
                | (Self::Uint32(_), S::Uint32)
                | (Self::Int64(_), S::Int64)
                | (Self::Uint64(_), S::Uint64)
                | (Self::Float(_), S::Float)
                | (Self::Double(_), S::Double)
                | (Self::Decimal(_), S::Decimal { .. })
                | (Self::Bytes(_), S::String)
                | (Self::Utf8(_), S::Utf8)
                | (Self::Json(_), S::Json)
                | (Self::JsonDocument(_), S::JsonDocument)
                | (Self::Uuid(_), S::Uuid)
                | (Self::Date(_), S::Date | S::Date32)
                | (Self::Datetime(_), S::Datetime | S::Datetime64)
                | (Self::Timestamp(_), S::Timestamp | S::Timestamp64)
                | (Self::Interval(_), S::Interval | S::Interval64)
        )
    }

    /// Check that the value lies inside the representable range of `storage`.
    ///
    /// The value must already conform to `storage`; family mismatches are
    /// reported as out of range.
    pub fn check_bounds(&self, storage: StorageType) -> Result<(), RangeError> {
        if !self.conforms_to(storage) {
            return Err(RangeError::new(self, storage));
        }

        let in_range = match (self, storage) {
            (Self::Date(days), StorageType::Date) => {
                (0..NARROW_RANGE_DAYS).contains(&i64::from(*days))
            }
            (Self::Date(days), StorageType::Date32) => {
                (DATE32_MIN_DAYS..=DATE32_MAX_DAYS).contains(&i64::from(*days))
            }
            (Self::Datetime(seconds), StorageType::Datetime) => {
                (0..NARROW_RANGE_DAYS * SECONDS_PER_DAY).contains(seconds)
            }
            (Self::Datetime(seconds), StorageType::Datetime64) => {
                (DATETIME64_MIN_SECONDS..=DATETIME64_MAX_SECONDS).contains(seconds)
            }
            (Self::Timestamp(micros), StorageType::Timestamp) => {
                (0..NARROW_RANGE_DAYS * MICROS_PER_DAY).contains(micros)
            }
            (Self::Timestamp(micros), StorageType::Timestamp64) => {
                (TIMESTAMP64_MIN_MICROS..=TIMESTAMP64_MAX_MICROS).contains(micros)
            }
            (Self::Interval(micros), StorageType::Interval) => {
                micros.unsigned_abs() < (NARROW_RANGE_DAYS * MICROS_PER_DAY) as u64
            }
            (Self::Interval(micros), StorageType::Interval64) => {
                micros.unsigned_abs() <= INTERVAL64_MAX_MICROS as u64
            }
            (Self::Decimal(value), StorageType::Decimal { precision, scale }) => {
                value.scale() == scale && value.total_digits() <= u32::from(precision)
            }
            _ => true,
        };

        if in_range {
            Ok(())
        } else {
            Err(RangeError::new(self, storage))
        }
    }
}

/// A value that does not fit the range of its target storage type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{value} is out of range for {storage}")]
pub struct RangeError {
    pub value: String,
    pub storage: StorageType,
}

impl RangeError {
    fn new(value: &Value, storage: StorageType) -> Self {
        Self {
            value: format!("{:?}", value),
            storage,
        }
    }
}

/// Fixed-point decimal with a 128-bit unscaled integer, enough for
/// `Decimal(35, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    unscaled: i128,
    scale: u8,
}

/// Largest scale a [`DecimalValue`] can carry.
pub const MAX_DECIMAL_SCALE: u8 = 38;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("'{0}' is not a decimal number")]
    Syntax(String),

    #[error("'{0}' does not fit a 128-bit decimal")]
    Overflow(String),
}

impl DecimalValue {
    /// Returns `None` when `scale` exceeds [`MAX_DECIMAL_SCALE`].
    pub fn new(unscaled: i128, scale: u8) -> Option<Self> {
        (scale <= MAX_DECIMAL_SCALE).then_some(Self { unscaled, scale })
    }

    fn from_parts(unscaled: i128, scale: u8) -> Self {
        Self { unscaled, scale }
    }

    pub fn from_integer(value: i128) -> Self {
        Self::from_parts(value, 0)
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_integer(&self) -> bool {
        self.unscaled % pow10(self.scale) == 0
    }

    /// Integer part, truncated toward zero.
    pub fn trunc(&self) -> i128 {
        self.unscaled / pow10(self.scale)
    }

    /// Number of significant digits in the unscaled value.
    pub fn total_digits(&self) -> u32 {
        digit_count(self.unscaled.unsigned_abs())
    }

    /// Change the scale, rounding half away from zero when digits are dropped.
    ///
    /// Returns `None` if the result does not fit 128 bits.
    pub fn rescale(&self, scale: u8) -> Option<Self> {
        if scale > MAX_DECIMAL_SCALE {
            return None;
        }

        if scale >= self.scale {
            let factor = checked_pow10(scale - self.scale)?;
            return Some(Self::from_parts(self.unscaled.checked_mul(factor)?, scale));
        }

        let divisor = pow10(self.scale - scale);
        let quotient = self.unscaled / divisor;
        let remainder = (self.unscaled % divisor).unsigned_abs();
        let half = divisor.unsigned_abs() / 2;

        let rounded = if remainder >= half && remainder > 0 {
            quotient + self.unscaled.signum()
        } else {
            quotient
        };

        Some(Self::from_parts(rounded, scale))
    }

    /// Change the scale only if no digits are lost.
    pub fn rescale_exact(&self, scale: u8) -> Option<Self> {
        let rescaled = self.rescale(scale)?;
        let back = rescaled.rescale(self.scale)?;
        (back == *self).then_some(rescaled)
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl FromStr for DecimalValue {
    type Err = DecimalError;

    /// Parse `[+-]digits[.digits]`. Exponents are not accepted.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let syntax = || DecimalError::Syntax(text.to_string());
        let overflow = || DecimalError::Overflow(text.to_string());

        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (body, ""),
        };

        if int_part.is_empty()
            || (body.contains('.') && frac_part.is_empty())
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(syntax());
        }

        let scale = u8::try_from(frac_part.len()).map_err(|_| overflow())?;
        if scale > MAX_DECIMAL_SCALE {
            return Err(overflow());
        }

        let mut unscaled: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(digit - b'0')))
                .ok_or_else(overflow)?;
        }

        Ok(Self::from_parts(if negative { -unscaled } else { unscaled }, scale))
    }
}

impl fmt::Display for DecimalValue {
    /// Formats with exactly `scale` fractional digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = usize::from(self.scale);

        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }

        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

fn pow10(exp: u8) -> i128 {
    10i128.pow(u32::from(exp))
}

fn checked_pow10(exp: u8) -> Option<i128> {
    10i128.checked_pow(u32::from(exp))
}

fn digit_count(mut value: u128) -> u32 {
    let mut digits = 0;
    while value > 0 {
        digits += 1;
        value /= 10;
    }
    digits
}
