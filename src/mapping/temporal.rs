//! Date, time and interval conversions.
//!
//! Storage units are coarser than chrono's nanoseconds: `Date` keeps days,
//! `Datetime` seconds, `Timestamp` and `Interval` microseconds. Instants are
//! floored to the storage unit, intervals are truncated toward zero. The
//! `truncate_*` helpers compute the value a column will hand back, for use in
//! expectation transforms.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use super::{unexpected, ColumnValue, MappingError};
use crate::types::StorageType;
use crate::value::{Value, MICROS_PER_DAY, SECONDS_PER_DAY};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days between the Unix epoch and `date`.
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Date `days` after the Unix epoch, if chrono can represent it.
pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Drop everything below whole seconds.
pub fn truncate_to_seconds(value: NaiveDateTime) -> NaiveDateTime {
    DateTime::from_timestamp(value.and_utc().timestamp(), 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(value)
}

/// Drop everything below whole microseconds.
pub fn truncate_to_micros(value: NaiveDateTime) -> NaiveDateTime {
    DateTime::from_timestamp_micros(value.and_utc().timestamp_micros())
        .map(|dt| dt.naive_utc())
        .unwrap_or(value)
}

/// Drop everything below whole microseconds, rounding toward zero.
pub fn truncate_interval(value: TimeDelta) -> TimeDelta {
    value
        .num_microseconds()
        .map(TimeDelta::microseconds)
        .unwrap_or(value)
}

fn out_of_range(value: impl std::fmt::Display, storage: StorageType) -> MappingError {
    MappingError::OutOfRange {
        value: value.to_string(),
        target: storage.to_string(),
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Decode any instant-like storage value into a UTC date-time.
fn instant_from_value(value: &Value, storage: StorageType) -> Result<NaiveDateTime, MappingError> {
    match value {
        Value::Date(days) => date_from_days(*days)
            .map(midnight)
            .ok_or_else(|| out_of_range(days, storage)),
        Value::Datetime(seconds) => DateTime::from_timestamp(*seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| out_of_range(seconds, storage)),
        Value::Timestamp(micros) => DateTime::from_timestamp_micros(*micros)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| out_of_range(micros, storage)),
        other => Err(unexpected(other, storage)),
    }
}

/// Encode an instant for an instant-like storage type.
fn instant_to_value(
    value: NaiveDateTime,
    storage: StorageType,
    rust_type: &'static str,
) -> Result<Value, MappingError> {
    let utc = value.and_utc();

    match storage {
        StorageType::Date | StorageType::Date32 => Ok(Value::Date(days_since_epoch(value.date()))),
        StorageType::Datetime | StorageType::Datetime64 => Ok(Value::Datetime(utc.timestamp())),
        StorageType::Timestamp | StorageType::Timestamp64 => Ok(Value::Timestamp(utc.timestamp_micros())),
        _ => Err(MappingError::Unsupported { rust_type, storage }),
    }
}

impl ColumnValue for NaiveDate {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        let days = i64::from(days_since_epoch(*self));

        match storage {
            StorageType::Date | StorageType::Date32 => Ok(Value::Date(days_since_epoch(*self))),
            StorageType::Datetime | StorageType::Datetime64 => {
                Ok(Value::Datetime(days * SECONDS_PER_DAY))
            }
            StorageType::Timestamp | StorageType::Timestamp64 => days
                .checked_mul(MICROS_PER_DAY)
                .map(Value::Timestamp)
                .ok_or_else(|| out_of_range(self, storage)),
            _ => Err(MappingError::Unsupported {
                rust_type: "NaiveDate",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        instant_from_value(value, storage).map(|dt| dt.date())
    }
}

impl ColumnValue for NaiveDateTime {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        instant_to_value(*self, storage, "NaiveDateTime")
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        instant_from_value(value, storage)
    }
}

impl ColumnValue for DateTime<Utc> {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        instant_to_value(self.naive_utc(), storage, "DateTime<Utc>")
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        instant_from_value(value, storage).map(|dt| dt.and_utc())
    }
}

impl ColumnValue for TimeDelta {
    fn to_value(&self, storage: StorageType) -> Result<Value, MappingError> {
        match storage {
            StorageType::Interval | StorageType::Interval64 => self
                .num_microseconds()
                .map(Value::Interval)
                .ok_or_else(|| out_of_range(self, storage)),
            _ => Err(MappingError::Unsupported {
                rust_type: "TimeDelta",
                storage,
            }),
        }
    }

    fn from_value(value: &Value, storage: StorageType) -> Result<Self, MappingError> {
        match value {
            Value::Interval(micros) => Ok(TimeDelta::microseconds(*micros)),
            other => Err(unexpected(other, storage)),
        }
    }
}
