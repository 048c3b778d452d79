//! Date, datetime, timestamp and interval types, narrow and extended.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use ydb_conformance::client::ClientError;
use ydb_conformance::mapping::temporal::{
    date_from_days, truncate_interval, truncate_to_micros, truncate_to_seconds,
};
use ydb_conformance::types::DescriptorError;
use ydb_conformance::{
    DataType, Expectation, HarnessError, RoundTripCase, TypeDescriptor, WritePath,
};

use crate::common::{round_trip, run};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn datetime(text: &str) -> NaiveDateTime {
    let format = if text.contains('.') {
        "%Y-%m-%d %H:%M:%S%.f"
    } else {
        "%Y-%m-%d %H:%M:%S"
    };
    NaiveDateTime::parse_from_str(text, format).unwrap()
}

fn from_seconds(seconds: i64) -> NaiveDateTime {
    DateTime::from_timestamp(seconds, 0).unwrap().naive_utc()
}

fn from_micros(micros: i64) -> NaiveDateTime {
    DateTime::from_timestamp_micros(micros).unwrap().naive_utc()
}

fn assert_out_of_range(err: HarnessError) {
    match err {
        HarnessError::Client {
            path: WritePath::InlineInsert,
            source: ClientError::OutOfRange { .. },
        } => {}
        other => panic!("expected an out-of-range insert, got {:?}", other),
    }
}

// ============================================================================
// Date / Date32
// ============================================================================

#[tokio::test]
async fn test_date_bounds() {
    round_trip(RoundTripCase::new(
        DataType::Date,
        date(1970, 1, 1),
        Some(date(2105, 12, 31)),
    ))
    .await;
}

#[tokio::test]
async fn test_date_leap_day() {
    round_trip(RoundTripCase::new(
        DataType::Date,
        date(2020, 2, 29),
        Some(date(2000, 2, 29)),
    ))
    .await;
}

#[tokio::test]
async fn test_date_before_epoch_is_out_of_range() {
    let err = run(RoundTripCase::new(
        DataType::Date,
        date(1969, 12, 31),
        Some(date(1970, 1, 1)),
    ))
    .await
    .unwrap_err();
    assert_out_of_range(err);
}

#[tokio::test]
async fn test_date_after_2105_is_out_of_range() {
    let err = run(RoundTripCase::new(
        DataType::Date,
        date(2106, 1, 1),
        Some(date(1970, 1, 1)),
    ))
    .await
    .unwrap_err();
    assert_out_of_range(err);
}

#[tokio::test]
async fn test_date32_bounds() {
    let descriptor = TypeDescriptor::new(DataType::Date).with_storage("Date32");
    round_trip(RoundTripCase::new(
        descriptor,
        date_from_days(-53_375_809).unwrap(),
        Some(date_from_days(53_375_807).unwrap()),
    ))
    .await;
}

#[tokio::test]
async fn test_date32_before_epoch() {
    let descriptor = TypeDescriptor::new(DataType::Date).with_storage("date32");
    round_trip(RoundTripCase::new(
        descriptor,
        date(1, 1, 1),
        Some(date(1969, 12, 31)),
    ))
    .await;
}

#[tokio::test]
async fn test_date_column_drops_time_of_day() {
    let midnight = |v: &NaiveDateTime| v.date().and_time(NaiveTime::MIN);
    round_trip(
        RoundTripCase::new(
            DataType::Date,
            datetime("2020-02-29 17:54:55.123"),
            Some(datetime("1999-12-31 23:59:59")),
        )
        .expect(Expectation::transform(midnight)),
    )
    .await;
}

// ============================================================================
// Datetime / Datetime64
// ============================================================================

#[tokio::test]
async fn test_datetime_truncates_to_seconds() {
    round_trip(
        RoundTripCase::new(
            DataType::DateTime,
            datetime("2020-02-29 17:54:55.1231234"),
            Some(datetime("2105-12-31 23:59:59.999999999")),
        )
        .expect(Expectation::transform(|v: &NaiveDateTime| truncate_to_seconds(*v))),
    )
    .await;
}

#[tokio::test]
async fn test_datetime_accepts_whole_dates() {
    round_trip(RoundTripCase::new(
        DataType::DateTime,
        date(1970, 1, 1),
        Some(date(2105, 12, 31)),
    ))
    .await;
}

#[tokio::test]
async fn test_datetime64_before_epoch() {
    let descriptor = TypeDescriptor::new(DataType::DateTime).with_storage("Datetime64");
    round_trip(
        RoundTripCase::new(
            descriptor,
            datetime("1900-01-01 00:00:00.5"),
            Some(datetime("1969-12-31 23:59:59.999")),
        )
        .expect(Expectation::transform(|v: &NaiveDateTime| truncate_to_seconds(*v))),
    )
    .await;
}

#[tokio::test]
async fn test_datetime64_bounds() {
    let descriptor = TypeDescriptor::new(DataType::DateTime).with_storage("Datetime64");
    round_trip(RoundTripCase::new(
        descriptor,
        from_seconds(-4_611_669_897_600),
        Some(from_seconds(4_611_669_811_199)),
    ))
    .await;
}

#[tokio::test]
async fn test_datetime_before_epoch_is_out_of_range() {
    let err = run(RoundTripCase::new(
        DataType::DateTime,
        datetime("1969-12-31 23:59:59"),
        Some(datetime("1970-01-01 00:00:00")),
    ))
    .await
    .unwrap_err();
    assert_out_of_range(err);
}

// ============================================================================
// Timestamp / Timestamp64
// ============================================================================

#[tokio::test]
async fn test_timestamp_truncates_to_microseconds() {
    let truncate = |v: &DateTime<Utc>| truncate_to_micros(v.naive_utc()).and_utc();
    round_trip(
        RoundTripCase::new(
            DataType::Timestamp,
            datetime("2020-02-29 17:54:55.1231234").and_utc(),
            Some(datetime("1970-01-01 00:00:00.000000999").and_utc()),
        )
        .expect(Expectation::transform(truncate)),
    )
    .await;
}

#[tokio::test]
async fn test_timestamp_bounds() {
    round_trip(RoundTripCase::new(
        DataType::DateTime2,
        from_micros(0),
        Some(from_micros(49_673 * 86_400 * 1_000_000 - 1)),
    ))
    .await;
}

#[tokio::test]
async fn test_timestamp64_before_epoch() {
    let descriptor = TypeDescriptor::new(DataType::Timestamp).with_storage("Timestamp64");
    round_trip(
        RoundTripCase::new(
            descriptor,
            datetime("1800-06-15 12:30:45.123456789"),
            Some(datetime("1969-12-31 23:59:59.9999999")),
        )
        .expect(Expectation::transform(|v: &NaiveDateTime| truncate_to_micros(*v))),
    )
    .await;
}

#[tokio::test]
async fn test_timestamp64_bounds() {
    let descriptor = TypeDescriptor::new(DataType::DateTime).with_storage("Timestamp64");
    round_trip(RoundTripCase::new(
        descriptor,
        from_micros(-4_611_669_897_600_000_000),
        Some(from_micros(4_611_669_811_199_999_999)),
    ))
    .await;
}

// ============================================================================
// Interval / Interval64
// ============================================================================

#[tokio::test]
async fn test_interval_truncates_toward_zero() {
    round_trip(
        RoundTripCase::new(
            DataType::Interval,
            TimeDelta::days(49_672) + TimeDelta::nanoseconds(999),
            Some(-TimeDelta::days(49_672) - TimeDelta::nanoseconds(999)),
        )
        .expect(Expectation::transform(|v: &TimeDelta| truncate_interval(*v))),
    )
    .await;
}

#[tokio::test]
async fn test_interval_bounds() {
    let max = TimeDelta::days(49_673) - TimeDelta::microseconds(1);
    round_trip(RoundTripCase::new(DataType::Interval, -max, Some(max))).await;
}

#[tokio::test]
async fn test_zero_interval() {
    round_trip(RoundTripCase::new(
        DataType::Interval,
        TimeDelta::zero(),
        Some(TimeDelta::microseconds(1)),
    ))
    .await;
}

#[tokio::test]
async fn test_interval_out_of_range() {
    let err = run(RoundTripCase::new(
        DataType::Interval,
        TimeDelta::days(49_673),
        Some(TimeDelta::zero()),
    ))
    .await
    .unwrap_err();
    assert_out_of_range(err);
}

#[tokio::test]
async fn test_interval64_bounds() {
    let descriptor = TypeDescriptor::new(DataType::Interval).with_storage("Interval64");
    let max = TimeDelta::microseconds(9_223_339_708_799_999_999);
    round_trip(RoundTripCase::new(descriptor, -max, Some(max))).await;
}

#[tokio::test]
async fn test_interval64_beyond_narrow_range() {
    let descriptor = TypeDescriptor::new(DataType::Interval).with_storage("Interval64");
    round_trip(RoundTripCase::new(
        descriptor,
        TimeDelta::days(1_000_000),
        Some(TimeDelta::days(-1_000_000) + TimeDelta::microseconds(5)),
    ))
    .await;
}

// ============================================================================
// Storage overrides
// ============================================================================

#[tokio::test]
async fn test_incompatible_override_is_rejected() {
    let descriptor = TypeDescriptor::new(DataType::Date).with_storage("Timestamp");
    let err = run(RoundTripCase::new(descriptor, date(2000, 1, 1), Some(date(2000, 1, 1))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Descriptor(DescriptorError::IncompatibleStorageType { .. })
    ));
}

#[tokio::test]
async fn test_unknown_override_is_rejected() {
    let descriptor = TypeDescriptor::new(DataType::Date).with_storage("Date128");
    let err = run(RoundTripCase::new(descriptor, date(2000, 1, 1), Some(date(2000, 1, 1))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Descriptor(DescriptorError::UnknownStorageType(_))
    ));
}
