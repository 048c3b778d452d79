//! Integer and boolean types.

use ydb_conformance::harness::HarnessError;
use ydb_conformance::{DataType, RoundTripCase, TypeDescriptor, WritePath};

use crate::common::{round_trip, run};

// ============================================================================
// Signed and unsigned bounds
// ============================================================================

#[tokio::test]
async fn test_sbyte_bounds() {
    let report = round_trip(RoundTripCase::new(DataType::SByte, -128i8, Some(127i8))).await;
    assert_eq!(report.parameter_count(WritePath::ParameterizedInsert), Some(2));
    assert_eq!(report.parameter_count(WritePath::LiteralInsert), Some(0));
}

#[tokio::test]
async fn test_byte_bounds() {
    round_trip(RoundTripCase::new(DataType::Byte, u8::MIN, Some(u8::MAX))).await;
}

#[tokio::test]
async fn test_int16_bounds() {
    round_trip(RoundTripCase::new(DataType::Int16, i16::MIN, Some(i16::MAX))).await;
}

#[tokio::test]
async fn test_uint16_bounds() {
    round_trip(RoundTripCase::new(DataType::UInt16, u16::MIN, Some(u16::MAX))).await;
}

#[tokio::test]
async fn test_int32_bounds() {
    round_trip(RoundTripCase::new(DataType::Int32, i32::MIN, Some(i32::MAX))).await;
}

#[tokio::test]
async fn test_uint32_bounds() {
    round_trip(RoundTripCase::new(DataType::UInt32, u32::MIN, Some(u32::MAX))).await;
}

#[tokio::test]
async fn test_int64_bounds() {
    round_trip(RoundTripCase::new(DataType::Int64, i64::MIN, Some(i64::MAX))).await;
}

#[tokio::test]
async fn test_uint64_bounds() {
    round_trip(RoundTripCase::new(DataType::UInt64, u64::MIN, Some(u64::MAX))).await;
}

// ============================================================================
// Cross-type mappings
// ============================================================================

#[tokio::test]
async fn test_narrow_rust_type_in_wide_column() {
    round_trip(RoundTripCase::new(DataType::Int64, i8::MIN, Some(i8::MAX))).await;
    round_trip(RoundTripCase::new(DataType::UInt32, u16::MAX, Some(0u16))).await;
}

#[tokio::test]
async fn test_wide_rust_type_in_narrow_column() {
    round_trip(RoundTripCase::new(DataType::SByte, -5i64, Some(5i64))).await;
}

#[tokio::test]
async fn test_wide_value_overflowing_narrow_column() {
    let err = run(RoundTripCase::new(DataType::SByte, 128i64, Some(0i64)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_negative_value_in_unsigned_column() {
    let err = run(RoundTripCase::new(DataType::UInt64, -1i32, Some(1i32)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_integer_in_double_column() {
    round_trip(RoundTripCase::new(DataType::Double, i32::MIN, Some(i32::MAX))).await;
}

// ============================================================================
// Booleans
// ============================================================================

#[tokio::test]
async fn test_boolean() {
    round_trip(RoundTripCase::new(DataType::Boolean, true, Some(false))).await;
}

#[tokio::test]
async fn test_boolean_in_byte_column() {
    round_trip(RoundTripCase::new(DataType::Byte, false, Some(true))).await;
}

// ============================================================================
// NULL samples
// ============================================================================

#[tokio::test]
async fn test_null_sample_skips_bulk_paths() {
    let report = run(RoundTripCase::new(DataType::Int32, 42i32, None::<i32>))
        .await
        .unwrap();
    assert_eq!(
        report.paths,
        vec![
            WritePath::InlineInsert,
            WritePath::ParameterizedInsert,
            WritePath::LiteralInsert,
        ]
    );
    // The NULL filter is `IS NULL` and binds nothing.
    assert_eq!(report.parameter_count(WritePath::ParameterizedInsert), Some(1));
}

#[tokio::test]
async fn test_typed_null_parameters_enable_bulk_paths() {
    let descriptor = TypeDescriptor::new(DataType::Int32).with_typed_null_parameters(true);
    let report = run(RoundTripCase::new(descriptor, 42i32, None::<i32>))
        .await
        .unwrap();
    assert!(report.verified(WritePath::BulkRowByRow));
    assert!(report.verified(WritePath::BulkBatch));
}
