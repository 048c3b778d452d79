//! Single and double precision floating point types.

use ydb_conformance::{DataType, Expectation, HarnessError, RoundTripCase, WritePath};

use crate::common::{round_trip, run};

// ============================================================================
// Finite values
// ============================================================================

#[tokio::test]
async fn test_single() {
    round_trip(RoundTripCase::new(DataType::Single, 1.5f32, Some(-0.1f32))).await;
}

#[tokio::test]
async fn test_single_bounds() {
    round_trip(RoundTripCase::new(DataType::Single, f32::MIN, Some(f32::MAX))).await;
    round_trip(RoundTripCase::new(
        DataType::Single,
        f32::MIN_POSITIVE,
        Some(f32::EPSILON),
    ))
    .await;
}

#[tokio::test]
async fn test_double() {
    round_trip(RoundTripCase::new(DataType::Double, 0.1f64, Some(-1e308f64))).await;
}

#[tokio::test]
async fn test_double_bounds() {
    round_trip(RoundTripCase::new(DataType::Double, f64::MIN, Some(f64::MAX))).await;
}

// ============================================================================
// Cross-precision mappings
// ============================================================================

#[tokio::test]
async fn test_single_in_double_column() {
    round_trip(RoundTripCase::new(DataType::Double, 0.1f32, Some(f32::MAX))).await;
}

#[tokio::test]
async fn test_double_in_single_column_loses_precision() {
    let narrow = |v: &f64| *v as f32 as f64;
    round_trip(
        RoundTripCase::new(DataType::Single, 0.1f64, Some(1.0f64 / 3.0))
            .expect(Expectation::transform(narrow)),
    )
    .await;
}

#[tokio::test]
async fn test_double_beyond_single_range_fails_to_encode() {
    let err = run(RoundTripCase::new(DataType::Single, f64::MAX, Some(0.0f64)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);

    let err = run(RoundTripCase::new(DataType::Single, 0.0f64, Some(-1e39f64)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_whole_float_in_integer_column() {
    round_trip(RoundTripCase::new(DataType::Int32, 16_777_216f32, Some(-1f32))).await;
}

// ============================================================================
// Special values
// ============================================================================

#[tokio::test]
async fn test_single_infinities() {
    round_trip(RoundTripCase::new(
        DataType::Single,
        f32::NEG_INFINITY,
        Some(f32::INFINITY),
    ))
    .await;
}

#[tokio::test]
async fn test_double_nan_cannot_be_filtered_by_equality() {
    // NaN never equals itself, so the value column is read unfiltered.
    let report = round_trip(
        RoundTripCase::new(DataType::Double, f64::NAN, Some(f64::INFINITY))
            .filter_by_value(false)
            .expect_value(Expectation::predicate(|v: &f64| v.is_nan())),
    )
    .await;
    assert_eq!(report.parameter_count(WritePath::ParameterizedInsert), Some(1));
}

#[tokio::test]
async fn test_single_nan_in_both_columns() {
    let is_nan = Expectation::predicate(|v: &f32| v.is_nan());
    let report = round_trip(
        RoundTripCase::new(DataType::Single, f32::NAN, Some(f32::NAN))
            .filter_by_value(false)
            .filter_by_nullable(false)
            .expect(is_nan),
    )
    .await;
    assert_eq!(report.parameter_count(WritePath::ParameterizedInsert), Some(0));
}

#[tokio::test]
async fn test_negative_zero() {
    // -0.0 == 0.0, so both the filter and the comparison accept it.
    round_trip(RoundTripCase::new(DataType::Double, -0.0f64, Some(0.0f64))).await;
}
