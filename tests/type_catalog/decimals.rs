//! Decimal types: default and explicit precision/scale, rounding, and
//! string-typed decimals.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use ydb_conformance::types::DescriptorError;
use ydb_conformance::{DataType, Expectation, HarnessError, RoundTripCase, TypeDescriptor};

use crate::common::{round_trip, run};

fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

fn decimal(precision: u8, scale: u8) -> TypeDescriptor {
    TypeDescriptor::new(DataType::Decimal)
        .with_precision(precision)
        .with_scale(scale)
}

// ============================================================================
// Default Decimal(22, 9)
// ============================================================================

#[tokio::test]
async fn test_default_precision() {
    round_trip(RoundTripCase::new(
        DataType::Decimal,
        dec("6251426433751.935439503"),
        Some(dec("-0.000000001")),
    ))
    .await;
}

#[tokio::test]
async fn test_default_precision_bounds() {
    round_trip(RoundTripCase::new(
        DataType::Decimal,
        dec("9999999999999.999999999"),
        Some(dec("-9999999999999.999999999")),
    ))
    .await;
}

#[tokio::test]
async fn test_integer_part_too_wide_for_default_precision() {
    let err = run(RoundTripCase::new(
        DataType::Decimal,
        dec("10000000000000"),
        Some(dec("0")),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

// ============================================================================
// Explicit precision and scale
// ============================================================================

#[tokio::test]
async fn test_precision_and_scale_sweep() {
    for (precision, scale, value) in [
        (1, 0, "9"),
        (5, 2, "999.99"),
        (10, 10, "0.9999999999"),
        (28, 14, "-12345678901234.56789012345678"),
    ] {
        round_trip(RoundTripCase::new(
            decimal(precision, scale),
            dec(value),
            Some(dec("0")),
        ))
        .await;
    }
}

#[tokio::test]
async fn test_extra_fraction_digits_round_half_away_from_zero() {
    let round = |v: &Decimal| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    round_trip(
        RoundTripCase::new(decimal(5, 2), dec("123.455"), Some(dec("-123.455")))
            .expect(Expectation::transform(round)),
    )
    .await;
}

#[tokio::test]
async fn test_precision_without_scale_is_integral() {
    let round = |v: &Decimal| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    round_trip(
        RoundTripCase::new(
            TypeDescriptor::new(DataType::Decimal).with_precision(10),
            dec("1234567890"),
            Some(dec("2.5")),
        )
        .expect(Expectation::transform(round)),
    )
    .await;
}

#[tokio::test]
async fn test_integer_rust_type_in_decimal_column() {
    round_trip(RoundTripCase::new(decimal(20, 0), i64::MIN, Some(u32::MAX as i64))).await;
}

// ============================================================================
// String-typed decimals
// ============================================================================

#[tokio::test]
async fn test_string_decimal_reads_back_with_full_scale() {
    let pad = |v: &String| format!("{}.000000000", v);
    round_trip(
        RoundTripCase::new(DataType::Decimal, "1".to_string(), Some("-42".to_string()))
            .expect(Expectation::transform(pad)),
    )
    .await;
}

#[tokio::test]
async fn test_string_decimal_at_maximum_precision() {
    let max = "9".repeat(35);
    round_trip(RoundTripCase::new(
        decimal(35, 0),
        max.clone(),
        Some(format!("-{}", max)),
    ))
    .await;

    let fraction = format!("0.{}", "9".repeat(35));
    round_trip(RoundTripCase::new(decimal(35, 35), fraction.clone(), Some(fraction))).await;
}

#[tokio::test]
async fn test_malformed_string_decimal() {
    let err = run(RoundTripCase::new(
        DataType::Decimal,
        "1e5".to_string(),
        Some("1".to_string()),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

// ============================================================================
// Configuration errors
// ============================================================================

#[tokio::test]
async fn test_invalid_descriptors_fail_before_any_io() {
    let cases = [
        TypeDescriptor::new(DataType::Int32).with_precision(5),
        decimal(5, 6),
        TypeDescriptor::new(DataType::Decimal).with_scale(2),
        decimal(36, 0),
    ];

    for descriptor in cases {
        let err = run(RoundTripCase::new(descriptor, dec("1"), Some(dec("1"))))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::Descriptor(_)), "got {:?}", err);
    }
}

#[tokio::test]
async fn test_precision_on_non_decimal_is_reported() {
    let err = run(RoundTripCase::new(
        TypeDescriptor::new(DataType::Double).with_precision(5).with_scale(2),
        1.0f64,
        Some(1.0f64),
    ))
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Descriptor(DescriptorError::PrecisionNotSupported { .. })
    ));
}
