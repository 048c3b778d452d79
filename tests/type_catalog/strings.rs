//! Text, binary, JSON and UUID types.

use uuid::Uuid;
use ydb_conformance::{DataType, Expectation, HarnessError, RoundTripCase, TypeDescriptor};

use crate::common::{round_trip, run};

// ============================================================================
// Utf8 and String
// ============================================================================

#[tokio::test]
async fn test_unicode_text() {
    round_trip(RoundTripCase::new(
        DataType::NVarChar,
        "Hello, YDB! Привет, мир".to_string(),
        Some("quote ' backslash \\ newline \n tab \t".to_string()),
    ))
    .await;
}

#[tokio::test]
async fn test_empty_text() {
    round_trip(RoundTripCase::new(
        DataType::NVarChar,
        String::new(),
        Some(String::new()),
    ))
    .await;
}

#[tokio::test]
async fn test_control_characters_in_text() {
    round_trip(RoundTripCase::new(
        DataType::NVarChar,
        "bell \u{7} nul \u{0} escape \u{1b}".to_string(),
        Some("\r\n".to_string()),
    ))
    .await;
}

#[tokio::test]
async fn test_text_with_length() {
    let descriptor = TypeDescriptor::new(DataType::NVarChar).with_length(64);
    round_trip(RoundTripCase::new(
        descriptor,
        "bounded".to_string(),
        Some("text".to_string()),
    ))
    .await;
}

#[tokio::test]
async fn test_length_on_numeric_type_is_rejected() {
    let descriptor = TypeDescriptor::new(DataType::Int32).with_length(4);
    let err = run(RoundTripCase::new(descriptor, 1i32, Some(2i32)))
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Descriptor(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_text_in_binary_column() {
    round_trip(RoundTripCase::new(
        DataType::Binary,
        "bytes on the wire: ёж".to_string(),
        Some("'".to_string()),
    ))
    .await;
}

#[tokio::test]
async fn test_single_characters() {
    round_trip(RoundTripCase::new(DataType::NVarChar, 'ы', Some('\''))).await;
    round_trip(RoundTripCase::new(DataType::VarBinary, 'a', Some('\\'))).await;
}

// ============================================================================
// Binary payloads
// ============================================================================

#[tokio::test]
async fn test_arbitrary_bytes() {
    round_trip(RoundTripCase::new(
        DataType::VarBinary,
        vec![0u8, 1, 2, 0x7f, 0x80, 0xff, b'\'', b'\\'],
        Some((0u8..=255).collect::<Vec<u8>>()),
    ))
    .await;
}

#[tokio::test]
async fn test_empty_bytes() {
    round_trip(RoundTripCase::new(DataType::Binary, Vec::<u8>::new(), Some(vec![0u8]))).await;
}

#[tokio::test]
async fn test_invalid_utf8_bytes_in_text_column() {
    let err = run(RoundTripCase::new(
        DataType::NVarChar,
        vec![0xffu8, 0xfe],
        Some(vec![b'a']),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

// ============================================================================
// JSON
// ============================================================================

#[tokio::test]
async fn test_json_text_is_kept_verbatim() {
    // JSON columns are not comparable, so reads are unfiltered.
    round_trip(
        RoundTripCase::new(
            DataType::Json,
            r#"{ "b": [1, 2, 3], "a": "x'y" }"#.to_string(),
            Some("null".to_string()),
        )
        .filter_by_value(false)
        .filter_by_nullable(false),
    )
    .await;
}

#[tokio::test]
async fn test_json_document_is_normalised() {
    let normalise = |v: &String| {
        serde_json::from_str::<serde_json::Value>(v)
            .unwrap()
            .to_string()
    };
    round_trip(
        RoundTripCase::new(
            DataType::BinaryJson,
            r#"{ "b": 1,   "a": {"z": null, "y": true} }"#.to_string(),
            Some("[1, 2.5, \"three\"]".to_string()),
        )
        .filter_by_value(false)
        .filter_by_nullable(false)
        .expect(Expectation::transform(normalise)),
    )
    .await;
}

#[tokio::test]
async fn test_json_document_as_structured_value() {
    round_trip(
        RoundTripCase::new(
            DataType::BinaryJson,
            serde_json::json!({"id": 1, "tags": ["a", "b"], "nested": {"ok": true}}),
            Some(serde_json::json!([])),
        )
        .filter_by_value(false)
        .filter_by_nullable(false),
    )
    .await;
}

#[tokio::test]
async fn test_invalid_json_is_rejected_on_encode() {
    let err = run(RoundTripCase::new(
        DataType::Json,
        "{not json".to_string(),
        Some("{}".to_string()),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::Encode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_json_equality_filter_is_rejected() {
    let err = run(RoundTripCase::new(
        DataType::Json,
        "{}".to_string(),
        Some("{}".to_string()),
    ))
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::Client { .. }), "got {:?}", err);
}

// ============================================================================
// UUID
// ============================================================================

#[tokio::test]
async fn test_uuid() {
    round_trip(RoundTripCase::new(
        DataType::Guid,
        Uuid::parse_str("6e73b41c-4ede-4d08-9cfb-b7462d9e498b").unwrap(),
        Some(Uuid::nil()),
    ))
    .await;
}

#[tokio::test]
async fn test_random_uuid() {
    round_trip(RoundTripCase::new(
        DataType::Guid,
        Uuid::new_v4(),
        Some(Uuid::from_u128(u128::MAX)),
    ))
    .await;
}

#[tokio::test]
async fn test_uuid_from_text() {
    let lowercase = |v: &String| v.to_lowercase();
    round_trip(
        RoundTripCase::new(
            DataType::Guid,
            "6E73B41C-4EDE-4D08-9CFB-B7462D9E498B".to_string(),
            Some("00000000-0000-0000-0000-000000000001".to_string()),
        )
        .expect(Expectation::transform(lowercase)),
    )
    .await;
}

#[tokio::test]
async fn test_uuid_in_text_column() {
    round_trip(RoundTripCase::new(
        DataType::NVarChar,
        Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap(),
        Some(Uuid::nil()),
    ))
    .await;
}
