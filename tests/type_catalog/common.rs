//! Shared helpers for the type catalog tests.

use std::sync::Arc;

use ydb_conformance::{
    ColumnValue, HarnessConfig, HarnessError, MemoryConnectionFactory, RoundTripCase,
    RoundTripHarness, RunReport, WritePath,
};

/// Every path a case with a non-NULL nullable sample and parameters enabled
/// goes through, in order.
pub const ALL_PATHS: [WritePath; 5] = [
    WritePath::InlineInsert,
    WritePath::ParameterizedInsert,
    WritePath::LiteralInsert,
    WritePath::BulkRowByRow,
    WritePath::BulkBatch,
];

/// Fresh store and a harness over it.
pub fn harness() -> (RoundTripHarness, MemoryConnectionFactory) {
    let factory = MemoryConnectionFactory::new();
    let harness = RoundTripHarness::new(Arc::new(factory.clone()), HarnessConfig::default());
    (harness, factory)
}

/// Run a case on a fresh store, asserting the table is gone afterwards.
pub async fn run<T, N>(case: RoundTripCase<T, N>) -> Result<RunReport, HarnessError>
where
    T: ColumnValue,
    N: ColumnValue,
{
    let (harness, factory) = harness();
    let result = harness.run(case).await;
    assert!(
        factory.table_names().is_empty(),
        "tables left behind: {:?}",
        factory.table_names()
    );
    result
}

/// Run a case that must pass every path.
pub async fn round_trip<T, N>(case: RoundTripCase<T, N>) -> RunReport
where
    T: ColumnValue,
    N: ColumnValue,
{
    let report = run(case).await.unwrap_or_else(|e| panic!("round trip failed: {}", e));
    assert_eq!(report.paths, ALL_PATHS.to_vec());
    report
}
