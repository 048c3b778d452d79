use crate::client::BulkCopyType;
use crate::hints::HintDirective;
use crate::types::TypeDescriptor;

use super::expect::Expectation;

/// One conformance case: a descriptor, the sample pair and the knobs that
/// adjust how the round trip is verified.
#[derive(Debug, Clone)]
pub struct RoundTripCase<T, N = T> {
    pub(crate) descriptor: TypeDescriptor,
    pub(crate) value: T,
    pub(crate) nullable: Option<N>,
    pub(crate) filter_by_value: bool,
    pub(crate) filter_by_nullable: bool,
    pub(crate) skip_nullable: bool,
    pub(crate) test_parameters: Option<bool>,
    pub(crate) bulk_row_by_row: bool,
    pub(crate) bulk_multiple_rows: bool,
    pub(crate) expect_value: Expectation<T>,
    pub(crate) expect_nullable: Expectation<N>,
    pub(crate) hints: Vec<HintDirective>,
}

impl<T, N> RoundTripCase<T, N> {
    pub fn new(descriptor: impl Into<TypeDescriptor>, value: T, nullable: Option<N>) -> Self {
        Self {
            descriptor: descriptor.into(),
            value,
            nullable,
            filter_by_value: true,
            filter_by_nullable: true,
            skip_nullable: false,
            test_parameters: None,
            bulk_row_by_row: true,
            bulk_multiple_rows: true,
            expect_value: Expectation::Exact,
            expect_nullable: Expectation::Exact,
            hints: Vec::new(),
        }
    }

    /// Filter reads by equality on the `Value` column.
    pub fn filter_by_value(mut self, enabled: bool) -> Self {
        self.filter_by_value = enabled;
        self
    }

    /// Filter reads on the `ValueNullable` column (`IS NULL` for a NULL
    /// sample).
    pub fn filter_by_nullable(mut self, enabled: bool) -> Self {
        self.filter_by_nullable = enabled;
        self
    }

    /// Bind the table without the `ValueNullable` column.
    pub fn skip_nullable(mut self, skip: bool) -> Self {
        self.skip_nullable = skip;
        self
    }

    /// Override the suite default for the bound-parameter cycle.
    pub fn test_parameters(mut self, enabled: bool) -> Self {
        self.test_parameters = Some(enabled);
        self
    }

    /// Opt a bulk mode out of the case.
    pub fn skip_bulk(mut self, kind: BulkCopyType) -> Self {
        match kind {
            BulkCopyType::RowByRow => self.bulk_row_by_row = false,
            BulkCopyType::MultipleRows => self.bulk_multiple_rows = false,
        }
        self
    }

    pub fn expect_value(mut self, expectation: Expectation<T>) -> Self {
        self.expect_value = expectation;
        self
    }

    pub fn expect_nullable(mut self, expectation: Expectation<N>) -> Self {
        self.expect_nullable = expectation;
        self
    }

    /// Hints attached to every verification read.
    pub fn with_hints(mut self, hints: Vec<HintDirective>) -> Self {
        self.hints = hints;
        self
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub(crate) fn bulk_enabled(&self, kind: BulkCopyType) -> bool {
        match kind {
            BulkCopyType::RowByRow => self.bulk_row_by_row,
            BulkCopyType::MultipleRows => self.bulk_multiple_rows,
        }
    }

    /// Bulk writes need every value to carry a type: either the nullable
    /// sample is present or NULL parameters are declared with their type.
    pub(crate) fn bulk_possible(&self) -> bool {
        self.nullable.is_some() || self.descriptor.typed_null_parameters()
    }
}

impl<T> RoundTripCase<T, T> {
    /// Apply the same expectation to both value columns.
    pub fn expect(self, expectation: Expectation<T>) -> Self {
        let nullable = expectation.clone();
        self.expect_value(expectation).expect_nullable(nullable)
    }
}
