//! Round-trip conformance harness.
//!
//! A case binds a two-column table for one type descriptor, writes a single
//! row and verifies it through every write path the client offers:
//!
//! 1. bind the schema and create the table;
//! 2. insert the row with inline literals;
//! 3. read it back through bound parameters (when parameter testing is on),
//!    checking the number of bound parameters;
//! 4. read it back with forced literals, checking no parameter was bound;
//! 5. keep literals for the rest of the case if parameter testing is off;
//! 6. rewrite the row with each enabled bulk mode and read it back;
//! 7. drop the table, whatever happened before.
//!
//! The first failing check aborts the case. Cleanup failures are logged and
//! never replace the original error.

mod case;
mod error;
mod expect;
mod table;

use std::slice;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::client::{
    BulkCopyOptions, BulkCopyType, ClientError, CommandInterceptor, Connection, ConnectionFactory,
    SelectOptions,
};
use crate::config::HarnessConfig;
use crate::mapping::ColumnValue;
use crate::schema::{bind, TableMapping, TestRow, NULLABLE_COLUMN, VALUE_COLUMN};
use crate::sql::{Command, Condition};
use crate::value::Value;

pub use case::RoundTripCase;
pub use error::{HarnessError, WritePath};
pub use expect::Expectation;

use table::TableLease;

/// Paths verified by a successful case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Verified paths in execution order.
    pub paths: Vec<WritePath>,
    /// Bound-parameter counts observed by the checked reads.
    pub parameter_counts: Vec<(WritePath, usize)>,
}

impl RunReport {
    pub fn verified(&self, path: WritePath) -> bool {
        self.paths.contains(&path)
    }

    pub fn parameter_count(&self, path: WritePath) -> Option<usize> {
        self.parameter_counts
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, count)| *count)
    }
}

/// Records the parameter count of every command it observes.
#[derive(Default)]
struct ParameterCapture {
    counts: Mutex<Vec<usize>>,
}

impl ParameterCapture {
    fn observed(&self) -> Vec<usize> {
        self.counts
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }
}

impl CommandInterceptor for ParameterCapture {
    fn command_initialized(&self, command: &Command) {
        if let Ok(mut counts) = self.counts.lock() {
            counts.push(command.parameters().len());
        }
    }
}

/// Runs conformance cases against connections from one factory.
#[derive(Clone)]
pub struct RoundTripHarness {
    factory: Arc<dyn ConnectionFactory>,
    config: HarnessConfig,
}

impl RoundTripHarness {
    pub fn new(factory: Arc<dyn ConnectionFactory>, config: HarnessConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run one case to completion.
    #[tracing::instrument(
        name = "round_trip",
        skip(self, case),
        fields(
            ydb.table = tracing::field::Empty,
            ydb.storage = tracing::field::Empty,
            ydb.paths_verified = tracing::field::Empty,
        )
    )]
    pub async fn run<T, N>(&self, case: RoundTripCase<T, N>) -> Result<RunReport, HarnessError>
    where
        T: ColumnValue,
        N: ColumnValue,
    {
        let table = TestRow::<T, N>::table_name();
        let mapping = bind(table.as_str(), &case.descriptor, case.skip_nullable)?;
        tracing::Span::current()
            .record("ydb.table", table.as_str())
            .record("ydb.storage", tracing::field::display(mapping.value_storage()));

        let row = TestRow::new(case.value.clone(), case.nullable.clone());
        let encoded = row.encode(&mapping).map_err(HarnessError::Encode)?;
        let test_parameters = case.test_parameters.unwrap_or(self.config.test_parameters);

        let mut connection = self
            .factory
            .open(&self.config.connection)
            .await
            .map_err(HarnessError::Setup)?;
        connection.add_mapping(mapping.clone());

        // From here on the lease drops the table on every exit path.
        let mut lease = TableLease::new(connection, table);
        lease
            .create_table(mapping.table())
            .map_err(HarnessError::Setup)?;
        debug!(table = %lease.table(), "created conformance table");

        let mut run = CaseRun {
            case: &case,
            mapping: &mapping,
            encoded: &encoded,
            test_parameters,
            report: RunReport::default(),
        };
        run.execute(&mut *lease)?;

        tracing::Span::current().record("ydb.paths_verified", run.report.paths.len());
        info!(
            table = %mapping.table(),
            paths = run.report.paths.len(),
            "round trip verified"
        );
        Ok(run.report)
    }
}

/// State of one case between table creation and cleanup.
struct CaseRun<'a, T, N> {
    case: &'a RoundTripCase<T, N>,
    mapping: &'a TableMapping,
    encoded: &'a [Value],
    test_parameters: bool,
    report: RunReport,
}

impl<T: ColumnValue, N: ColumnValue> CaseRun<'_, T, N> {
    fn execute(&mut self, connection: &mut dyn Connection) -> Result<(), HarnessError> {
        let mapping = self.mapping;
        let table = mapping.table();
        let row = self.encoded.to_vec();

        // Literal writes first, so a binding defect cannot block the others.
        connection.set_inline_parameters(true);
        let inserted = connection
            .insert(table, &row)
            .map_err(client(WritePath::InlineInsert))?;
        if inserted != 1 {
            return Err(HarnessError::RowCount {
                path: WritePath::InlineInsert,
                expected: 1,
                actual: inserted as usize,
            });
        }
        self.report.paths.push(WritePath::InlineInsert);

        if self.test_parameters {
            connection.set_inline_parameters(false);
            let expected = self.expected_parameters();
            self.verify(connection, WritePath::ParameterizedInsert, Some(expected))?;
        }

        connection.set_inline_parameters(true);
        self.verify(connection, WritePath::LiteralInsert, Some(0))?;

        connection.set_inline_parameters(!self.test_parameters);

        if !self.case.bulk_possible() {
            debug!(table = %table, "bulk paths skipped for untyped NULL sample");
            return Ok(());
        }

        for (kind, path) in [
            (BulkCopyType::RowByRow, WritePath::BulkRowByRow),
            (BulkCopyType::MultipleRows, WritePath::BulkBatch),
        ] {
            if !self.case.bulk_enabled(kind) {
                continue;
            }

            connection.delete_all(table).map_err(client(path))?;
            let result = connection
                .bulk_copy(
                    table,
                    slice::from_ref(&row),
                    BulkCopyOptions {
                        kind,
                        use_parameters: self.test_parameters,
                    },
                )
                .map_err(client(path))?;
            if result.rows_copied != 1 {
                return Err(HarnessError::RowCount {
                    path,
                    expected: 1,
                    actual: result.rows_copied as usize,
                });
            }
            self.verify(connection, path, None)?;
        }

        Ok(())
    }

    /// Bound parameters a parameterized read must carry. A NULL nullable
    /// sample is filtered with `IS NULL` and binds nothing.
    fn expected_parameters(&self) -> usize {
        let value = self.case.filter_by_value as usize;
        let nullable = (self.case.filter_by_nullable
            && self.mapping.has_nullable_column()
            && self.case.nullable.is_some()) as usize;
        value + nullable
    }

    fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        for (enabled, column) in [
            (self.case.filter_by_value, VALUE_COLUMN),
            (self.case.filter_by_nullable, NULLABLE_COLUMN),
        ] {
            if !enabled {
                continue;
            }
            if let Some(index) = self.mapping.column_index(column) {
                conditions.push(Condition::new(column, self.encoded[index].clone()));
            }
        }
        conditions
    }

    /// Read the row back and compare it with the written one.
    fn verify(
        &mut self,
        connection: &mut dyn Connection,
        path: WritePath,
        expected_parameters: Option<usize>,
    ) -> Result<(), HarnessError> {
        let capture = ParameterCapture::default();
        let options = SelectOptions::default().with_hints(self.case.hints.clone());
        let rows = connection
            .select(self.mapping.table(), &self.conditions(), &options, Some(&capture))
            .map_err(client(path))?;

        if let Some(expected) = expected_parameters {
            // The count is only meaningful for exactly one observed command.
            let actual = match capture.observed().as_slice() {
                [count] => *count,
                observed => {
                    return Err(HarnessError::CommandsObserved {
                        path,
                        observed: observed.len(),
                    })
                }
            };
            if actual != expected {
                return Err(HarnessError::ParameterCount {
                    path,
                    expected,
                    actual,
                });
            }
            self.report.parameter_counts.push((path, actual));
        }

        let [stored] = rows.as_slice() else {
            return Err(HarnessError::RowCount {
                path,
                expected: 1,
                actual: rows.len(),
            });
        };

        let actual = TestRow::<T, N>::decode(stored, self.mapping)
            .map_err(|source| HarnessError::Decode { path, source })?;

        self.case
            .expect_value
            .check(path, VALUE_COLUMN, &self.case.value, &actual.value)?;

        if self.mapping.has_nullable_column() {
            self.case.expect_nullable.check_optional(
                path,
                NULLABLE_COLUMN,
                self.case.nullable.as_ref(),
                actual.nullable_value.as_ref(),
            )?;
        }

        debug!(table = %self.mapping.table(), path = %path, "path verified");
        self.report.paths.push(path);
        Ok(())
    }
}

fn client(path: WritePath) -> impl Fn(ClientError) -> HarnessError {
    move |source| HarnessError::Client { path, source }
}
