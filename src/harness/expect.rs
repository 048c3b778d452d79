//! Expectation policy applied to a stored column value.

use std::fmt;
use std::sync::Arc;

use super::error::{HarnessError, WritePath};

/// What a column must hold after a round trip.
///
/// The variants are exclusive: a column is checked either by equality
/// against an expected value or by a predicate over the stored value.
pub enum Expectation<V> {
    /// Stored value equals the written value.
    Exact,
    /// Stored value equals the transform of the written value.
    Transform(Arc<dyn Fn(&V) -> V + Send + Sync>),
    /// Stored value satisfies the predicate.
    Predicate(Arc<dyn Fn(&V) -> bool + Send + Sync>),
}

impl<V> Expectation<V> {
    pub fn transform(f: impl Fn(&V) -> V + Send + Sync + 'static) -> Self {
        Self::Transform(Arc::new(f))
    }

    pub fn predicate(f: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }
}

impl<V> Default for Expectation<V> {
    fn default() -> Self {
        Self::Exact
    }
}

impl<V> Clone for Expectation<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Exact => Self::Exact,
            Self::Transform(f) => Self::Transform(Arc::clone(f)),
            Self::Predicate(f) => Self::Predicate(Arc::clone(f)),
        }
    }
}

impl<V> fmt::Debug for Expectation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("Exact"),
            Self::Transform(_) => f.write_str("Transform(..)"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<V: PartialEq + fmt::Debug> Expectation<V> {
    /// Check a non-null stored value against the written one.
    pub(crate) fn check(
        &self,
        path: WritePath,
        column: &'static str,
        written: &V,
        actual: &V,
    ) -> Result<(), HarnessError> {
        let expected = match self {
            Self::Predicate(holds) => {
                return if holds(actual) {
                    Ok(())
                } else {
                    Err(HarnessError::PredicateFailed {
                        path,
                        column,
                        actual: format!("{:?}", actual),
                    })
                };
            }
            Self::Transform(f) => f(written),
            Self::Exact => return equal(path, column, written, actual),
        };
        equal(path, column, &expected, actual)
    }

    /// Check an optional column. NULL must read back as NULL; the
    /// expectation applies only when both sides hold a value.
    pub(crate) fn check_optional(
        &self,
        path: WritePath,
        column: &'static str,
        written: Option<&V>,
        actual: Option<&V>,
    ) -> Result<(), HarnessError> {
        match (written, actual) {
            (Some(written), Some(actual)) => self.check(path, column, written, actual),
            (None, None) => Ok(()),
            (written, actual) => Err(HarnessError::ValueMismatch {
                path,
                column,
                expected: describe(written),
                actual: describe(actual),
            }),
        }
    }
}

fn equal<V: PartialEq + fmt::Debug>(
    path: WritePath,
    column: &'static str,
    expected: &V,
    actual: &V,
) -> Result<(), HarnessError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HarnessError::ValueMismatch {
            path,
            column,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        })
    }
}

fn describe<V: fmt::Debug>(value: Option<&V>) -> String {
    value
        .map(|v| format!("{:?}", v))
        .unwrap_or_else(|| "NULL".to_string())
}
