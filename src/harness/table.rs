use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::client::Connection;

/// Owns a connection and the conformance table created through it. The
/// table is dropped when the lease goes out of scope, whatever the outcome
/// of the case; drop failures are logged and swallowed.
pub(crate) struct TableLease {
    connection: Box<dyn Connection>,
    table: String,
}

impl TableLease {
    pub(crate) fn new(connection: Box<dyn Connection>, table: impl Into<String>) -> Self {
        Self {
            connection,
            table: table.into(),
        }
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }
}

impl Deref for TableLease {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl DerefMut for TableLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection.as_mut()
    }
}

impl Drop for TableLease {
    fn drop(&mut self) {
        match self.connection.drop_table(&self.table) {
            Ok(()) => debug!(table = %self.table, "dropped conformance table"),
            Err(e) => warn!(table = %self.table, error = %e, "failed to drop conformance table"),
        }
    }
}
