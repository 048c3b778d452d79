pub mod client;
pub mod config;
pub mod harness;
pub mod hints;
pub mod mapping;
pub mod schema;
pub mod sql;
pub mod telemetry;
pub mod types;
pub mod value;

pub use client::{Connection, ConnectionFactory, MemoryConnectionFactory};
pub use config::{ConnectionConfig, HarnessConfig};
pub use harness::{Expectation, HarnessError, RoundTripCase, RoundTripHarness, RunReport, WritePath};
pub use hints::HintDirective;
pub use mapping::ColumnValue;
pub use schema::TestRow;
pub use types::{DataType, StorageType, TypeDescriptor};
pub use value::{DecimalValue, Value};
