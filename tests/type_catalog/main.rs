//! Type catalog conformance tests.
//!
//! Runs the round-trip harness over every logical type of the catalog
//! against the in-memory store: boundary values, cross-type mappings and
//! the documented truncation and rounding rules.
//!
//! Run with: cargo test --test type_catalog

mod common;

mod decimals;
mod floats;
mod integers;
mod strings;
mod temporal;
