//! Shared test fixtures for the climate-explorer workspace.
//!
//! Canned metric catalogs and remote-service JSON payloads used by the
//! resolver and fetch test suites.

pub mod fixtures;

pub use fixtures::*;
