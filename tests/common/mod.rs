//! Shared helpers for quicklook integration tests.

pub mod test_data;
