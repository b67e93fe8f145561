//! Integration tests for import, export and profile store round trips
//!
//! These tests verify that sites survive being written to files and read
//! back, and that importers handle real-world data.

pub mod collection_tests;
pub mod export_import_roundtrip;
pub mod importer_tests;
