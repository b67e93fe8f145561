//! Property-based tests for XferSite core library

mod algorithm_tests;
mod collection_tests;
mod persistence_tests;
mod session_tests;
mod url_tests;
