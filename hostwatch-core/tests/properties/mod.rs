//! Property-based tests

mod alert_tests;
mod parser_tests;
mod registry_tests;
