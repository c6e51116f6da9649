//! Integration tests for HTTP status handling

mod status_test;
