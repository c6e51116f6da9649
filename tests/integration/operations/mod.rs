//! Integration tests for the enrollment operations

mod blocking_test;
mod retrieve_test;
