//! Integration tests against mock HTTP servers.

pub mod common;
pub mod poll_test;
pub mod request_test;
