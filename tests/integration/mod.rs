//! Integration tests for roplant-admin
//!
//! These tests wire real services over real stores; only the failing store
//! in `common` is a stand-in.

pub mod access_flow_tests;
pub mod config_tests;
pub mod dashboard_pages_tests;
pub mod directory_tests;
pub mod http_api_tests;
pub mod sqlite_store_tests;
