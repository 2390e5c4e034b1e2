//! Common test utilities for roplant-admin
//!
//! - Record fixtures seeded straight into a document store
//! - [`FlakyStore`], a store whose reads can be switched off
//! - [`TestApp`], the application wired over an in-memory store

pub mod app;
pub mod fixtures;

pub use app::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp};
pub use fixtures::{FlakyStore, memory_store};
