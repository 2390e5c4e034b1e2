//! Core domain types
//!
//! Record shapes shared by storage, permission checks and services, plus
//! server-side identifier generation.

pub mod ids;
pub mod models;
