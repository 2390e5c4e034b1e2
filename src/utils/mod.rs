//! Shared utilities
//!
//! Error types, form validation and time helpers used across layers.

pub mod error;
pub mod time;
pub mod validation;
