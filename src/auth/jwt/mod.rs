//! JWT session tokens
//!
//! Sessions are stateless HS256 tokens. Sign-out is handled by the caller
//! through a revocation list keyed by the token id.

mod handler;
pub mod types;


pub use types::{Claims, JwtHandler};
