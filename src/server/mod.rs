//! HTTP server implementation
//!
//! JSON API under `/api/v1`, health endpoints, and the dashboard pages.

pub mod builder;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use builder::run_server;
pub use server::HttpServer;
pub use state::AppState;
