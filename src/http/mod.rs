//! HTTP server module
//!
//! - Axum router with the transcript, ping and version endpoints
//! - Request handlers
//! - Request logging middleware
//! - CORS

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
