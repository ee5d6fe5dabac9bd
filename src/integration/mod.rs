//! Integration testing module
//!
//! End-to-end tests for the caption window server:
//! - Query parameter handling and defaults
//! - Window extraction through the HTTP surface
//! - Upstream error mapping

pub mod e2e;
pub mod fixtures;
