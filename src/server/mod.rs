//! HTTP boundary for the gateway.
//!
//! - [`api`]: route handlers and router construction

pub mod api;

pub use api::{build_router, AppState};
