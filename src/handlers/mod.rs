//! HTTP handlers for the demo service
//!
//! - demo: the instrumented routes (`/`, `/work`, `/error`)
//! - health: liveness endpoint

pub mod demo;
pub mod health;

pub use demo::AppState;
