//! Command implementations for the CLI
//!
//! This module contains the implementation of all CLI commands:
//! - serve: Start the instrumented demo service
//! - loadgen: Send steady traffic at the service
//! - verify: Wait for the stack and verify signal ingestion

pub mod loadgen;
pub mod serve;
pub mod verify;
