//! edge-provisioner: device agent core for containerized modules.
//!
//! Translates declarative module descriptors (image, ports, environment,
//! logging driver) into container-runtime operations and executes them
//! idempotently against an injected runtime client.

// Core modules
pub mod agent;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod module;
pub mod runtime;

// Re-export commonly used error types
pub use error::{AgentError, CreateError, ResolutionError, RuntimeError, ValidationError};
