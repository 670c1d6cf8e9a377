//! Command-line interface for edge-provisioner.
//!
//! Provides commands for creating, inspecting, and removing module
//! containers against a local or remote Docker daemon.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
