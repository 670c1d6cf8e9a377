//! Container runtime facade.
//!
//! The agent core consumes the runtime through a narrow capability
//! interface (create, inspect, remove, pull) so that the create command
//! can be exercised against a test double and so that nothing else about
//! the daemon's behavior leaks into the translation logic.

pub mod client;
pub mod docker;
pub mod spec;

pub use client::{ContainerHandle, ContainerState, RuntimeClient};
pub use docker::DockerRuntime;
pub use spec::CreationSpec;
