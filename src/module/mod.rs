//! Declarative module descriptors.
//!
//! A module is a declaratively described unit of work to be run as a
//! container on the device. The descriptor captures desired state only
//! (image, ports, environment); nothing here touches the runtime.

pub mod descriptor;
pub mod logging;

pub use descriptor::{DesiredStatus, ModuleDescriptor, PortBinding, Protocol};
pub use logging::LoggingConfig;
