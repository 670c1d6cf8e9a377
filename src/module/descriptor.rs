//! Module descriptor value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Desired lifecycle state of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredStatus {
    /// Module should be running.
    Running,
    /// Module should exist but stay stopped.
    Stopped,
}

/// Transport protocol of a port binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(ValidationError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Mapping from a container-internal port to a host-exposed port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// Port exposed on the host.
    pub host_port: String,
    /// Port inside the container.
    pub container_port: String,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl PortBinding {
    /// Creates a new port binding.
    pub fn new(
        host_port: impl Into<String>,
        container_port: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self {
            host_port: host_port.into(),
            container_port: container_port.into(),
            protocol,
        }
    }

    /// Parses a CLI-style binding `<host>:<container>[/<protocol>]`.
    ///
    /// The protocol defaults to tcp when omitted; anything other than
    /// tcp/udp is rejected.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let (ports, protocol) = match s.split_once('/') {
            Some((ports, proto)) => (ports, proto.parse()?),
            None => (s, Protocol::Tcp),
        };
        let (host, container) = ports
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidPortBinding(s.to_string()))?;
        if host.is_empty() || container.is_empty() {
            return Err(ValidationError::InvalidPortBinding(s.to_string()));
        }
        Ok(Self::new(host, container, protocol))
    }

    /// Runtime-level port-map key for this binding, e.g. `"80/tcp"`.
    pub fn runtime_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Immutable description of a module's desired container state.
///
/// Identity is the module name, which must be unique among active modules
/// on a device. Environment entries keep their declared order; duplicate
/// keys are rejected at translation time rather than silently merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module name, used as the container name.
    pub name: String,
    /// Opaque version label, emitted as the `version` container label.
    pub version: String,
    /// Desired lifecycle state.
    pub desired_status: DesiredStatus,
    /// Container image.
    pub image: String,
    /// Image tag.
    pub tag: String,
    /// Port bindings in declared order.
    pub port_bindings: Vec<PortBinding>,
    /// Environment entries in declared order.
    pub env: Vec<(String, String)>,
}

impl ModuleDescriptor {
    /// Creates a descriptor with the given identity and image reference.
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: "1.0".to_string(),
            desired_status: DesiredStatus::Running,
            image: image.into(),
            tag: tag.into(),
            port_bindings: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Sets the module version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the desired lifecycle state.
    pub fn with_desired_status(mut self, status: DesiredStatus) -> Self {
        self.desired_status = status;
        self
    }

    /// Adds a port binding.
    pub fn with_port_binding(mut self, binding: PortBinding) -> Self {
        self.port_bindings.push(binding);
        self
    }

    /// Adds an environment entry.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Full image reference including the tag.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}
