//! Runtime client capability interface.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::runtime::spec::CreationSpec;

/// Handle to a created container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Runtime-assigned container ID.
    pub id: String,
    /// Container name.
    pub name: String,
}

/// Observable state of a container, as returned by inspect.
///
/// This is the projection downstream verification relies on: name,
/// labels, port map, and environment are all deterministically derived
/// from the creation spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    /// Runtime-assigned container ID.
    pub id: String,
    /// Container name, without the runtime's leading slash.
    pub name: String,
    /// Runtime status string, e.g. `"created"` or `"running"`.
    pub status: String,
    /// Container labels.
    pub labels: BTreeMap<String, String>,
    /// Environment entries as `KEY=value`.
    pub env: Vec<String>,
    /// Port map keyed by `"<container-port>/<protocol>"`.
    pub port_bindings: BTreeMap<String, Vec<String>>,
}

impl ContainerState {
    /// Looks up an environment value by key.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|entry| {
            entry
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }
}

/// Narrow facade over the container runtime.
///
/// The agent core depends on exactly these four capabilities and assumes
/// nothing else about the daemon. Implementations must be safe for
/// concurrent use by multiple commands; the runtime's own container-name
/// uniqueness is the only cross-command coordination point.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Creates a container from the given spec.
    ///
    /// A name collision must surface as [`RuntimeError::Conflict`] so the
    /// caller's reconciliation policy can decide whether to clean up and
    /// retry.
    async fn create(&self, spec: &CreationSpec) -> Result<ContainerHandle, RuntimeError>;

    /// Inspects a container by name.
    ///
    /// An absent container surfaces as [`RuntimeError::NotFound`].
    async fn inspect(&self, name: &str) -> Result<ContainerState, RuntimeError>;

    /// Removes a container by name.
    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError>;

    /// Pulls an image, honoring the cancellation token.
    async fn pull(
        &self,
        image: &str,
        tag: &str,
        cancel: CancellationToken,
    ) -> Result<(), RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_lookup() {
        let state = ContainerState {
            id: "abc123".to_string(),
            name: "edge-hub".to_string(),
            status: "created".to_string(),
            labels: BTreeMap::new(),
            env: vec![
                "k1=v1".to_string(),
                "conn=HostName=x;ModuleId=edge-hub".to_string(),
            ],
            port_bindings: BTreeMap::new(),
        };

        assert_eq!(state.env_value("k1"), Some("v1"));
        // values containing '=' split only on the first one
        assert_eq!(state.env_value("conn"), Some("HostName=x;ModuleId=edge-hub"));
        assert_eq!(state.env_value("missing"), None);
    }
}
