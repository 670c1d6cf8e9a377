//! Docker implementation of the runtime facade using the bollard crate.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, HostConfigLogConfig, PortBinding, PortMap};
use bollard::Docker;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::runtime::client::{ContainerHandle, ContainerState, RuntimeClient};
use crate::runtime::spec::CreationSpec;

const CONNECT_TIMEOUT_SECS: u64 = 120;

/// Docker-backed runtime client.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the local Docker daemon using platform defaults.
    pub fn new() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Daemon(format!("Failed to connect: {e}")))?;

        Ok(Self { docker })
    }

    /// Connects to the daemon at the given host URI.
    ///
    /// Accepts `unix://` socket paths and `http://`/`tcp://` addresses.
    pub fn with_host(host: &str) -> Result<Self, RuntimeError> {
        let docker = if let Some(path) = host.strip_prefix("unix://") {
            Docker::connect_with_unix(path, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        } else {
            Docker::connect_with_http(host, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| RuntimeError::Daemon(format!("Failed to connect to '{host}': {e}")))?;

        Ok(Self { docker })
    }

    fn classify(operation: &str, name: &str, err: bollard::errors::Error) -> RuntimeError {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409, ..
            } => RuntimeError::Conflict {
                name: name.to_string(),
            },
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => RuntimeError::NotFound {
                name: name.to_string(),
            },
            other => RuntimeError::Api {
                operation: operation.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Maps the translated port map to bollard's wire representation.
fn to_port_map(bindings: &BTreeMap<String, Vec<String>>) -> PortMap {
    bindings
        .iter()
        .map(|(key, hosts)| {
            let entries = hosts
                .iter()
                .map(|host_port| PortBinding {
                    host_ip: None,
                    host_port: Some(host_port.clone()),
                })
                .collect();
            (key.clone(), Some(entries))
        })
        .collect()
}

fn from_port_map(map: Option<PortMap>) -> BTreeMap<String, Vec<String>> {
    map.unwrap_or_default()
        .into_iter()
        .map(|(key, entries)| {
            let hosts = entries
                .unwrap_or_default()
                .into_iter()
                .filter_map(|b| b.host_port)
                .collect();
            (key, hosts)
        })
        .collect()
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn create(&self, spec: &CreationSpec) -> Result<ContainerHandle, RuntimeError> {
        let exposed_ports: HashMap<String, HashMap<(), ()>> = spec
            .port_bindings
            .keys()
            .map(|key| (key.clone(), HashMap::new()))
            .collect();

        let host_config = HostConfig {
            port_bindings: Some(to_port_map(&spec.port_bindings)),
            log_config: Some(HostConfigLogConfig {
                typ: Some(spec.log_driver.clone()),
                config: Some(spec.log_options.clone().into_iter().collect()),
            }),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            labels: Some(spec.labels.clone().into_iter().collect()),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| Self::classify("create", &spec.name, e))?;

        Ok(ContainerHandle {
            id: response.id,
            name: spec.name.clone(),
        })
    }

    async fn inspect(&self, name: &str) -> Result<ContainerState, RuntimeError> {
        let info = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Self::classify("inspect", name, e))?;

        let config = info.config.unwrap_or_default();
        let host_config = info.host_config.unwrap_or_default();

        Ok(ContainerState {
            id: info.id.unwrap_or_default(),
            // the daemon reports names with a leading "/"
            name: info
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_else(|| name.to_string()),
            status: info
                .state
                .and_then(|s| s.status)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            labels: config.labels.unwrap_or_default().into_iter().collect(),
            env: config.env.unwrap_or_default(),
            port_bindings: from_port_map(host_config.port_bindings),
        })
    }

    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force,
            v: true, // remove anonymous volumes too
            ..Default::default()
        };

        self.docker
            .remove_container(name, Some(options))
            .await
            .map_err(|e| Self::classify("remove", name, e))?;

        Ok(())
    }

    async fn pull(
        &self,
        image: &str,
        tag: &str,
        cancel: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let options = CreateImageOptions {
            from_image: image,
            tag,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RuntimeError::Cancelled {
                        operation: "pull".to_string(),
                    });
                }
                progress = stream.next() => {
                    match progress {
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(Self::classify("pull", image, e)),
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_map_round_trip() {
        let mut bindings = BTreeMap::new();
        bindings.insert("80/tcp".to_string(), vec!["8080".to_string(), "8081".to_string()]);
        bindings.insert("42/udp".to_string(), vec!["42".to_string()]);

        let wire = to_port_map(&bindings);
        assert_eq!(wire.len(), 2);
        let http = wire.get("80/tcp").unwrap().as_ref().unwrap();
        assert_eq!(http[0].host_port.as_deref(), Some("8080"));
        assert_eq!(http[1].host_port.as_deref(), Some("8081"));

        assert_eq!(from_port_map(Some(wire)), bindings);
    }
}
