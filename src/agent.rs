//! Composition root for the hub-connected agent.
//!
//! Assembles the runtime client, config source, and logging config with
//! an explicit builder; references are threaded directly rather than
//! resolved from a service container.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::command::CreateCommand;
use crate::config::{ConnectionContextProvider, FileConfigSource, StaticConfigSource};
use crate::error::{AgentError, CreateError, RuntimeError};
use crate::module::{LoggingConfig, ModuleDescriptor};
use crate::runtime::{ContainerHandle, ContainerState, DockerRuntime, RuntimeClient};

/// Agent wired for cloud-twin-connected operation.
///
/// Nothing is needed beyond the container runtime and a connection
/// string for the hub; the twin layer that feeds descriptors in is
/// external to this crate.
pub struct HubConnectedAgent {
    runtime: Arc<dyn RuntimeClient>,
    config: Arc<dyn ConnectionContextProvider>,
    logging: LoggingConfig,
}

impl HubConnectedAgent {
    /// Starts building an agent.
    pub fn builder() -> HubConnectedAgentBuilder {
        HubConnectedAgentBuilder::default()
    }

    /// Pulls the module image and creates its container.
    ///
    /// A token firing during the pull is reported as a cancellation, not
    /// a runtime fault, so callers do not back off from a timeout.
    pub async fn create_module(
        &self,
        module: ModuleDescriptor,
        cancel: CancellationToken,
    ) -> Result<ContainerHandle, CreateError> {
        self.runtime
            .pull(&module.image, &module.tag, cancel.clone())
            .await
            .map_err(|source| match source {
                RuntimeError::Cancelled { .. } => CreateError::Cancelled {
                    module: module.name.clone(),
                },
                source => CreateError::Runtime {
                    module: module.name.clone(),
                    source,
                },
            })?;

        let command = CreateCommand::new(
            Arc::clone(&self.runtime),
            module,
            self.logging.clone(),
            Arc::clone(&self.config),
        )?;
        command.execute(cancel).await
    }

    /// Inspects a module's container by name.
    pub async fn inspect_module(&self, name: &str) -> Result<ContainerState, RuntimeError> {
        self.runtime.inspect(name).await
    }

    /// Removes a module's container by name.
    pub async fn remove_module(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        self.runtime.remove(name, force).await
    }
}

/// Explicit dependency-graph builder for [`HubConnectedAgent`].
#[derive(Default)]
pub struct HubConnectedAgentBuilder {
    docker_host: Option<String>,
    log_driver: Option<String>,
    log_options: Vec<(String, String)>,
    connection_string: Option<String>,
    config_file: Option<PathBuf>,
    runtime: Option<Arc<dyn RuntimeClient>>,
}

impl HubConnectedAgentBuilder {
    /// Sets the Docker host URI (`unix://...` or `http://...`).
    pub fn docker_host(mut self, host: impl Into<String>) -> Self {
        self.docker_host = Some(host.into());
        self
    }

    /// Sets the log driver shared by every module (default `json-file`).
    pub fn log_driver(mut self, driver: impl Into<String>) -> Self {
        self.log_driver = Some(driver.into());
        self
    }

    /// Adds a log driver option.
    pub fn log_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.log_options.push((key.into(), value.into()));
        self
    }

    /// Sets the hub connection string resolved for every module.
    pub fn connection_string(mut self, cs: impl Into<String>) -> Self {
        self.connection_string = Some(cs.into());
        self
    }

    /// Loads connection config from a YAML settings file instead.
    ///
    /// An explicit connection string takes precedence over the file.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Injects a pre-built runtime client (used by tests).
    pub fn runtime(mut self, runtime: Arc<dyn RuntimeClient>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validates the logging driver, connects to the runtime, and wires
    /// the agent together.
    pub fn build(self) -> Result<HubConnectedAgent, AgentError> {
        let logging = self
            .log_options
            .into_iter()
            .fold(
                LoggingConfig::new(self.log_driver.as_deref().unwrap_or("json-file"))?,
                |config, (key, value)| config.with_option(key, value),
            );

        let config: Arc<dyn ConnectionContextProvider> = match (self.connection_string, self.config_file) {
            (Some(cs), _) => Arc::new(StaticConfigSource::new(cs)),
            (None, Some(path)) => Arc::new(FileConfigSource::load(&path)?),
            (None, None) => Arc::new(StaticConfigSource::empty()),
        };

        let runtime: Arc<dyn RuntimeClient> = match self.runtime {
            Some(runtime) => runtime,
            None => match self.docker_host {
                Some(host) => Arc::new(DockerRuntime::with_host(&host)?),
                None => Arc::new(DockerRuntime::new()?),
            },
        };

        Ok(HubConnectedAgent {
            runtime,
            config,
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_blank_log_driver_rejected_at_composition() {
        let result = HubConnectedAgent::builder()
            .log_driver("  ")
            .connection_string("HostName=hub.example.com")
            .build();

        assert!(matches!(
            result,
            Err(AgentError::Validation(ValidationError::BlankLogDriver))
        ));
    }
}
