//! Create command: one module, one container creation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::command::translate::translate;
use crate::config::ConnectionContextProvider;
use crate::error::{CreateError, RuntimeError, ValidationError};
use crate::module::{LoggingConfig, ModuleDescriptor};
use crate::runtime::{ContainerHandle, ContainerState, CreationSpec, RuntimeClient};

/// Creates the container for a single module, exactly once.
///
/// The command owns the translated spec for one execution and performs
/// exactly one compensating action on failure: removing a half-created
/// container under the target name. Retry, backoff, and cleanup of stale
/// same-named containers belong to the caller's reconciliation policy.
pub struct CreateCommand {
    runtime: Arc<dyn RuntimeClient>,
    module: ModuleDescriptor,
    logging: LoggingConfig,
    config: Arc<dyn ConnectionContextProvider>,
}

impl CreateCommand {
    /// Builds a create command for the given module.
    ///
    /// Fails fast on a blank module name; remaining descriptor validation
    /// happens during translation so it is reported per execution.
    pub fn new(
        runtime: Arc<dyn RuntimeClient>,
        module: ModuleDescriptor,
        logging: LoggingConfig,
        config: Arc<dyn ConnectionContextProvider>,
    ) -> Result<Self, ValidationError> {
        if module.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        Ok(Self {
            runtime,
            module,
            logging,
            config,
        })
    }

    /// Resolves connection context, translates, and creates the container.
    ///
    /// Cancellation is cooperative: if the token fires before the runtime
    /// call is issued the command reports `Cancelled`; if it fires while
    /// the call is in flight the command inspects the target name and
    /// reports whichever outcome the runtime actually committed, falling
    /// back to `Indeterminate` when inspection itself cannot confirm.
    pub async fn execute(
        &self,
        cancel: CancellationToken,
    ) -> Result<ContainerHandle, CreateError> {
        let module = self.module.name.clone();
        let connection_string = self.config.resolve(&module)?;
        let spec = translate(&self.module, &self.logging, &connection_string)?;

        tracing::debug!(module = %module, image = %spec.image, "creating container");

        let created = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return self.resolve_after_cancel(&spec).await;
            }
            result = self.runtime.create(&spec) => result,
        };

        match created {
            Ok(handle) => {
                tracing::info!(module = %module, id = %handle.id, "container created");
                Ok(handle)
            }
            Err(RuntimeError::Conflict { name }) => {
                Err(CreateError::NameConflict { name })
            }
            Err(source) => {
                self.remove_orphan(&spec).await;
                Err(CreateError::Runtime { module, source })
            }
        }
    }

    /// Resolves the outcome after the token fired mid-call.
    ///
    /// The create request may or may not have committed by the time it
    /// was abandoned, so only an inspect can tell the truth. A container
    /// under the target name counts as our commit only if it matches the
    /// translated spec; a stale same-named container is the same name
    /// conflict the uncancelled path would have surfaced.
    async fn resolve_after_cancel(
        &self,
        spec: &CreationSpec,
    ) -> Result<ContainerHandle, CreateError> {
        let module = self.module.name.clone();
        match self.runtime.inspect(&spec.name).await {
            Ok(state) if committed_from_spec(spec, &state) => {
                tracing::warn!(
                    module = %module,
                    "create was cancelled but the runtime committed it"
                );
                Ok(ContainerHandle {
                    id: state.id,
                    name: state.name,
                })
            }
            Ok(_) => Err(CreateError::NameConflict { name: spec.name.clone() }),
            Err(RuntimeError::NotFound { .. }) => Err(CreateError::Cancelled { module }),
            Err(err) => {
                tracing::warn!(module = %module, error = %err, "post-cancel inspect failed");
                Err(CreateError::Indeterminate { module })
            }
        }
    }

    /// Removes a half-created container left behind by a failed create.
    ///
    /// A failed execute must leave either no container or a fully formed
    /// one under the target name. Failure to clean up is logged; the
    /// original create error is what the caller sees.
    async fn remove_orphan(&self, spec: &CreationSpec) {
        match self.runtime.inspect(&spec.name).await {
            Ok(_) => {
                if let Err(err) = self.runtime.remove(&spec.name, true).await {
                    tracing::warn!(
                        module = %self.module.name,
                        error = %err,
                        "failed to remove orphaned container"
                    );
                }
            }
            Err(RuntimeError::NotFound { .. }) => {}
            Err(err) => {
                tracing::warn!(
                    module = %self.module.name,
                    error = %err,
                    "could not check for orphaned container"
                );
            }
        }
    }
}

/// Whether an inspected container is the one this spec would create.
///
/// The version label and the scoped connection entry (always the last
/// env entry of a translated spec) discriminate our commit from a stale
/// container that merely shares the name.
fn committed_from_spec(spec: &CreationSpec, state: &ContainerState) -> bool {
    state.labels.get("version") == spec.labels.get("version")
        && spec
            .env
            .last()
            .is_some_and(|entry| state.env.contains(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn spec() -> CreationSpec {
        let module = ModuleDescriptor::new("edge-hub", "mcr.example.com/edge-hub", "1.0.1")
            .with_version("1.0");
        translate(&module, &LoggingConfig::new("json-file").unwrap(), "cs").unwrap()
    }

    fn state(labels: BTreeMap<String, String>, env: Vec<String>) -> ContainerState {
        ContainerState {
            id: "id".to_string(),
            name: "edge-hub".to_string(),
            status: "created".to_string(),
            labels,
            env,
            port_bindings: BTreeMap::new(),
        }
    }

    #[test]
    fn test_committed_from_spec_requires_matching_identity() {
        let spec = spec();

        let matching = state(spec.labels.clone(), spec.env.clone());
        assert!(committed_from_spec(&spec, &matching));

        // same name, different version label
        let stale_version = state(
            BTreeMap::from([("version".to_string(), "0.9".to_string())]),
            spec.env.clone(),
        );
        assert!(!committed_from_spec(&spec, &stale_version));

        // same version, missing the scoped connection entry
        let stale_env = state(spec.labels.clone(), vec!["OTHER=thing".to_string()]);
        assert!(!committed_from_spec(&spec, &stale_env));
    }
}
