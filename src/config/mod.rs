//! Declarative config source supplying per-module connection context.
//!
//! The reconciliation layer decides *what* to create; this layer only
//! answers "what connection string does module X get". The create command
//! scopes the resolved value with a `;ModuleId=<name>` suffix before
//! injection, so a shared hub string still yields per-module credentials.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// Environment key under which the scoped connection string is injected.
pub const CONNECTION_STRING_KEY: &str = "EdgeHubConnectionString";

/// Supplies connection context for a module by name.
pub trait ConnectionContextProvider: Send + Sync {
    /// Resolves the (unscoped) connection string for the given module.
    fn resolve(&self, module: &str) -> Result<String, ResolutionError>;
}

/// In-memory config source: one shared connection string plus optional
/// per-module overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    connection_string: Option<String>,
    overrides: BTreeMap<String, String>,
}

impl StaticConfigSource {
    /// Creates a source resolving every module to the same string.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            overrides: BTreeMap::new(),
        }
    }

    /// Creates a source with no configuration; every resolve fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a per-module override.
    pub fn with_module(mut self, module: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(module.into(), value.into());
        self
    }
}

impl ConnectionContextProvider for StaticConfigSource {
    fn resolve(&self, module: &str) -> Result<String, ResolutionError> {
        self.overrides
            .get(module)
            .or(self.connection_string.as_ref())
            .cloned()
            .ok_or_else(|| ResolutionError::MissingConnectionString(module.to_string()))
    }
}

/// On-disk shape of the agent settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Settings {
    connection_string: Option<String>,
    #[serde(default)]
    modules: BTreeMap<String, String>,
}

/// YAML-file-backed config source.
///
/// The file is read once at construction; the agent does not watch for
/// changes (desired-state refresh is the twin layer's job).
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    inner: StaticConfigSource,
}

impl FileConfigSource {
    /// Loads settings from the given YAML file.
    pub fn load(path: &Path) -> Result<Self, ResolutionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ResolutionError::Yaml {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            inner: StaticConfigSource {
                connection_string: settings.connection_string,
                overrides: settings.modules,
            },
        })
    }
}

impl ConnectionContextProvider for FileConfigSource {
    fn resolve(&self, module: &str) -> Result<String, ResolutionError> {
        self.inner.resolve(module)
    }
}
