//! Error types for edge-provisioner operations.
//!
//! Defines typed errors for all major subsystems:
//! - Module descriptor validation and translation
//! - Connection-context resolution from the config source
//! - Container runtime (Docker daemon) interactions
//! - Create command execution and cancellation
//! - Agent composition

use thiserror::Error;

/// Errors detected while validating a module descriptor or translating it
/// into a runtime creation spec. Always raised before any runtime I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Module image must not be blank")]
    BlankImage,

    #[error("Module image tag must not be blank")]
    BlankTag,

    #[error("Module name must not be blank")]
    BlankName,

    #[error("Module name '{0}' is not a valid container name")]
    InvalidName(String),

    #[error("Unsupported port protocol '{0}': must be 'tcp' or 'udp'")]
    UnsupportedProtocol(String),

    #[error("Duplicate environment key '{0}' declared by module")]
    DuplicateEnvKey(String),

    #[error("Invalid port binding '{0}': expected '<host>:<container>[/<protocol>]'")]
    InvalidPortBinding(String),

    #[error("Logging driver must not be blank")]
    BlankLogDriver,
}

/// Errors that can occur while resolving connection context from the
/// declarative config source.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("No connection string configured for module '{0}'")]
    MissingConnectionString(String),

    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors surfaced by the container runtime facade.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Container name '{name}' is already in use")]
    Conflict { name: String },

    #[error("Container '{name}' not found")]
    NotFound { name: String },

    #[error("Container runtime daemon not available: {0}")]
    Daemon(String),

    #[error("Runtime operation '{operation}' was cancelled")]
    Cancelled { operation: String },

    #[error("Runtime operation '{operation}' failed: {message}")]
    Api { operation: String, message: String },
}

/// Errors returned by a create command execution.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("A container named '{name}' already exists; caller must reconcile")]
    NameConflict { name: String },

    #[error("Create of module '{module}' was cancelled before completion")]
    Cancelled { module: String },

    #[error("Create of module '{module}' was interrupted; outcome unknown, inspect to reconcile")]
    Indeterminate { module: String },

    #[error("Runtime create failed for module '{module}'")]
    Runtime {
        module: String,
        #[source]
        source: RuntimeError,
    },
}

/// Errors that can occur while composing the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
