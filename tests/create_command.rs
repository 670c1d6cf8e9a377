//! Create command tests against an in-process fake runtime.
//!
//! The fake records every facade invocation so tests can assert not just
//! the command outcome but which runtime calls were (or were not) made.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use edge_provisioner::agent::HubConnectedAgent;
use edge_provisioner::command::CreateCommand;
use edge_provisioner::config::StaticConfigSource;
use edge_provisioner::error::{CreateError, RuntimeError};
use edge_provisioner::module::{LoggingConfig, ModuleDescriptor, PortBinding, Protocol};
use edge_provisioner::runtime::{ContainerHandle, ContainerState, CreationSpec, RuntimeClient};

/// How the fake should behave when `create` is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateMode {
    /// Create the container and return a handle.
    Succeed,
    /// Reject with a name conflict.
    Conflict,
    /// Fail, leaving a half-created container behind.
    FailLeavingOrphan,
    /// Fail without touching runtime state.
    FailClean,
    /// Never return; the call stays in flight until cancelled.
    Hang,
}

struct FakeRuntime {
    create_mode: CreateMode,
    inspect_fails: bool,
    pull_hangs: bool,
    calls: Mutex<Vec<String>>,
    containers: Mutex<BTreeMap<String, ContainerState>>,
}

impl FakeRuntime {
    fn new(create_mode: CreateMode) -> Self {
        Self {
            create_mode,
            inspect_fails: false,
            pull_hangs: false,
            calls: Mutex::new(Vec::new()),
            containers: Mutex::new(BTreeMap::new()),
        }
    }

    fn with_failing_inspect(mut self) -> Self {
        self.inspect_fails = true;
        self
    }

    fn with_hanging_pull(mut self) -> Self {
        self.pull_hangs = true;
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("lock poisoned").push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Seeds a container, as if a racing create had already committed.
    fn seed_container(&self, state: ContainerState) {
        self.containers
            .lock()
            .expect("lock poisoned")
            .insert(state.name.clone(), state);
    }

    fn container(&self, name: &str) -> Option<ContainerState> {
        self.containers
            .lock()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }
}

fn state_from_spec(spec: &CreationSpec) -> ContainerState {
    ContainerState {
        id: format!("id-{}", spec.name),
        name: spec.name.clone(),
        status: "created".to_string(),
        labels: spec.labels.clone(),
        env: spec.env.clone(),
        port_bindings: spec.port_bindings.clone(),
    }
}

#[async_trait::async_trait]
impl RuntimeClient for FakeRuntime {
    async fn create(&self, spec: &CreationSpec) -> Result<ContainerHandle, RuntimeError> {
        self.record(format!("create {}", spec.name));
        match self.create_mode {
            CreateMode::Succeed => {
                self.seed_container(state_from_spec(spec));
                Ok(ContainerHandle {
                    id: format!("id-{}", spec.name),
                    name: spec.name.clone(),
                })
            }
            CreateMode::Conflict => Err(RuntimeError::Conflict {
                name: spec.name.clone(),
            }),
            CreateMode::FailLeavingOrphan => {
                self.seed_container(state_from_spec(spec));
                Err(RuntimeError::Api {
                    operation: "create".to_string(),
                    message: "daemon fault after partial create".to_string(),
                })
            }
            CreateMode::FailClean => Err(RuntimeError::Api {
                operation: "create".to_string(),
                message: "daemon fault".to_string(),
            }),
            CreateMode::Hang => futures::future::pending().await,
        }
    }

    async fn inspect(&self, name: &str) -> Result<ContainerState, RuntimeError> {
        self.record(format!("inspect {name}"));
        if self.inspect_fails {
            return Err(RuntimeError::Api {
                operation: "inspect".to_string(),
                message: "daemon unreachable".to_string(),
            });
        }
        self.container(name).ok_or_else(|| RuntimeError::NotFound {
            name: name.to_string(),
        })
    }

    async fn remove(&self, name: &str, force: bool) -> Result<(), RuntimeError> {
        self.record(format!("remove {name} force={force}"));
        self.containers.lock().expect("lock poisoned").remove(name);
        Ok(())
    }

    async fn pull(
        &self,
        image: &str,
        tag: &str,
        cancel: CancellationToken,
    ) -> Result<(), RuntimeError> {
        self.record(format!("pull {image}:{tag}"));
        if self.pull_hangs {
            cancel.cancelled().await;
            return Err(RuntimeError::Cancelled {
                operation: "pull".to_string(),
            });
        }
        Ok(())
    }
}

fn hello_world_module() -> ModuleDescriptor {
    ModuleDescriptor::new("test-helloworld", "hello-world", "latest")
        .with_version("1.0")
        .with_port_binding(PortBinding::new("8080", "80", Protocol::Tcp))
        .with_env("k1", "v1")
        .with_env("k2", "v2")
}

fn command(runtime: Arc<FakeRuntime>, module: ModuleDescriptor) -> CreateCommand {
    CreateCommand::new(
        runtime,
        module,
        LoggingConfig::new("json-file").unwrap(),
        Arc::new(StaticConfigSource::new("FakeConnectionString")),
    )
    .unwrap()
}

#[tokio::test]
async fn smoke_test() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let command = command(runtime.clone(), hello_world_module());

    let handle = command.execute(CancellationToken::new()).await.unwrap();
    assert_eq!(handle.name, "test-helloworld");

    // verify the created container through the facade's inspect view
    let container = runtime.inspect("test-helloworld").await.unwrap();
    assert_eq!(container.name, "test-helloworld");
    assert_eq!(container.labels.get("version").map(String::as_str), Some("1.0"));
    assert_eq!(container.port_bindings.len(), 1);
    assert_eq!(container.port_bindings["80/tcp"], vec!["8080".to_string()]);
    assert_eq!(container.env_value("k1"), Some("v1"));
    assert_eq!(container.env_value("k2"), Some("v2"));
    assert_eq!(
        container.env_value("EdgeHubConnectionString"),
        Some("FakeConnectionString;ModuleId=test-helloworld")
    );
}

#[tokio::test]
async fn udp_module_config() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let module = ModuleDescriptor::new("test-helloworld", "hello-world", "latest")
        .with_port_binding(PortBinding::new("42", "42", Protocol::Udp));
    let command = command(runtime.clone(), module);

    command.execute(CancellationToken::new()).await.unwrap();

    let container = runtime.inspect("test-helloworld").await.unwrap();
    assert_eq!(container.labels.get("version").map(String::as_str), Some("1.0"));
    assert_eq!(container.port_bindings.len(), 1);
    assert_eq!(container.port_bindings["42/udp"], vec!["42".to_string()]);
}

#[tokio::test]
async fn validation_failure_makes_no_runtime_calls() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let module = ModuleDescriptor::new("test-helloworld", "", "latest");
    let command = command(runtime.clone(), module);

    let result = command.execute(CancellationToken::new()).await;

    assert!(matches!(result, Err(CreateError::Validation(_))));
    assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn resolution_failure_makes_no_runtime_calls() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let command = CreateCommand::new(
        runtime.clone(),
        hello_world_module(),
        LoggingConfig::new("json-file").unwrap(),
        Arc::new(StaticConfigSource::empty()),
    )
    .unwrap();

    let result = command.execute(CancellationToken::new()).await;

    assert!(matches!(result, Err(CreateError::Resolution(_))));
    assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn name_conflict_is_surfaced_not_retried() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Conflict));
    let command = command(runtime.clone(), hello_world_module());

    let result = command.execute(CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(CreateError::NameConflict { name }) if name == "test-helloworld"
    ));
    // exactly one create attempt, no cleanup of the existing container
    assert_eq!(runtime.calls(), vec!["create test-helloworld".to_string()]);
}

#[tokio::test]
async fn failed_create_leaves_no_orphan() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::FailLeavingOrphan));
    let command = command(runtime.clone(), hello_world_module());

    let result = command.execute(CancellationToken::new()).await;

    assert!(matches!(result, Err(CreateError::Runtime { .. })));
    assert!(runtime
        .calls()
        .iter()
        .any(|c| c == "remove test-helloworld force=true"));
    // target name no longer inspectable
    assert!(matches!(
        runtime.inspect("test-helloworld").await,
        Err(RuntimeError::NotFound { .. })
    ));
}

#[tokio::test]
async fn clean_failure_skips_removal() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::FailClean));
    let command = command(runtime.clone(), hello_world_module());

    let result = command.execute(CancellationToken::new()).await;

    assert!(matches!(result, Err(CreateError::Runtime { .. })));
    assert!(!runtime.calls().iter().any(|c| c.starts_with("remove")));
}

#[tokio::test]
async fn pre_cancelled_token_reports_cancellation() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let command = command(runtime.clone(), hello_world_module());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = command.execute(cancel).await;

    assert!(matches!(
        result,
        Err(CreateError::Cancelled { module }) if module == "test-helloworld"
    ));
    assert!(!runtime.calls().iter().any(|c| c.starts_with("create")));
}

#[tokio::test]
async fn cancellation_race_reports_committed_outcome() {
    // the create call hangs, but the daemon has in fact committed the
    // container; cancelling must resolve to success, not failure
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Hang));
    let module = hello_world_module();
    runtime.seed_container(ContainerState {
        id: "id-test-helloworld".to_string(),
        name: "test-helloworld".to_string(),
        status: "created".to_string(),
        labels: BTreeMap::from([("version".to_string(), "1.0".to_string())]),
        env: vec![
            "k1=v1".to_string(),
            "k2=v2".to_string(),
            "EdgeHubConnectionString=FakeConnectionString;ModuleId=test-helloworld".to_string(),
        ],
        port_bindings: BTreeMap::from([("80/tcp".to_string(), vec!["8080".to_string()])]),
    });
    let command = command(runtime.clone(), module);

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let handle = command.execute(cancel).await.unwrap();
    assert_eq!(handle.id, "id-test-helloworld");
}

#[tokio::test]
async fn cancellation_race_with_stale_container_is_a_conflict() {
    // the name is occupied, but by a container that does not match the
    // translated spec; cancelling must not hand the stale container back
    // as a success
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Hang));
    runtime.seed_container(ContainerState {
        id: "stale-id".to_string(),
        name: "test-helloworld".to_string(),
        status: "running".to_string(),
        labels: BTreeMap::from([("version".to_string(), "0.1-stale".to_string())]),
        env: vec!["OTHER=thing".to_string()],
        port_bindings: BTreeMap::new(),
    });
    let command = command(runtime.clone(), hello_world_module());

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let result = command.execute(cancel).await;
    assert!(matches!(
        result,
        Err(CreateError::NameConflict { name }) if name == "test-helloworld"
    ));
}

#[tokio::test]
async fn cancellation_race_without_commit_reports_cancelled() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Hang));
    let command = command(runtime.clone(), hello_world_module());

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let result = command.execute(cancel).await;
    assert!(matches!(result, Err(CreateError::Cancelled { .. })));
}

#[tokio::test]
async fn unverifiable_cancellation_race_is_indeterminate() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Hang).with_failing_inspect());
    let command = command(runtime.clone(), hello_world_module());

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let result = command.execute(cancel).await;
    assert!(matches!(
        result,
        Err(CreateError::Indeterminate { module }) if module == "test-helloworld"
    ));
}

#[tokio::test]
async fn agent_pulls_image_before_creating() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed));
    let agent = HubConnectedAgent::builder()
        .runtime(runtime.clone())
        .connection_string("FakeConnectionString")
        .build()
        .unwrap();

    let handle = agent
        .create_module(hello_world_module(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(handle.name, "test-helloworld");
    assert_eq!(
        runtime.calls(),
        vec![
            "pull hello-world:latest".to_string(),
            "create test-helloworld".to_string(),
        ]
    );
}

#[tokio::test]
async fn cancelled_pull_is_not_a_runtime_fault() {
    let runtime = Arc::new(FakeRuntime::new(CreateMode::Succeed).with_hanging_pull());
    let agent = HubConnectedAgent::builder()
        .runtime(runtime.clone())
        .connection_string("FakeConnectionString")
        .build()
        .unwrap();

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        deadline.cancel();
    });

    let result = agent.create_module(hello_world_module(), cancel).await;

    assert!(matches!(
        result,
        Err(CreateError::Cancelled { module }) if module == "test-helloworld"
    ));
    assert!(!runtime.calls().iter().any(|c| c.starts_with("create")));
}
