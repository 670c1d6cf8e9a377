//! CLI argument definitions and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::agent::HubConnectedAgent;
use crate::module::{ModuleDescriptor, PortBinding};

/// Provisions declaratively described modules as containers.
#[derive(Debug, Parser)]
#[command(name = "edge-provisioner", version, about)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Docker host URI, e.g. unix:///var/run/docker.sock.
    #[arg(long, global = true, env = "DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Hub connection string shared by all modules.
    #[arg(long, global = true, env = "EDGEHUB_CONNECTIONSTRING")]
    pub connection_string: Option<String>,

    /// YAML settings file with connection config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Container log driver applied to every module.
    #[arg(long, global = true, default_value = "json-file")]
    pub log_driver: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pull a module image and create its container.
    Create {
        /// Module name (used as the container name).
        #[arg(long)]
        name: String,

        /// Container image, without the tag.
        #[arg(long)]
        image: String,

        /// Image tag.
        #[arg(long, default_value = "latest")]
        tag: String,

        /// Module version, emitted as the `version` label.
        #[arg(long, default_value = "1.0")]
        module_version: String,

        /// Port binding `<host>:<container>[/<protocol>]`; repeatable.
        #[arg(long = "port")]
        ports: Vec<String>,

        /// Environment entry `KEY=value`; repeatable.
        #[arg(long = "env")]
        env: Vec<String>,

        /// Abort the create if it has not finished within this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Inspect a module's container and print its state as JSON.
    Inspect {
        /// Module name.
        name: String,
    },

    /// Remove a module's container.
    Remove {
        /// Module name.
        name: String,

        /// Remove even if the container is running.
        #[arg(long)]
        force: bool,
    },
}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the parsed CLI command to completion.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let mut builder = HubConnectedAgent::builder().log_driver(&cli.log_driver);
    if let Some(host) = &cli.docker_host {
        builder = builder.docker_host(host);
    }
    if let Some(cs) = &cli.connection_string {
        builder = builder.connection_string(cs);
    }
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    let agent = builder.build().context("failed to assemble agent")?;

    match cli.command {
        Command::Create {
            name,
            image,
            tag,
            module_version,
            ports,
            env,
            timeout,
        } => {
            let mut module = ModuleDescriptor::new(&name, image, tag)
                .with_version(module_version);
            for port in &ports {
                module = module.with_port_binding(PortBinding::parse(port)?);
            }
            for entry in &env {
                let (key, value) = entry
                    .split_once('=')
                    .with_context(|| format!("invalid --env '{entry}': expected KEY=value"))?;
                module = module.with_env(key, value);
            }

            let cancel = CancellationToken::new();
            if let Some(secs) = timeout {
                let deadline = cancel.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    deadline.cancel();
                });
            }

            let handle = agent.create_module(module, cancel).await?;
            println!("{}", handle.id);
        }
        Command::Inspect { name } => {
            let state = agent.inspect_module(&name).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Remove { name, force } => {
            agent.remove_module(&name, force).await?;
        }
    }

    Ok(())
}
