//! Command implementations for the CLI
//!
//! SBIO pattern: commands return their output as a `String`, printing and
//! exiting are left to `main`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::display::{format_delete_report, format_service_list, format_state_list};
use super::{ConfigAction, CreateArgs, DeleteArgs, ListArgs, NetworkAction, OutputFormat};
use crate::config::{self, default_config_path, Config, ConfigError};
use crate::model::Service;
use crate::platform::{DockerClient, PlatformClient};
use crate::reconcile::{
    DeletePolicy, NetworkOutcome, NetworkProvisioner, ReconcileError, ReconcilerConfig,
    ServiceReconciler,
};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file already exists: {0} (use --force to overwrite)")]
    ConfigExists(PathBuf),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Setup
// ============================================================================

/// Load the config from `path` (or the default location) and apply the
/// `--platform-url` override
pub fn load_effective_config(
    path: Option<&Path>,
    platform_url: Option<&str>,
) -> CommandResult<(Config, PathBuf)> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let mut config = config::load_config_from(&path)?;
    if let Some(url) = platform_url {
        config.platform.url = url.to_string();
    }
    Ok((config, path))
}

/// Build the Docker Engine client described by `config`
pub fn connect(config: &Config) -> CommandResult<Arc<dyn PlatformClient>> {
    let client = DockerClient::new(
        &config.platform.url,
        config.platform.api_version.clone(),
        config.platform.request_timeout(),
    )
    .map_err(|e| ReconcileError::PlatformUnavailable(e.to_string()))?;
    Ok(Arc::new(client))
}

/// Reconciler settings with per-invocation flags applied on top of the file
pub fn reconciler_config(
    config: &Config,
    strict_networking: bool,
    best_effort: bool,
) -> ReconcilerConfig {
    let mut rc = config.reconciler.clone();
    if strict_networking {
        rc.strict_networking = true;
    }
    if best_effort {
        rc.delete_policy = DeletePolicy::BestEffort;
    }
    rc
}

pub fn service_from_args(args: &CreateArgs) -> Service {
    let mut service = Service::new(&args.name, &args.image)
        .with_replicas(args.replicas)
        .with_memory_limit(args.memory_limit);
    if let Some(network) = &args.network {
        service = service.with_network(network);
    }
    service
}

// ============================================================================
// Commands
// ============================================================================

pub async fn run_create(
    reconciler: &ServiceReconciler,
    args: &CreateArgs,
) -> CommandResult<String> {
    let service = service_from_args(args);
    let id = reconciler.create(&service).await?;
    Ok(format!("service/{} created ({})\n", service.name, id))
}

pub async fn run_list(reconciler: &ServiceReconciler, args: &ListArgs) -> CommandResult<String> {
    if args.states {
        let states = reconciler.list_states().await?;
        return match args.output {
            OutputFormat::Table => Ok(format_state_list(&states)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&states)? + "\n"),
        };
    }

    let services = reconciler.list().await?;
    match args.output {
        OutputFormat::Table => Ok(format_service_list(&services)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&services)? + "\n"),
    }
}

pub async fn run_delete(
    reconciler: &ServiceReconciler,
    args: &DeleteArgs,
) -> CommandResult<String> {
    let report = reconciler.delete_names(&args.names).await?;
    Ok(format_delete_report(&report))
}

pub async fn run_network(
    provisioner: &NetworkProvisioner,
    action: &NetworkAction,
) -> CommandResult<String> {
    match action {
        NetworkAction::Ensure { name } => match provisioner.ensure(name).await? {
            NetworkOutcome::Created { id } => Ok(format!("network/{} created ({})\n", name, id)),
            NetworkOutcome::Existing { .. } => Ok(format!("network/{} unchanged\n", name)),
        },
        NetworkAction::Remove { name } => {
            if provisioner.remove(name).await? {
                Ok(format!("network/{} removed\n", name))
            } else {
                Ok(format!("network/{} not found\n", name))
            }
        }
    }
}

pub fn run_config(action: &ConfigAction, config: &Config, path: &Path) -> CommandResult<String> {
    match action {
        ConfigAction::Show => Ok(config::serialize_config(config)?),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(CommandError::ConfigExists(path.to_path_buf()));
            }
            config::save_config_to(&Config::default(), path)?;
            Ok(format!("Wrote {}\n", path.display()))
        }
    }
}
