use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use swarmctl::cli::{
    connect, load_effective_config, reconciler_config, run_config, run_create, run_delete,
    run_list, run_network, Cli, CommandResult, Commands,
};
use swarmctl::config::Config;
use swarmctl::platform::PlatformClient;
use swarmctl::reconcile::ServiceReconciler;
use swarmctl::server::{create_router, AppState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Load .env file if specified, before the config reads the environment
    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    let (config, config_path) =
        match load_effective_config(cli.config.as_deref(), cli.platform_url.as_deref()) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        };

    // Config commands never touch the engine, everything else connects first
    match cli.command {
        Commands::Config(args) => {
            finish(run_config(&args.action, &config, &config_path));
        }
        Commands::Create(args) => {
            let rc = reconciler_config(&config, args.strict_networking, false);
            let reconciler = ServiceReconciler::with_config(platform(&config), rc);
            finish(run_create(&reconciler, &args).await);
        }
        Commands::List(args) => {
            let reconciler =
                ServiceReconciler::with_config(platform(&config), config.reconciler.clone());
            finish(run_list(&reconciler, &args).await);
        }
        Commands::Delete(args) => {
            let rc = reconciler_config(&config, false, args.best_effort);
            let reconciler = ServiceReconciler::with_config(platform(&config), rc);
            finish(run_delete(&reconciler, &args).await);
        }
        Commands::Network(args) => {
            let reconciler =
                ServiceReconciler::with_config(platform(&config), config.reconciler.clone());
            finish(run_network(reconciler.networks(), &args.action).await);
        }
        Commands::Serve(args) => {
            serve(&config, platform(&config), args.bind_addr, args.port).await;
        }
    }
}

fn platform(config: &Config) -> Arc<dyn PlatformClient> {
    match connect(config) {
        Ok(p) => {
            info!(url = %config.platform.url, "Using engine endpoint");
            p
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

/// Print command output, or log the error and exit non-zero
fn finish(result: CommandResult<String>) {
    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

async fn serve(
    config: &Config,
    platform: Arc<dyn PlatformClient>,
    bind_addr: Option<String>,
    port: Option<u16>,
) {
    let bind_addr = bind_addr.unwrap_or_else(|| config.server.bind_addr.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", bind_addr, port);

    let state = AppState::new(platform, config.reconciler.clone());
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            process::exit(1);
        }
    };

    info!("Server listening on {}", addr);
    info!("Endpoints:");
    info!("  GET    /health                - Health check");
    info!("  GET    /v1/services           - Declared services");
    info!("  GET    /v1/services/states    - Running vs. required replicas");
    info!("  POST   /v1/services           - Create a service");
    info!("  DELETE /v1/services           - Delete services (batch)");
    info!("  DELETE /v1/services/{{name}}    - Delete one service");
    info!("  POST   /v1/networks/{{name}}    - Ensure an overlay network");
    info!("  DELETE /v1/networks/{{name}}    - Remove a network");

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
