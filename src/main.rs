//! # Bunny CDN Operator
//!
//! Entry point: sets up logging, configuration, metrics and the Kubernetes
//! client, then runs the watchers until SIGTERM or SIGINT.
//!
//! Exits with code 9 when `BUNNY_CDN_API_KEY` is not set.

use anyhow::{Context, Result};
use bunny_cdn_operator::config::{LogFormat, OperatorConfig};
use bunny_cdn_operator::constants::EXIT_CODE_MISSING_API_KEY;
use bunny_cdn_operator::controller::credentials::KubeSecretStore;
use bunny_cdn_operator::controller::dispatcher;
use bunny_cdn_operator::controller::store::KubeStore;
use bunny_cdn_operator::controller::Reconciler;
use bunny_cdn_operator::observability::metrics;
use bunny_cdn_operator::provider::BunnyClient;
use bunny_cdn_operator::server::{start_server, ServerState};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    init_tracing(LogFormat::from_env());

    info!("Starting Bunny CDN Operator");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = match OperatorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_CODE_MISSING_API_KEY);
        }
    };
    info!("{:?}", config);

    metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let provider =
        BunnyClient::new(&config.credentials).context("Failed to create Bunny CDN client")?;
    let namespace = config.watch_namespace.clone();

    let reconciler = Arc::new(Reconciler {
        provider: Arc::new(provider),
        secrets: Arc::new(KubeSecretStore::new(client.clone())),
        pull_zones: Arc::new(KubeStore::new(client.clone(), namespace.clone())),
        storage_zones: Arc::new(KubeStore::new(client.clone(), namespace.clone())),
        edge_rules: Arc::new(KubeStore::new(client, namespace)),
        dependency_backoff: config.dependency_backoff,
    });

    server_state.set_ready(true);
    match &config.watch_namespace {
        Some(namespace) => info!("Operator ready, watching namespace {}", namespace),
        None => info!("Operator ready, watching all namespaces"),
    }

    let shutdown_state = Arc::clone(&server_state);
    dispatcher::run_until(reconciler, async move {
        shutdown_signal().await;
        shutdown_state.set_ready(false);
    })
    .await;

    info!("Operator stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bunny_cdn_operator=info".into());

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Resolves on SIGTERM (sent by Kubernetes) or SIGINT
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
