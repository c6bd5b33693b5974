//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, server startup,
//! Kubernetes client setup and reconciler wiring.

use crate::config::{load_config, ControllerConfig, ServerConfig};
use crate::controller::reconciler::{
    KubeRecordStore, KubeReferenceResolver, ManagedInstancePhases, Reconciler, SecretPublisher,
};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::provider::aws::AwsConnector;
use crate::runtime::context::ControllerContext;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info};

/// Components needed to run the watch loop
pub struct InitializationResult {
    pub client: Client,
    pub context: Arc<ControllerContext>,
    pub server_state: Arc<ServerState>,
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rds_instance_controller=info".into()),
        )
        .init();

    info!("Starting RDSInstance Controller v{}", env!("CARGO_PKG_VERSION"));

    let (controller_config, server_config) = load_config();
    info!(?controller_config, ?server_config, "Loaded configuration");

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = server_state.clone();
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let reconciler = build_reconciler(client.clone(), &controller_config);
    let context = Arc::new(ControllerContext::new(reconciler, controller_config));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        context,
        server_state,
    })
}

/// Wire the Kubernetes and AWS backed collaborators into a reconciler
pub fn build_reconciler(client: Client, config: &ControllerConfig) -> Reconciler {
    let publisher = Arc::new(SecretPublisher::new(client.clone()));
    Reconciler::new(
        Arc::new(KubeRecordStore::new(client.clone())),
        Arc::new(AwsConnector::new(
            client.clone(),
            config.rds_endpoint_url.clone(),
        )),
        Arc::new(KubeReferenceResolver::new(client)),
        Arc::new(ManagedInstancePhases::new(
            publisher,
            config.credential_length,
        )),
        config.long_wait(),
    )
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = std::time::Duration::from_secs(config.startup_timeout_secs);
    let poll_interval = std::time::Duration::from_millis(config.poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state
            .is_ready
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}
