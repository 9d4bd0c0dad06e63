//! # flotillad — flotilla daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing
//! - Seed the virtual cluster (demo instance when enabled)
//! - Construct application services, injecting the cluster via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve, shutting down gracefully on ctrl-c
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use anyhow::Context;

use flotilla_adapter_http_axum::router;
use flotilla_adapter_http_axum::state::AppState;
use flotilla_adapter_virtual::VirtualCluster;
use flotilla_app::services::activation::ActivationWorkflow;
use flotilla_app::services::rule_list::RuleListService;
use flotilla_app::services::rule_service::RuleService;
use flotilla_app::services::tracker_service::TrackerService;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .init();

    let cluster = if config.demo.enabled {
        let (cluster, instance) = VirtualCluster::demo(&config.demo.instance_name);
        tracing::info!(%instance, name = %config.demo.instance_name, "seeded demo instance");
        cluster
    } else {
        VirtualCluster::new()
    };

    let state = AppState::new(
        RuleService::new(cluster.clone()),
        ActivationWorkflow::new(cluster.clone(), config.preview.page_size),
        RuleListService::new(cluster.clone()),
        TrackerService::new(cluster),
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "flotillad listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
}
