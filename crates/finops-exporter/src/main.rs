//! finops-exporter: the FinOps cost and usage exporter binary.
//!
//! Loads one `ExporterScraperConfig`, polls the billing API it describes
//! and serves the resulting gauges for Prometheus.
//!
//! # Usage
//!
//! ```text
//! finops-exporter --config /config/config.yaml --port 2112
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use finops_control::{ControlPlane, KubeControlPlane};
use finops_exporter::{CycleDriver, load_config};
use finops_fetch::{
    Endpoint, EndpointResolver, Fetcher, RetryPolicy, SecretResolver, StaticResolver,
    UnavailableResolver,
};
use finops_metrics::{GaugeReconciler, GaugeRegistry};
use finops_spawner::ResourceSpawner;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "finops-exporter", about = "FinOps cost and usage exporter")]
struct Cli {
    /// Exporter config file.
    #[arg(long, env = "FINOPS_CONFIG", default_value = "/config/config.yaml")]
    config: PathBuf,

    /// Port for the metrics endpoint.
    #[arg(long, default_value = "2112")]
    port: u16,

    /// Fixed billing API base URL, bypassing endpoint secrets.
    #[arg(long)]
    server_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,finops=debug")),
        )
        .init();

    let cli = Cli::parse();

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let retry = RetryPolicy::default();
    let Some(config) = load_config(&cli.config, &retry, &mut shutdown_rx).await else {
        info!("shutdown before config was loaded");
        return Ok(());
    };

    let control: Option<Arc<dyn ControlPlane>> = match KubeControlPlane::in_cluster() {
        Ok(kube) => Some(Arc::new(kube)),
        Err(e) => {
            warn!(error = %e, "no in-cluster control plane, endpoint secrets and spawning disabled");
            None
        }
    };

    let resolver: Arc<dyn EndpointResolver> = match (&cli.server_url, &control) {
        (Some(url), _) => {
            info!(server_url = %url, "using static endpoint");
            Arc::new(StaticResolver::new(Endpoint::new(url.clone())))
        }
        (None, Some(control)) => Arc::new(SecretResolver::new(control.clone())),
        (None, None) => {
            warn!("no control plane and no --server-url, every fetch will fail until restarted");
            Arc::new(UnavailableResolver::new(
                "no control plane available and --server-url not given",
            ))
        }
    };

    let registry = GaugeRegistry::new();
    let reconciler = GaugeReconciler::new(registry.clone(), config.exporter().metric_type);
    let fetcher = Fetcher::new(resolver, retry)?;
    let provider = config.exporter().provider().map(|p| p.name.clone());
    let mut driver = CycleDriver::new(config, fetcher, reconciler).with_retry(retry);
    match (provider, control) {
        (Some(provider), Some(control)) => {
            info!(%provider, "resource spawning enabled");
            driver = driver.with_spawner(ResourceSpawner::new(control));
        }
        (Some(provider), None) => {
            warn!(%provider, "provider configured but no control plane, spawning disabled");
        }
        (None, _) => {}
    }

    let driver_handle = tokio::spawn(driver.run(shutdown_rx.clone()));

    let router = finops_api::build_router(registry);
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!(%addr, "metrics endpoint starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let mut server_shutdown = shutdown_rx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    let _ = driver_handle.await;
    info!("finops exporter stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on unix, SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
