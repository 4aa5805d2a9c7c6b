//! Startup helpers: config loading with retry.

use std::path::Path;

use finops_core::ExporterScraperConfig;
use finops_fetch::RetryPolicy;
use tokio::sync::watch;
use tracing::{info, warn};

/// Load the exporter config, retrying after the retry delay until it
/// reads, parses and validates. Returns `None` on shutdown.
pub async fn load_config(
    path: &Path,
    retry: &RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<ExporterScraperConfig> {
    loop {
        match ExporterScraperConfig::from_file(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    name = %config.metadata.name,
                    namespace = %config.metadata.namespace,
                    "exporter config loaded"
                );
                return Some(config);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unavailable, retrying");
                if retry.backoff(shutdown).await.is_err() {
                    return None;
                }
            }
        }
    }
}
