//! CycleDriver: fetch → normalize → reconcile → spawn → sleep.

use finops_core::ExporterScraperConfig;
use finops_fetch::{FetchError, FetchResult, Fetcher, RetryPolicy, pause};
use finops_metrics::{GaugeReconciler, ReconcileReport};
use finops_spawner::{ResourceSpawner, SpawnReport};
use finops_table::{NormalizeError, normalize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub rows: usize,
    /// `None` when the payload carried no usable data.
    pub reconcile: Option<ReconcileReport>,
    /// `None` when spawning was not attempted or failed.
    pub spawn: Option<SpawnReport>,
}

pub struct CycleDriver {
    config: ExporterScraperConfig,
    fetcher: Fetcher,
    reconciler: GaugeReconciler,
    spawner: Option<ResourceSpawner>,
    retry: RetryPolicy,
}

impl CycleDriver {
    pub fn new(config: ExporterScraperConfig, fetcher: Fetcher, reconciler: GaugeReconciler) -> Self {
        Self {
            config,
            fetcher,
            reconciler,
            spawner: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Spawn children for discovered resources. Only used when the
    /// exporter references a provider.
    pub fn with_spawner(mut self, spawner: ResourceSpawner) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn spawner(&self) -> Option<&ResourceSpawner> {
        self.spawner.as_ref()
    }

    /// Run one cycle. Malformed data and a missing value column are
    /// retried after the retry delay; the only error is
    /// [`FetchError::Cancelled`].
    pub async fn run_cycle(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> FetchResult<CycleReport> {
        let exporter = self.config.exporter();
        let resource_id = exporter
            .additional_variables
            .get(finops_spawner::RESOURCE_ID_VARIABLE)
            .map(String::as_str)
            .unwrap_or_default();

        loop {
            let payload = self
                .fetcher
                .fetch(&exporter.api, &exporter.additional_variables, shutdown)
                .await?;

            let records = match normalize(
                &payload.body,
                &payload.content_type,
                exporter.metric_type,
                resource_id,
            ) {
                Ok(records) => records,
                Err(NormalizeError::UnsupportedContentType(content_type)) => {
                    warn!(%content_type, "unsupported content type, no data this cycle");
                    return Ok(CycleReport::default());
                }
                Err(e) => {
                    warn!(error = %e, "payload could not be normalized, retrying");
                    self.retry.backoff(shutdown).await?;
                    continue;
                }
            };

            let reconciled = match self.reconciler.reconcile(&records).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, "reconcile aborted, retrying");
                    self.retry.backoff(shutdown).await?;
                    continue;
                }
            };

            let spawn = match (&mut self.spawner, exporter.provider()) {
                (Some(spawner), Some(_)) => {
                    match spawner.discover_and_spawn(&records, &self.config).await {
                        Ok(report) => Some(report),
                        Err(e) => {
                            error!(error = %e, "resource spawning skipped this cycle");
                            None
                        }
                    }
                }
                _ => None,
            };

            return Ok(CycleReport {
                rows: records.len(),
                reconcile: Some(reconciled),
                spawn,
            });
        }
    }

    /// Cycle until shutdown, sleeping the polling interval between cycles.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.exporter().polling_interval.as_duration();
        info!(
            exporter = %self.config.metadata.name,
            interval_secs = interval.as_secs(),
            metric_type = %self.config.exporter().metric_type,
            "cycle driver started"
        );

        loop {
            match self.run_cycle(&mut shutdown).await {
                Ok(report) => debug!(rows = report.rows, "cycle complete"),
                Err(FetchError::Cancelled) => break,
                Err(e) => error!(error = %e, "cycle failed"),
            }
            if pause(interval, &mut shutdown).await.is_err() {
                break;
            }
        }
        info!("cycle driver shutting down");
    }
}
