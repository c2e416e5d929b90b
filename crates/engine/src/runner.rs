use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use common::{AssetError, CandleFetcher, Notifier, ProductCatalog, RunSummary};
use signals::{evaluate, ScanSpec};

use crate::alert;
use crate::pacing::Pacer;
use crate::runlog::RunLog;

/// Key under which a failed universe discovery is recorded in `RunSummary::errors`.
pub const UNIVERSE_ERROR_KEY: &str = "<universe>";

/// Drives one pass: universe → fetch → evaluate → alert, then a summary.
///
/// Holds no state between passes. Every per-asset failure is recorded in the
/// returned summary and never aborts the pass; the summary notification is
/// always the last message sent.
pub struct Runner {
    fetcher: Arc<dyn CandleFetcher>,
    catalog: Arc<dyn ProductCatalog>,
    notifier: Arc<dyn Notifier>,
    pacer: Arc<dyn Pacer>,
    run_log: Option<RunLog>,
}

impl Runner {
    pub fn new(
        fetcher: Arc<dyn CandleFetcher>,
        catalog: Arc<dyn ProductCatalog>,
        notifier: Arc<dyn Notifier>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            notifier,
            pacer,
            run_log: None,
        }
    }

    /// Also append every pass event to a plain-text run log.
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub async fn run_pass(&self, scan: &ScanSpec) -> RunSummary {
        self.run_pass_at(scan, Utc::now()).await
    }

    /// Run a pass stamped with `now`, the time printed in every message.
    pub async fn run_pass_at(&self, scan: &ScanSpec, now: DateTime<Utc>) -> RunSummary {
        info!(scan = %scan.name, granularity = %scan.granularity, "Pass started");
        self.log(&format!("{} pass started at {}", scan.name, alert::pass_time(now)))
            .await;

        let mut summary = RunSummary::new(&scan.name, scan.granularity, now);

        let assets = match scan.universe.resolve(self.catalog.as_ref()).await {
            Ok(assets) => assets,
            Err(e) => {
                error!(scan = %scan.name, error = %e, "Asset discovery failed");
                self.log(&format!("Asset discovery failed: {e}")).await;
                summary.errors.push(AssetError {
                    asset: UNIVERSE_ERROR_KEY.to_string(),
                    error: e.to_string(),
                });
                Vec::new()
            }
        };
        info!(scan = %scan.name, assets = assets.len(), "Universe resolved");

        for asset in &assets {
            self.check_asset(scan, asset, now, &mut summary).await;
            self.pacer.pause().await;
        }

        let text = alert::summary(&scan.name, summary.signals.len(), now);
        info!(
            scan = %scan.name,
            signals = summary.signals.len(),
            errors = summary.errors.len(),
            checked = summary.checked,
            "{text}"
        );
        self.log(&text).await;

        summary.summary_delivered = self.notifier.send(&text).await;
        if !summary.summary_delivered {
            warn!(scan = %scan.name, "Summary notification was not delivered");
        }
        if let Some(run_log) = &self.run_log {
            run_log.record_summary(Utc::now(), &summary).await;
        }
        summary
    }

    async fn check_asset(
        &self,
        scan: &ScanSpec,
        asset: &str,
        now: DateTime<Utc>,
        summary: &mut RunSummary,
    ) {
        debug!(asset, "Checking asset");

        let series = match self
            .fetcher
            .fetch(asset, scan.granularity, scan.lookback)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(asset, error = %e, "Skipping asset");
                self.log(&format!("Error processing {asset}: {e}")).await;
                summary.errors.push(AssetError {
                    asset: asset.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };
        summary.checked += 1;

        let result = evaluate(&series, &scan.policy);

        if let Some(anomaly) = result.anomaly {
            warn!(asset, %anomaly, "Degenerate candle data, treated as no signal");
            self.log(&format!("Anomaly for {asset}: {anomaly}")).await;
            summary.anomalies.push((asset.to_string(), anomaly));
        }

        if !result.triggered {
            debug!(
                asset,
                candles = series.len(),
                price_change = result.price_change,
                volume_ratio = result.volume_ratio,
                "No signal"
            );
            self.log(&format!("No {} signal for {asset}.", scan.name)).await;
            return;
        }

        let text = alert::signal_alert(&scan.headline, &result, now);
        info!(
            asset,
            price_change = result.price_change,
            volume_ratio = result.volume_ratio,
            "Signal detected"
        );
        self.log(&text).await;

        if !self.notifier.send(&text).await {
            warn!(asset, "Alert notification failed; not retried");
            summary.alerts_failed += 1;
        }
        summary.signals.push(result);
    }

    async fn log(&self, event: &str) {
        if let Some(run_log) = &self.run_log {
            run_log.record(Utc::now(), event).await;
        }
    }
}
