use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use common::RunSummary;

/// Append-only plain-text record of each pass: one timestamped event per line.
///
/// Write failures are logged and swallowed; the run log never aborts a pass.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, at: DateTime<Utc>, event: &str) {
        if let Err(e) = self.append(at, event).await {
            warn!(path = %self.path.display(), error = %e, "Failed to write run log");
        }
    }

    /// Close a pass with its summary as a single `summary {json}` line.
    pub async fn record_summary(&self, at: DateTime<Utc>, summary: &RunSummary) {
        match serde_json::to_string(summary) {
            Ok(json) => self.record(at, &format!("summary {json}")).await,
            Err(e) => warn!(scan = %summary.scan, error = %e, "Failed to encode run summary"),
        }
    }

    async fn append(&self, at: DateTime<Utc>, event: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        // Multi-line alerts are flattened so every event stays on one line.
        let line = format!(
            "{} {}\n",
            at.format("%Y-%m-%d %H:%M:%S"),
            event.replace('\n', " | ")
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{Anomaly, AssetError, Granularity};

    #[tokio::test]
    async fn appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("alerts.log"));
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();

        log.record(at, "Pass started").await;
        log.record(at, "Signal\nCoin: SOL-USD").await;

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-06-03 09:30:00 Pass started",
                "2024-06-03 09:30:00 Signal | Coin: SOL-USD",
            ]
        );
    }

    #[tokio::test]
    async fn summary_is_written_as_one_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("alerts.log"));
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();

        let mut summary = RunSummary::new("volume spike", Granularity::Hourly, at);
        summary.checked = 2;
        summary.anomalies.push(("PEPE-USD".into(), Anomaly::ZeroBaselineVolume));
        summary.errors.push(AssetError {
            asset: "BONK-USD".into(),
            error: "HTTP error: timed out".into(),
        });
        summary.summary_delivered = true;
        log.record_summary(at, &summary).await;

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        let json = content
            .trim_end()
            .strip_prefix("2024-06-03 09:30:00 summary ")
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["scan"], "volume spike");
        assert_eq!(value["granularity"], "hourly");
        assert_eq!(value["checked"], 2);
        assert_eq!(value["anomalies"][0][0], "PEPE-USD");
        assert_eq!(value["anomalies"][0][1], "zero_baseline_volume");
        assert_eq!(value["errors"][0]["asset"], "BONK-USD");
        assert_eq!(value["summary_delivered"], true);
    }

    #[tokio::test]
    async fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::new(dir.path().join("missing").join("alerts.log"));
        log.record(Utc::now(), "ignored").await;
        assert!(!log.path().exists());
    }
}
