use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{CoinbaseClient, IntervalPacer, RunLog, Runner};
use signals::{default_scans, ScanFileConfig, ScanSpec};
use telegram_notify::TelegramNotifier;

/// One invocation runs every configured scan once, then exits. Scheduling is
/// left to cron or a systemd timer.
#[tokio::main]
async fn main() -> ExitCode {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let scans = match load_scans(&cfg) {
        Ok(scans) => scans,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };
    info!(
        scans = ?scans.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        pacing_ms = cfg.pacing.as_millis() as u64,
        "AlertBot starting"
    );

    // ── Collaborators ─────────────────────────────────────────────────────────
    let coinbase = match CoinbaseClient::new(&cfg.coinbase_base_url, cfg.http_timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build Coinbase client");
            return ExitCode::FAILURE;
        }
    };
    let notifier = Arc::new(TelegramNotifier::new(
        &cfg.telegram_bot_key,
        &cfg.telegram_chat_id,
    ));

    let mut runner = Runner::new(
        coinbase.clone(),
        coinbase,
        notifier,
        Arc::new(IntervalPacer::new(cfg.pacing)),
    );
    if let Some(path) = &cfg.run_log_path {
        info!(path = %path.display(), "Run log enabled");
        runner = runner.with_run_log(RunLog::new(path));
    }

    // ── Passes ────────────────────────────────────────────────────────────────
    for scan in &scans {
        let summary = runner.run_pass(scan).await;
        info!(
            scan = %summary.scan,
            checked = summary.checked,
            signals = summary.signals.len(),
            anomalies = summary.anomalies.len(),
            errors = summary.errors.len(),
            alerts_failed = summary.alerts_failed,
            summary_delivered = summary.summary_delivered,
            "Pass complete"
        );
    }

    ExitCode::SUCCESS
}

/// Scans from `SCAN_CONFIG_PATH`, or the built-in momentum and volume spike scans.
fn load_scans(cfg: &Config) -> common::Result<Vec<ScanSpec>> {
    match &cfg.scan_config_path {
        Some(path) => ScanFileConfig::load(path)?.into_specs(),
        None => Ok(default_scans()),
    }
}
