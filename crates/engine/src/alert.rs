//! Telegram-facing message text.

use chrono::{DateTime, Utc};

use common::SignalResult;

/// Pass timestamp as printed in every message of that pass.
pub fn pass_time(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Alert for one triggered asset.
pub fn signal_alert(headline: &str, result: &SignalResult, now: DateTime<Utc>) -> String {
    format!(
        "{headline}\n\
         Coin: {}\n\
         Price Change: {:.2}%\n\
         Volume Ratio: {:.2}x\n\
         Time: {}",
        result.asset,
        result.price_change * 100.0,
        result.volume_ratio,
        pass_time(now),
    )
}

/// End-of-pass summary. Errors are deliberately left out of the alert text.
pub fn summary(scan: &str, signal_count: usize, now: DateTime<Utc>) -> String {
    let at = pass_time(now);
    if signal_count == 0 {
        format!("No {scan} signals found at {at}.")
    } else {
        format!("{signal_count} {scan} signals found at {at}.")
    }
}
