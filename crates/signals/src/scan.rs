use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{Granularity, ProductCatalog, Result, ThresholdPolicy};

/// Coins watched by the built-in daily momentum scan.
pub const MOMENTUM_COINS: &[&str] = &[
    "DOGE-USD", "SHIB-USD", "PEPE-USD", "FLOKI-USD", "WIF-USD", "SOL-USD", "RNDR-USD", "APT-USD",
    "OP-USD", "COMP-USD",
];

/// Quote currency suffix used when discovering assets on the exchange.
pub const DEFAULT_QUOTE_SUFFIX: &str = "-USD";

/// Where the assets of a pass come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetUniverse {
    /// A configured list, evaluated in the given order.
    Fixed { assets: Vec<String> },
    /// Every exchange product whose id ends with `quote_suffix`.
    Discovered { quote_suffix: String },
}

impl AssetUniverse {
    /// Produce the ordered asset list for one pass.
    ///
    /// Only `Discovered` touches the catalog, with a single call.
    pub async fn resolve(&self, catalog: &dyn ProductCatalog) -> Result<Vec<String>> {
        match self {
            AssetUniverse::Fixed { assets } => Ok(assets.clone()),
            AssetUniverse::Discovered { quote_suffix } => {
                let all = catalog.product_ids().await?;
                let total = all.len();
                let assets: Vec<String> = all
                    .into_iter()
                    .filter(|id| id.ends_with(quote_suffix.as_str()))
                    .collect();
                debug!(total, kept = assets.len(), suffix = %quote_suffix, "Discovered asset universe");
                Ok(assets)
            }
        }
    }
}

/// Everything one pass needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSpec {
    /// Label used in the summary line, e.g. "momentum".
    pub name: String,
    /// First line of every alert raised by this scan.
    pub headline: String,
    pub granularity: Granularity,
    pub lookback: Duration,
    pub policy: ThresholdPolicy,
    pub universe: AssetUniverse,
}

impl ScanSpec {
    /// Daily momentum over the fixed meme/L1 watch list.
    pub fn momentum() -> Self {
        Self {
            name: "momentum".to_string(),
            headline: "\u{1F6A8} Momentum Signal Detected!".to_string(),
            granularity: Granularity::Daily,
            lookback: Granularity::Daily.default_lookback(),
            policy: ThresholdPolicy::daily_momentum(),
            universe: AssetUniverse::Fixed {
                assets: MOMENTUM_COINS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    /// Hourly volume spikes across every USD-quoted product.
    pub fn volume_spike() -> Self {
        Self {
            name: "volume spike".to_string(),
            headline: "\u{1F680} Sudden Activity Detected!".to_string(),
            granularity: Granularity::Hourly,
            lookback: Granularity::Hourly.default_lookback(),
            policy: ThresholdPolicy::hourly_spike(),
            universe: AssetUniverse::Discovered {
                quote_suffix: DEFAULT_QUOTE_SUFFIX.to_string(),
            },
        }
    }
}

/// Scans run when no scan file is configured, in order.
pub fn default_scans() -> Vec<ScanSpec> {
    vec![ScanSpec::momentum(), ScanSpec::volume_spike()]
}
