use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use common::{Error, Granularity, ReferenceIndex, Result, ThresholdPolicy};

use crate::scan::{AssetUniverse, ScanSpec};

/// Top-level scan config file (TOML).
///
/// Example `config/scans.toml`:
/// ```toml
/// [[scan]]
/// name = "momentum"
/// granularity = "daily"
/// price_change_min = 0.10
/// volume_ratio_min = 1.5
///
/// [scan.universe]
/// kind = "fixed"
/// assets = ["DOGE-USD", "SOL-USD"]
///
/// [[scan]]
/// name = "volume spike"
/// granularity = "hourly"
///
/// [scan.universe]
/// kind = "discovered"
/// quote_suffix = "-USD"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanFileConfig {
    #[serde(rename = "scan", default)]
    pub scans: Vec<ScanConfig>,
}

/// One `[[scan]]` table. Omitted fields fall back to the granularity's defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Label shown in the summary line and logs.
    pub name: String,
    pub granularity: Granularity,
    /// Window size in hours. Defaults to 24 for hourly and 168 for daily.
    #[serde(default)]
    pub lookback_hours: Option<i64>,
    /// Which candle is judged: "latest" or "second_to_last".
    #[serde(default)]
    pub reference: Option<ReferenceIndex>,
    #[serde(default)]
    pub price_change_min: Option<f64>,
    #[serde(default)]
    pub volume_ratio_min: Option<f64>,
    /// First line of each alert message.
    #[serde(default)]
    pub headline: Option<String>,
    pub universe: AssetUniverse,
}

impl ScanFileConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read scan config at '{}': {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("scan config at '{}': {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse: {e}")))
    }

    /// Validate every table and turn it into a runnable scan.
    pub fn into_specs(self) -> Result<Vec<ScanSpec>> {
        if self.scans.is_empty() {
            return Err(Error::Config("no [[scan]] tables defined".into()));
        }
        self.scans.into_iter().map(ScanConfig::into_spec).collect()
    }
}

impl ScanConfig {
    pub fn into_spec(self) -> Result<ScanSpec> {
        let defaults = ThresholdPolicy::for_granularity(self.granularity);
        let policy = ThresholdPolicy {
            reference: self.reference.unwrap_or(defaults.reference),
            price_change_min: self.price_change_min.unwrap_or(defaults.price_change_min),
            volume_ratio_min: self.volume_ratio_min.unwrap_or(defaults.volume_ratio_min),
        };
        if !policy.price_change_min.is_finite() || !policy.volume_ratio_min.is_finite() {
            return Err(Error::Config(format!(
                "scan '{}': thresholds must be finite numbers",
                self.name
            )));
        }

        let lookback = match self.lookback_hours {
            Some(hours) if hours > 0 => Duration::hours(hours),
            Some(hours) => {
                return Err(Error::Config(format!(
                    "scan '{}': lookback_hours must be positive, got {hours}",
                    self.name
                )))
            }
            None => self.granularity.default_lookback(),
        };

        match &self.universe {
            AssetUniverse::Fixed { assets } if assets.is_empty() => {
                return Err(Error::Config(format!(
                    "scan '{}': fixed universe has no assets",
                    self.name
                )))
            }
            AssetUniverse::Discovered { quote_suffix } if quote_suffix.is_empty() => {
                return Err(Error::Config(format!(
                    "scan '{}': quote_suffix must not be empty",
                    self.name
                )))
            }
            _ => {}
        }

        let headline = self.headline.unwrap_or_else(|| match self.granularity {
            Granularity::Daily => ScanSpec::momentum().headline,
            Granularity::Hourly => ScanSpec::volume_spike().headline,
        });

        Ok(ScanSpec {
            name: self.name,
            headline,
            granularity: self.granularity,
            lookback,
            policy,
            universe: self.universe,
        })
    }
}
