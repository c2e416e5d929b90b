use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One interval's open/close/volume summary for an asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    /// Start of the interval.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            close,
            volume,
        }
    }
}

/// Candle interval size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    /// Window fetched when a scan does not override it: 24 hourly candles or a
    /// week of daily ones.
    pub fn default_lookback(self) -> Duration {
        match self {
            Granularity::Hourly => Duration::hours(24),
            Granularity::Daily => Duration::days(7),
        }
    }

    /// Identifier the Coinbase candles endpoint expects.
    pub fn wire_name(self) -> &'static str {
        match self {
            Granularity::Hourly => "ONE_HOUR",
            Granularity::Daily => "ONE_DAY",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Hourly => write!(f, "hourly"),
            Granularity::Daily => write!(f, "daily"),
        }
    }
}

/// Time-ordered window of candles for a single asset and granularity.
///
/// Candles are always ascending by timestamp with no duplicate timestamps.
/// The fields are private so that invariant cannot be broken after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    asset: String,
    granularity: Granularity,
    candles: Vec<Candle>,
}

impl Series {
    /// Build a series from candles in any order. Sorts ascending and keeps the
    /// first candle seen for each timestamp.
    pub fn new(asset: impl Into<String>, granularity: Granularity, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self {
            asset: asset.into(),
            granularity,
            candles,
        }
    }

    /// Explicit "not enough data" series returned instead of partial windows.
    pub fn insufficient(asset: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            asset: asset.into(),
            granularity,
            candles: Vec::new(),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Which candle of a series is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceIndex {
    /// Most recent candle, possibly still open.
    Latest,
    /// The candle before the most recent one, i.e. the last fully closed day.
    SecondToLast,
}

/// Signal candle selection plus the two inclusive trigger thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub reference: ReferenceIndex,
    /// Minimum `(close - open) / open` of the signal candle, e.g. 0.10 = 10%.
    pub price_change_min: f64,
    /// Minimum signal volume over baseline volume, e.g. 1.5 = 150%.
    pub volume_ratio_min: f64,
}

impl ThresholdPolicy {
    pub fn daily_momentum() -> Self {
        Self {
            reference: ReferenceIndex::SecondToLast,
            price_change_min: 0.10,
            volume_ratio_min: 1.5,
        }
    }

    pub fn hourly_spike() -> Self {
        Self {
            reference: ReferenceIndex::Latest,
            price_change_min: 0.05,
            volume_ratio_min: 1.5,
        }
    }

    /// Default policy for a granularity.
    pub fn for_granularity(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Hourly => Self::hourly_spike(),
            Granularity::Daily => Self::daily_momentum(),
        }
    }
}

/// Degenerate arithmetic met while evaluating a series. Never a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    ZeroOpen,
    ZeroBaselineVolume,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::ZeroOpen => write!(f, "signal candle has a zero open price"),
            Anomaly::ZeroBaselineVolume => write!(f, "baseline volume is zero"),
        }
    }
}

/// Verdict and metrics for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalResult {
    pub asset: String,
    pub triggered: bool,
    pub price_change: f64,
    pub volume_ratio: f64,
    /// Start of the signal candle. `None` when the series was too short.
    pub timestamp: Option<DateTime<Utc>>,
    pub anomaly: Option<Anomaly>,
}

impl SignalResult {
    pub fn not_triggered(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            triggered: false,
            price_change: 0.0,
            volume_ratio: 0.0,
            timestamp: None,
            anomaly: None,
        }
    }
}

/// An asset skipped during a pass and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetError {
    pub asset: String,
    pub error: String,
}

/// Result of one pass over an asset universe. Written to the run log as one
/// JSON line when the pass ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Scan label, e.g. "momentum".
    pub scan: String,
    pub granularity: Granularity,
    pub started_at: DateTime<Utc>,
    /// Assets whose series was fetched successfully.
    pub checked: usize,
    /// Triggered results only, in universe order.
    pub signals: Vec<SignalResult>,
    pub anomalies: Vec<(String, Anomaly)>,
    pub errors: Vec<AssetError>,
    /// Alerts whose delivery failed. They still count as signals.
    pub alerts_failed: usize,
    pub summary_delivered: bool,
}

impl RunSummary {
    pub fn new(scan: impl Into<String>, granularity: Granularity, started_at: DateTime<Utc>) -> Self {
        Self {
            scan: scan.into(),
            granularity,
            started_at,
            checked: 0,
            signals: Vec::new(),
            anomalies: Vec::new(),
            errors: Vec::new(),
            alerts_failed: 0,
            summary_delivered: false,
        }
    }
}
