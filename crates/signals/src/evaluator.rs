use common::{Anomaly, ReferenceIndex, Series, SignalResult, ThresholdPolicy};

/// Judge a series against a threshold policy.
///
/// Pure and deterministic. Series shorter than two candles never trigger and
/// report zero metrics. The baseline volume is the mean of every candle except
/// the most recent one, whichever candle the policy picks as the signal candle.
/// A zero open price or zero baseline is reported as an [`Anomaly`] with the
/// affected metric set to zero and never triggers.
pub fn evaluate(series: &Series, policy: &ThresholdPolicy) -> SignalResult {
    let candles = series.candles();
    let mut result = SignalResult::not_triggered(series.asset());
    if candles.len() < 2 {
        return result;
    }

    let signal = match policy.reference {
        ReferenceIndex::Latest => candles[candles.len() - 1],
        ReferenceIndex::SecondToLast => candles[candles.len() - 2],
    };
    result.timestamp = Some(signal.timestamp);

    let baseline = &candles[..candles.len() - 1];
    let avg_volume = baseline.iter().map(|c| c.volume).sum::<f64>() / baseline.len() as f64;

    if signal.open == 0.0 {
        result.anomaly = Some(Anomaly::ZeroOpen);
    } else {
        result.price_change = (signal.close - signal.open) / signal.open;
    }

    if avg_volume == 0.0 {
        result.anomaly.get_or_insert(Anomaly::ZeroBaselineVolume);
    } else {
        result.volume_ratio = signal.volume / avg_volume;
    }

    result.triggered = result.anomaly.is_none()
        && result.price_change >= policy.price_change_min
        && result.volume_ratio >= policy.volume_ratio_min;
    result
}
