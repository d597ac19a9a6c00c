use crate::processing::types::{ActivityMetrics, ActivityTrace, TcxError};
use chrono::{DateTime, Utc};

/// Reduce a parsed trace to its summary metrics.
///
/// Requires at least two trackpoints with a valid timestamp. Every other
/// signal is optional and falls back to `0.0` when absent.
pub fn reduce_trace(trace: &ActivityTrace) -> Result<ActivityMetrics, TcxError> {
    let timestamps: Vec<_> = trace.timestamps().collect();
    let (first, last) = match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) if timestamps.len() >= 2 => (*first, *last),
        _ => {
            return Err(TcxError::InsufficientTimestamps {
                found: timestamps.len(),
            });
        }
    };

    // Out-of-order traces can put the last timestamp before the first.
    let duration_sec = seconds_between(first, last).max(0.0);
    let distance_m = trace.distances().last().copied().unwrap_or(0.0);

    let heart_rates = trace.heart_rates();
    let avg_hr = mean(&heart_rates);
    let max_hr = heart_rates.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let avg_cadence = mean(&trace.cadences());

    Ok(ActivityMetrics {
        duration_sec: round_to(duration_sec, 2),
        distance_m: round_to(distance_m, 2),
        avg_hr: round_to(avg_hr, 2),
        max_hr: round_to(max_hr, 2),
        avg_cadence: round_to(avg_cadence, 2),
        elevation_gain_m: round_to(elevation_gain(&trace.altitudes()), 2),
        pace_min_per_km: round_to(pace_min_per_km(duration_sec, distance_m), 3),
        hr_drift: round_to(heart_rate_drift(&heart_rates), 4),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sum of positive steps between consecutive altitude samples. Samples are
/// paired in collection order, so a trackpoint without altitude simply
/// drops out of the sequence.
pub(crate) fn elevation_gain(altitudes: &[f64]) -> f64 {
    altitudes
        .windows(2)
        .map(|pair| match pair {
            [previous, current] => (current - previous).max(0.0),
            _ => 0.0,
        })
        .sum()
}

pub(crate) fn pace_min_per_km(duration_sec: f64, distance_m: f64) -> f64 {
    if distance_m > 0.0 {
        (duration_sec / 60.0) / (distance_m / 1000.0)
    } else {
        0.0
    }
}

/// Relative change from the first-half to the second-half HR average,
/// splitting the samples by count rather than by elapsed time.
pub(crate) fn heart_rate_drift(heart_rates: &[f64]) -> f64 {
    let half = heart_rates.len() / 2;
    if half == 0 {
        return 0.0;
    }

    let (first, second) = heart_rates.split_at(half);
    let first_avg = mean(first);
    if first_avg > 0.0 {
        (mean(second) - first_avg) / first_avg
    } else {
        0.0
    }
}

/// Elapsed seconds with microsecond precision; negative when `end` precedes
/// `start`.
pub(crate) fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Round to `places` decimals on the exact value of `value`, with ties going
/// to the even digit. Formatting works on the exact binary value, so no
/// scaling error creeps in before the tie is decided.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.places$}").parse().unwrap_or(value)
}
