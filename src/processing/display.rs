use crate::processing::summary::round_to;
use crate::processing::types::{ActivityMetrics, CardioAutofill, METERS_PER_MILE};

impl CardioAutofill {
    /// Convert metrics into the units a cardio log entry uses. Zero metrics
    /// are treated as "not provided".
    pub fn from_metrics(metrics: &ActivityMetrics) -> Self {
        let positive = |value: f64| (value > 0.0).then_some(value);

        Self {
            duration_min: positive(metrics.duration_sec).map(|sec| (sec / 60.0) as u32),
            distance_mi: positive(metrics.distance_m)
                .map(|meters| round_to(meters / METERS_PER_MILE, 2)),
            avg_hr: positive(metrics.avg_hr).map(|hr| hr as u32),
            max_hr: positive(metrics.max_hr).map(|hr| hr as u32),
            elevation_gain_m: positive(metrics.elevation_gain_m).map(|gain| gain as u32),
        }
    }
}

/// Minutes per mile, when both duration and distance are known.
pub fn pace_per_mile(metrics: &ActivityMetrics) -> Option<f64> {
    if metrics.duration_sec <= 0.0 || metrics.distance_m <= 0.0 {
        return None;
    }
    Some((metrics.duration_sec / 60.0) / (metrics.distance_m / METERS_PER_MILE))
}

/// Format fractional minutes per unit as `m:ss`.
pub fn format_pace(minutes_per_unit: f64) -> Option<String> {
    if !minutes_per_unit.is_finite() || minutes_per_unit <= 0.0 {
        return None;
    }
    let mut minutes = minutes_per_unit.floor() as u64;
    let mut seconds = ((minutes_per_unit - minutes_per_unit.floor()) * 60.0).round() as u64;

    // Rounding can push the seconds to a full minute.
    if seconds >= 60 {
        minutes += 1;
        seconds = 0;
    }

    Some(format!("{minutes}:{seconds:02}"))
}

pub fn format_duration(seconds: f64) -> String {
    let rounded = seconds.round().max(0.0) as u64;
    let hours = rounded / 3600;
    let minutes = (rounded % 3600) / 60;
    let seconds = rounded % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{meters:.0} m")
    }
}

/// Drift as a signed percentage, e.g. `+13.8%`.
pub fn format_drift(drift: f64) -> String {
    format!("{:+.1}%", drift * 100.0)
}
