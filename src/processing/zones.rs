//! Time spent in each heart-rate zone.

use crate::processing::summary::{round_to, seconds_between};
use crate::processing::types::{ActivityTrace, HeartRateZones, ZoneTime};

pub const ZONE_COUNT: usize = 5;

/// Attribute each interval between consecutive timestamped trackpoints to
/// the zone of the earlier point's heart rate.
///
/// Points without a heart rate contribute no time. All five zones are
/// returned, including empty ones.
pub fn time_in_zones(trace: &ActivityTrace, zones: &HeartRateZones) -> Vec<ZoneTime> {
    let mut seconds = [0.0f64; ZONE_COUNT];

    let timed: Vec<_> = trace
        .trackpoints
        .iter()
        .filter_map(|point| point.time.map(|time| (time, point.heart_rate)))
        .collect();

    for pair in timed.windows(2) {
        if let [(start, Some(heart_rate)), (end, _)] = pair {
            let interval = seconds_between(*start, *end).max(0.0);
            let zone = zones.zone_for(*heart_rate);
            seconds[usize::from(zone) - 1] += interval;
        }
    }

    seconds
        .iter()
        .enumerate()
        .map(|(idx, total)| ZoneTime {
            zone: (idx + 1) as u8,
            seconds: round_to(*total, 2),
        })
        .collect()
}
