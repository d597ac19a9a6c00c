use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// XML namespace every TCX element we read must be qualified with.
pub const TCX_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";

/// Meters per statute mile, as used for the dashboard's mile conversions.
pub const METERS_PER_MILE: f64 = 1609.34;

/// One sample of an activity recording. Every field is optional because
/// device firmware routinely omits or garbles individual values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trackpoint {
    pub time: Option<DateTime<Utc>>,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
    pub altitude_m: Option<f64>,
    pub distance_m: Option<f64>,
}

/// Trackpoints in document order. Document order is treated as time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTrace {
    pub trackpoints: Vec<Trackpoint>,
}

impl ActivityTrace {
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.trackpoints.iter().filter_map(|point| point.time)
    }

    pub fn heart_rates(&self) -> Vec<f64> {
        self.trackpoints
            .iter()
            .filter_map(|point| point.heart_rate)
            .collect()
    }

    pub fn cadences(&self) -> Vec<f64> {
        self.trackpoints
            .iter()
            .filter_map(|point| point.cadence)
            .collect()
    }

    pub fn altitudes(&self) -> Vec<f64> {
        self.trackpoints
            .iter()
            .filter_map(|point| point.altitude_m)
            .collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.trackpoints
            .iter()
            .filter_map(|point| point.distance_m)
            .collect()
    }
}

/// Summary metrics derived from a TCX trace.
///
/// Each field falls back to `0.0` when the underlying signal is absent.
/// Values are rounded: 2 places for time, distance, heart rate, cadence and
/// elevation; 3 places for pace; 4 places for drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub duration_sec: f64,
    pub distance_m: f64,
    pub avg_hr: f64,
    pub max_hr: f64,
    pub avg_cadence: f64,
    pub elevation_gain_m: f64,
    pub pace_min_per_km: f64,
    /// Relative change between the first and second half HR averages.
    pub hr_drift: f64,
}

/// Five-zone heart-rate model expressed as fractions of max HR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartRateZones {
    pub max_hr: f64,
    /// Upper bounds of zones 1-4 as fractions of `max_hr`; zone 5 is open-ended.
    pub zone_thresholds: [f64; 4],
}

impl HeartRateZones {
    pub fn from_max_hr(max_hr: f64) -> Self {
        Self {
            max_hr,
            zone_thresholds: [0.60, 0.70, 0.80, 0.90],
        }
    }

    /// Zone (1-5) a heart-rate value falls into.
    pub fn zone_for(&self, heart_rate: f64) -> u8 {
        for (idx, fraction) in self.zone_thresholds.iter().enumerate() {
            if heart_rate <= self.max_hr * fraction {
                return (idx + 1) as u8;
            }
        }
        5
    }
}

impl Default for HeartRateZones {
    fn default() -> Self {
        Self::from_max_hr(185.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneTime {
    pub zone: u8,
    pub seconds: f64,
}

/// Values used to pre-populate a cardio log entry. `None` leaves the
/// user's manual value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardioAutofill {
    pub duration_min: Option<u32>,
    pub distance_mi: Option<f64>,
    pub avg_hr: Option<u32>,
    pub max_hr: Option<u32>,
    pub elevation_gain_m: Option<u32>,
}

/// Everything the upload handlers derive from a single TCX file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTcx {
    pub metrics: ActivityMetrics,
    pub autofill: CardioAutofill,
    pub time_in_zones: Vec<ZoneTime>,
}

#[derive(Debug)]
pub enum TcxError {
    Decode(String),
    Xml(String),
    NoTrackpoints,
    InsufficientTimestamps { found: usize },
    Io(std::io::Error),
}

impl fmt::Display for TcxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcxError::Decode(msg) => write!(f, "Failed to decode TCX bytes: {msg}"),
            TcxError::Xml(msg) => write!(f, "Failed to parse TCX document: {msg}"),
            TcxError::NoTrackpoints => write!(f, "TCX document contains no trackpoints"),
            TcxError::InsufficientTimestamps { found } => write!(
                f,
                "TCX document needs at least two timestamped trackpoints, found {found}"
            ),
            TcxError::Io(err) => write!(f, "Failed to read TCX upload: {err}"),
        }
    }
}

impl std::error::Error for TcxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TcxError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TcxError {
    fn from(err: std::io::Error) -> Self {
        TcxError::Io(err)
    }
}
