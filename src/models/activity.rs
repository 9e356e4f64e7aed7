use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity summary as returned by the Strava activity-list API.
///
/// Read-only input to the TSS engine; nothing here is ever mutated or
/// persisted by this crate. Strava's vendor taxonomy is open-ended, so the
/// type strings stay free-form (see `sport::classify`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivitySummary {
  #[serde(default)]
  pub id: i64,
  #[serde(default)]
  pub name: String,
  /// Legacy activity type ("Run", "Ride", ...)
  #[serde(rename = "type", default)]
  pub activity_type: String,
  /// Newer, more specific taxonomy ("TrailRun", "VirtualRide", ...).
  /// Preferred over `activity_type` when present.
  #[serde(default)]
  pub sport_type: Option<String>,
  #[serde(default)]
  pub start_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub moving_time: Option<f64>,
  #[serde(default)]
  pub elapsed_time: Option<f64>,
  /// Meters
  #[serde(default)]
  pub distance: Option<f64>,
  #[serde(default)]
  pub average_watts: Option<f64>,
  /// Strava's normalized-power equivalent
  #[serde(default)]
  pub weighted_average_watts: Option<f64>,
  #[serde(default)]
  pub average_heartrate: Option<f64>,
}

impl ActivitySummary {
  /// Duration used by the TSS router: moving time preferred, elapsed time
  /// as fallback, 0 when neither is present (calculators then return n/a).
  pub fn duration_sec(&self) -> f64 {
    self.moving_time.or(self.elapsed_time).unwrap_or(0.0)
  }
}
