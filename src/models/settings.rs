use serde::{Deserialize, Serialize};

/// Heart-rate zone boundaries in bpm. Each field is the upper edge of the
/// zone; `z5_max` conventionally equals the athlete's max HR.
///
/// Boundaries are expected to be non-decreasing. The calculators never
/// enforce this - it is a validation concern for whoever writes settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrZonesBpm {
  pub z1_max: f64,
  pub z2_max: f64,
  pub z3_max: f64,
  pub z4_max: f64,
  pub z5_max: f64,
}

/// Per-athlete configuration record.
///
/// Loaded once per session from the settings store and passed by reference
/// into the calculators, which only read it. Saved via atomic full-row
/// replace - there is no partial merge at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
  /// Max heart rate, bpm
  pub max_hr: f64,
  /// Lactate threshold heart rate, bpm
  pub lthr: f64,
  /// Functional threshold power, watts
  pub ftp: f64,

  pub resting_hr: Option<f64>,
  pub weight_kg: Option<f64>,

  /// Run threshold pace, seconds per km (smaller = faster)
  pub run_threshold_pace_sec_per_km: f64,
  /// Critical swim speed, seconds per 100m (smaller = faster)
  pub css_sec_per_100m: f64,

  pub hr_zones: HrZonesBpm,
}

impl Default for UserSettings {
  /// Documented defaults, overridden per athlete via the settings store.
  fn default() -> Self {
    Self {
      max_hr: 180.0,
      lthr: 160.0,
      ftp: 200.0,
      resting_hr: Some(55.0),
      weight_kg: Some(63.0),
      run_threshold_pace_sec_per_km: 300.0, // 5:00 /km
      css_sec_per_100m: 140.0,              // 2:20 /100m
      hr_zones: HrZonesBpm {
        z1_max: 120.0,
        z2_max: 140.0,
        z3_max: 155.0,
        z4_max: 170.0,
        z5_max: 180.0,
      },
    }
  }
}
