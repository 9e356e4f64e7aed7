//! Heart-rate zone classification and time-in-zone aggregation

use crate::models::HrZonesBpm;
use serde::{Deserialize, Serialize};

/// One of five intensity bands bounded by athlete-specific thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrZone {
  Z1,
  Z2,
  Z3,
  Z4,
  Z5,
}

impl HrZone {
  pub fn as_str(&self) -> &'static str {
    match self {
      HrZone::Z1 => "Z1",
      HrZone::Z2 => "Z2",
      HrZone::Z3 => "Z3",
      HrZone::Z4 => "Z4",
      HrZone::Z5 => "Z5",
    }
  }
}

/// Map a heart-rate sample to its zone: the first boundary (ascending) that
/// is >= the sample wins, and anything above `z4_max` lands in Z5. Total
/// over all finite inputs - there is no error case.
pub fn zone_for_hr(hr: f64, zones: &HrZonesBpm) -> HrZone {
  if hr <= zones.z1_max {
    HrZone::Z1
  } else if hr <= zones.z2_max {
    HrZone::Z2
  } else if hr <= zones.z3_max {
    HrZone::Z3
  } else if hr <= zones.z4_max {
    HrZone::Z4
  } else {
    HrZone::Z5
  }
}

/// Per-zone scalar breakdown (seconds or percentages).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneBreakdown {
  pub z1: f64,
  pub z2: f64,
  pub z3: f64,
  pub z4: f64,
  pub z5: f64,
}

impl ZoneBreakdown {
  pub fn get(&self, zone: HrZone) -> f64 {
    match zone {
      HrZone::Z1 => self.z1,
      HrZone::Z2 => self.z2,
      HrZone::Z3 => self.z3,
      HrZone::Z4 => self.z4,
      HrZone::Z5 => self.z5,
    }
  }

  fn add(&mut self, zone: HrZone, amount: f64) {
    match zone {
      HrZone::Z1 => self.z1 += amount,
      HrZone::Z2 => self.z2 += amount,
      HrZone::Z3 => self.z3 += amount,
      HrZone::Z4 => self.z4 += amount,
      HrZone::Z5 => self.z5 += amount,
    }
  }

  pub fn total(&self) -> f64 {
    self.z1 + self.z2 + self.z3 + self.z4 + self.z5
  }
}

/// Aggregated zone distribution for a heart-rate time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrZoneSummary {
  /// Total seconds of valid samples
  pub total_seconds: f64,
  pub seconds_by_zone: ZoneBreakdown,
  /// 0-100; sums to ~100 when total_seconds > 0, all zero otherwise
  pub pct_by_zone: ZoneBreakdown,
}

/// Estimate time-in-zone from an HR stream.
///
/// Samples that are missing, non-finite, or <= 0 are sensor dropouts and
/// are skipped entirely - they do not count toward the total. One sample
/// accounts for `sample_sec` seconds (1 when the interval is unknown or
/// non-positive). This is a lossy aggregate with no positional guarantee.
pub fn summarize_hr_zones(
  hr_series: &[Option<f64>],
  zones: &HrZonesBpm,
  sample_sec: f64,
) -> HrZoneSummary {
  let dt = if sample_sec.is_finite() && sample_sec > 0.0 {
    sample_sec
  } else {
    1.0
  };

  let mut seconds_by_zone = ZoneBreakdown::default();
  let mut total_seconds = 0.0;

  for sample in hr_series {
    let hr = match sample {
      Some(v) if v.is_finite() && *v > 0.0 => *v,
      _ => continue,
    };

    seconds_by_zone.add(zone_for_hr(hr, zones), dt);
    total_seconds += dt;
  }

  let mut pct_by_zone = ZoneBreakdown::default();
  if total_seconds > 0.0 {
    pct_by_zone.z1 = seconds_by_zone.z1 / total_seconds * 100.0;
    pct_by_zone.z2 = seconds_by_zone.z2 / total_seconds * 100.0;
    pct_by_zone.z3 = seconds_by_zone.z3 / total_seconds * 100.0;
    pct_by_zone.z4 = seconds_by_zone.z4 / total_seconds * 100.0;
    pct_by_zone.z5 = seconds_by_zone.z5 / total_seconds * 100.0;
  }

  HrZoneSummary {
    total_seconds,
    seconds_by_zone,
    pct_by_zone,
  }
}
