//! Sport classification over Strava's open-ended activity taxonomy
//!
//! Strava produces many variant type labels ("VirtualRide", "TrailRun",
//! "EBikeRide", ...), so classification is substring containment over an
//! ordered rule list rather than exact matching against an enumeration.

use crate::models::ActivitySummary;
use serde::{Deserialize, Serialize};

/// Normalized sport category used to pick a TSS calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
  Ride,
  Run,
  Swim,
  Other,
}

impl Sport {
  pub fn as_str(&self) -> &'static str {
    match self {
      Sport::Ride => "ride",
      Sport::Run => "run",
      Sport::Swim => "swim",
      Sport::Other => "other",
    }
  }
}

/// Classification rules, evaluated in order, first match wins.
const SPORT_RULES: &[(&[&str], Sport)] = &[
  (&["ride", "bike", "cycling"], Sport::Ride),
  (&["run"], Sport::Run),
  (&["swim"], Sport::Swim),
];

/// Classify a raw activity type string.
pub fn classify_type(raw: &str) -> Sport {
  let lowered = raw.to_lowercase();
  for (needles, sport) in SPORT_RULES {
    if needles.iter().any(|n| lowered.contains(n)) {
      return *sport;
    }
  }
  Sport::Other
}

/// Classify an activity, preferring the more specific `sport_type` field
/// over the legacy `type` field.
pub fn classify(activity: &ActivitySummary) -> Sport {
  let raw = activity
    .sport_type
    .as_deref()
    .filter(|s| !s.is_empty())
    .unwrap_or(&activity.activity_type);
  classify_type(raw)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::mock_activity;

  #[test]
  fn test_ride_variants_classify_as_ride() {
    assert_eq!(classify_type("Ride"), Sport::Ride);
    assert_eq!(classify_type("VirtualRide"), Sport::Ride);
    assert_eq!(classify_type("MountainBikeRide"), Sport::Ride);
    assert_eq!(classify_type("Handcycling"), Sport::Ride);
    assert_eq!(classify_type("EBikeRide"), Sport::Ride);
  }

  #[test]
  fn test_run_and_swim_variants() {
    assert_eq!(classify_type("Run"), Sport::Run);
    assert_eq!(classify_type("TrailRun"), Sport::Run);
    assert_eq!(classify_type("VirtualRun"), Sport::Run);
    assert_eq!(classify_type("Swim"), Sport::Swim);
    assert_eq!(classify_type("OpenWaterSwim"), Sport::Swim);
  }

  #[test]
  fn test_unknown_types_fall_through_to_other() {
    assert_eq!(classify_type("Yoga"), Sport::Other);
    assert_eq!(classify_type("WeightTraining"), Sport::Other);
    assert_eq!(classify_type(""), Sport::Other);
  }

  #[test]
  fn test_classification_is_case_insensitive() {
    assert_eq!(classify_type("RIDE"), Sport::Ride);
    assert_eq!(classify_type("swim"), Sport::Swim);
  }

  #[test]
  fn test_sport_type_preferred_over_legacy_type() {
    let mut activity = mock_activity("Workout");
    activity.sport_type = Some("GravelRide".to_string());
    assert_eq!(classify(&activity), Sport::Ride);

    // Empty sport_type falls back to the legacy field
    activity.sport_type = Some(String::new());
    activity.activity_type = "Run".to_string();
    assert_eq!(classify(&activity), Sport::Run);

    activity.sport_type = None;
    assert_eq!(classify(&activity), Sport::Run);
  }
}
