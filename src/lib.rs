//! Training load engine for Strava activities
//!
//! The core is a set of pure computations: sport classification, heart-rate
//! zone analysis, and per-sport Training Stress Score calculators behind a
//! single routing entry point. Around it sit the two collaborators the core
//! needs fed: a Strava client (activities, streams, token refresh) and a
//! SQLite settings/token store.

pub mod models;
pub mod sport;
pub mod store;
pub mod strava;
pub mod tss;
pub mod zones;

#[cfg(test)]
pub mod test_utils;

pub use models::{ActivitySummary, HrZonesBpm, UserSettings};
pub use sport::Sport;
pub use tss::{compute_tss_for_activity, compute_tss_with_streams, TssMethod, TssResult};
pub use zones::{summarize_hr_zones, zone_for_hr, HrZone, HrZoneSummary};
