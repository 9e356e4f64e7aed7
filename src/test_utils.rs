//! Test utilities and helpers
//!
//! Mock data factories, database setup/teardown, and assertion helpers
//! shared by the module tests.

use crate::models::{ActivitySummary, HrZonesBpm, UserSettings};
use crate::store::DbPool;
use chrono::Utc;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory store for testing, with migrations applied.
pub async fn setup_test_db() -> DbPool {
  crate::store::open_in_memory()
    .await
    .expect("Failed to create in-memory database")
}

pub async fn teardown_test_db(pool: DbPool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Settings with round threshold numbers that make expected scores easy to
/// compute by hand.
pub fn mock_settings() -> UserSettings {
  UserSettings {
    max_hr: 180.0,
    lthr: 160.0,
    ftp: 200.0,
    resting_hr: Some(55.0),
    weight_kg: Some(63.0),
    run_threshold_pace_sec_per_km: 300.0,
    css_sec_per_100m: 140.0,
    hr_zones: mock_zones(),
  }
}

pub fn mock_zones() -> HrZonesBpm {
  HrZonesBpm {
    z1_max: 120.0,
    z2_max: 140.0,
    z3_max: 155.0,
    z4_max: 170.0,
    z5_max: 180.0,
  }
}

/// A bare activity of the given type; tests fill in the fields they need.
pub fn mock_activity(activity_type: &str) -> ActivitySummary {
  ActivitySummary {
    id: 123456,
    name: format!("Morning {}", activity_type),
    activity_type: activity_type.to_string(),
    sport_type: None,
    start_date: Some(Utc::now()),
    moving_time: None,
    elapsed_time: None,
    distance: None,
    average_watts: None,
    weighted_average_watts: None,
    average_heartrate: None,
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('user_settings', 'sync_state')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 2, "Expected both tables, got {:?}", tables);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let settings = mock_settings();
    assert!(settings.ftp > 0.0);
    assert_eq!(settings.hr_zones, mock_zones());

    let activity = mock_activity("Run");
    assert_eq!(activity.activity_type, "Run");
    assert_eq!(activity.duration_sec(), 0.0);
  }
}
