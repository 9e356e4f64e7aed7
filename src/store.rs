//! SQLite-backed settings and token store
//!
//! The TSS engine itself is pure; this module is the storage collaborator
//! that owns the athlete's settings row and the Strava token state. Settings
//! are saved as an atomic full-row replace - no partial merge - and a
//! missing row falls back to the explicit `UserSettings::default()` value.

use crate::models::{HrZonesBpm, UserSettings};
use crate::strava::StravaTokens;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;

pub type DbPool = SqlitePool;

const STRAVA_SOURCE: &str = "strava";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}

/// Open (creating if needed) the store at the given path and run migrations.
pub async fn open_store(db_path: &Path) -> Result<DbPool, StoreError> {
  if let Some(parent) = db_path.parent() {
    fs::create_dir_all(parent)?;
  }

  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}

/// In-memory store, used by tests.
///
/// max_connections(1) keeps every connection on the same in-memory database;
/// a larger pool would hand out fresh empty databases.
pub async fn open_in_memory() -> Result<DbPool, StoreError> {
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Settings
/// ---------------------------------------------------------------------------

type SettingsRow = (
  f64,         // max_hr
  f64,         // lthr
  f64,         // ftp
  Option<f64>, // resting_hr
  Option<f64>, // weight_kg
  f64,         // run_threshold_pace_sec_per_km
  f64,         // css_sec_per_100m
  f64,         // z1_max
  f64,
  f64,
  f64,
  f64,
);

/// Load the athlete's settings, or the documented defaults when none have
/// been saved yet.
pub async fn load_settings(pool: &DbPool) -> Result<UserSettings, StoreError> {
  let row: Option<SettingsRow> = sqlx::query_as(
    r#"
    SELECT max_hr, lthr, ftp, resting_hr, weight_kg,
           run_threshold_pace_sec_per_km, css_sec_per_100m,
           z1_max, z2_max, z3_max, z4_max, z5_max
    FROM user_settings WHERE id = 1
    "#,
  )
  .fetch_optional(pool)
  .await?;

  match row {
    Some((
      max_hr,
      lthr,
      ftp,
      resting_hr,
      weight_kg,
      run_threshold_pace_sec_per_km,
      css_sec_per_100m,
      z1_max,
      z2_max,
      z3_max,
      z4_max,
      z5_max,
    )) => Ok(UserSettings {
      max_hr,
      lthr,
      ftp,
      resting_hr,
      weight_kg,
      run_threshold_pace_sec_per_km,
      css_sec_per_100m,
      hr_zones: HrZonesBpm {
        z1_max,
        z2_max,
        z3_max,
        z4_max,
        z5_max,
      },
    }),
    None => Ok(UserSettings::default()),
  }
}

/// Save settings as a full-row replace.
pub async fn save_settings(pool: &DbPool, settings: &UserSettings) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO user_settings (
      id, max_hr, lthr, ftp, resting_hr, weight_kg,
      run_threshold_pace_sec_per_km, css_sec_per_100m,
      z1_max, z2_max, z3_max, z4_max, z5_max, updated_at
    )
    VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, CURRENT_TIMESTAMP)
    ON CONFLICT(id) DO UPDATE SET
      max_hr = excluded.max_hr,
      lthr = excluded.lthr,
      ftp = excluded.ftp,
      resting_hr = excluded.resting_hr,
      weight_kg = excluded.weight_kg,
      run_threshold_pace_sec_per_km = excluded.run_threshold_pace_sec_per_km,
      css_sec_per_100m = excluded.css_sec_per_100m,
      z1_max = excluded.z1_max,
      z2_max = excluded.z2_max,
      z3_max = excluded.z3_max,
      z4_max = excluded.z4_max,
      z5_max = excluded.z5_max,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(settings.max_hr)
  .bind(settings.lthr)
  .bind(settings.ftp)
  .bind(settings.resting_hr)
  .bind(settings.weight_kg)
  .bind(settings.run_threshold_pace_sec_per_km)
  .bind(settings.css_sec_per_100m)
  .bind(settings.hr_zones.z1_max)
  .bind(settings.hr_zones.z2_max)
  .bind(settings.hr_zones.z3_max)
  .bind(settings.hr_zones.z4_max)
  .bind(settings.hr_zones.z5_max)
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Strava Tokens
/// ---------------------------------------------------------------------------

pub async fn load_tokens(pool: &DbPool) -> Result<Option<StravaTokens>, StoreError> {
  let row: Option<(Option<String>, Option<String>, Option<DateTime<Utc>>)> = sqlx::query_as(
    "SELECT access_token, refresh_token, token_expires_at FROM sync_state WHERE source = ?1",
  )
  .bind(STRAVA_SOURCE)
  .fetch_optional(pool)
  .await?;

  Ok(match row {
    Some((Some(access_token), Some(refresh_token), Some(expires_at))) => Some(StravaTokens {
      access_token,
      refresh_token,
      expires_at,
    }),
    _ => None,
  })
}

pub async fn save_tokens(pool: &DbPool, tokens: &StravaTokens) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO sync_state (source, access_token, refresh_token, token_expires_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(source) DO UPDATE SET
      access_token = excluded.access_token,
      refresh_token = excluded.refresh_token,
      token_expires_at = excluded.token_expires_at
    "#,
  )
  .bind(STRAVA_SOURCE)
  .bind(&tokens.access_token)
  .bind(&tokens.refresh_token)
  .bind(tokens.expires_at)
  .execute(pool)
  .await?;

  Ok(())
}

/// Disconnect: token columns are nulled but sync bookkeeping is kept.
pub async fn clear_tokens(pool: &DbPool) -> Result<(), StoreError> {
  sqlx::query(
    "UPDATE sync_state SET access_token = NULL, refresh_token = NULL,
         token_expires_at = NULL WHERE source = ?1",
  )
  .bind(STRAVA_SOURCE)
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Sync Bookkeeping
/// ---------------------------------------------------------------------------

/// Timestamp of the last successful activity sync, for incremental fetches.
pub async fn last_sync_at(pool: &DbPool) -> Result<Option<DateTime<Utc>>, StoreError> {
  let row: Option<(Option<DateTime<Utc>>,)> =
    sqlx::query_as("SELECT last_sync_at FROM sync_state WHERE source = ?1")
      .bind(STRAVA_SOURCE)
      .fetch_optional(pool)
      .await?;

  Ok(row.and_then(|(at,)| at))
}

pub async fn mark_synced(pool: &DbPool, at: DateTime<Utc>) -> Result<(), StoreError> {
  sqlx::query(
    r#"
    INSERT INTO sync_state (source, last_sync_at)
    VALUES (?1, ?2)
    ON CONFLICT(source) DO UPDATE SET last_sync_at = excluded.last_sync_at
    "#,
  )
  .bind(STRAVA_SOURCE)
  .bind(at)
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
