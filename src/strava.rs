//! Strava API plumbing: token state, refresh, and activity/stream fetching
//!
//! This is the collaborator that supplies `ActivitySummary` records and raw
//! streams to the TSS engine. The interactive browser authorization flow is
//! out of scope; this module assumes a refresh token already exists and
//! keeps the access token fresh around it.

use crate::models::ActivitySummary;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// ---------------------------------------------------------------------------
/// Configuration and Token State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StravaConfig {
  pub client_id: String,
  pub client_secret: String,
  /// OAuth token endpoint; overridable so tests can point at a mock server
  pub token_url: String,
}

impl StravaConfig {
  pub fn from_env() -> Result<Self, StravaError> {
    dotenvy::dotenv().ok();
    Ok(Self {
      client_id: env::var("STRAVA_CLIENT_ID")
        .map_err(|_| StravaError::MissingConfig("STRAVA_CLIENT_ID".into()))?,
      client_secret: env::var("STRAVA_CLIENT_SECRET")
        .map_err(|_| StravaError::MissingConfig("STRAVA_CLIENT_SECRET".into()))?,
      token_url: STRAVA_TOKEN_URL.to_string(),
    })
  }
}

/// Response from the Strava token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: i64,
}

/// Stored token state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaTokens {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: DateTime<Utc>,
}

impl StravaTokens {
  pub fn from_response(resp: TokenResponse) -> Self {
    Self {
      access_token: resp.access_token,
      refresh_token: resp.refresh_token,
      expires_at: DateTime::from_timestamp(resp.expires_at, 0).unwrap_or_else(Utc::now),
    }
  }

  /// True when the access token is expired or close enough to expiry that
  /// a request made now could outlive it.
  pub fn needs_refresh(&self) -> bool {
    let buffer = Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
    Utc::now() + buffer >= self.expires_at
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StravaError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Strava API error: {0}")]
  Api(String),

  #[error("Not authenticated with Strava")]
  NotAuthenticated,
}

/// ---------------------------------------------------------------------------
/// Token Refresh
/// ---------------------------------------------------------------------------

pub async fn refresh_tokens(
  config: &StravaConfig,
  refresh_token: &str,
) -> Result<StravaTokens, StravaError> {
  let client = Client::new();

  let response = client
    .post(&config.token_url)
    .form(&[
      ("client_id", config.client_id.as_str()),
      ("client_secret", config.client_secret.as_str()),
      ("refresh_token", refresh_token),
      ("grant_type", "refresh_token"),
    ])
    .send()
    .await?;

  if !response.status().is_success() {
    let error_text = response.text().await.unwrap_or_default();
    return Err(StravaError::Api(format!(
      "Token refresh failed: {}",
      error_text
    )));
  }

  let token_response: TokenResponse = response.json().await?;
  Ok(StravaTokens::from_response(token_response))
}

/// ---------------------------------------------------------------------------
/// API Client
/// ---------------------------------------------------------------------------

pub struct StravaClient {
  http: Client,
  base_url: String,
  access_token: String,
}

impl StravaClient {
  pub fn new(access_token: impl Into<String>) -> Self {
    Self::with_base_url(STRAVA_API_BASE, access_token)
  }

  /// Client against a non-default base URL (mock servers in tests).
  pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
    Self {
      http: Client::new(),
      base_url: base_url.into(),
      access_token: access_token.into(),
    }
  }

  /// Fetch recent activity summaries, newest first.
  pub async fn fetch_activities(
    &self,
    after: Option<i64>,
    per_page: u32,
  ) -> Result<Vec<ActivitySummary>, StravaError> {
    let mut url = Url::parse(&format!("{}/athlete/activities", self.base_url))
      .map_err(|e| StravaError::Api(e.to_string()))?;
    url
      .query_pairs_mut()
      .append_pair("per_page", &per_page.to_string());
    if let Some(after_timestamp) = after {
      url
        .query_pairs_mut()
        .append_pair("after", &after_timestamp.to_string());
    }

    let response = self
      .http
      .get(url)
      .header("Authorization", format!("Bearer {}", self.access_token))
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
      return Err(StravaError::NotAuthenticated);
    }

    if !response.status().is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::Api(format!(
        "Failed to fetch activities: {}",
        error_text
      )));
    }

    let response_text = response.text().await?;

    let activities: Vec<ActivitySummary> = serde_json::from_str(&response_text).map_err(|e| {
      eprintln!("Failed to parse Strava response: {}", e);
      eprintln!(
        "Raw response (first 1000 chars): {}",
        &response_text[..response_text.len().min(1000)]
      );
      StravaError::Api(format!("Failed to parse activities: {}", e))
    })?;

    Ok(activities)
  }

  /// Fetch activity streams keyed by type. 404 means the activity has no
  /// streams (manual entry) and yields an empty set.
  pub async fn fetch_activity_streams(
    &self,
    activity_id: i64,
  ) -> Result<ActivityStreams, StravaError> {
    let mut url = Url::parse(&format!(
      "{}/activities/{}/streams",
      self.base_url, activity_id
    ))
    .map_err(|e| StravaError::Api(e.to_string()))?;
    url
      .query_pairs_mut()
      .append_pair("keys", "time,heartrate,velocity_smooth")
      .append_pair("key_by_type", "true");

    let response = self
      .http
      .get(url)
      .header("Authorization", format!("Bearer {}", self.access_token))
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
      return Err(StravaError::NotAuthenticated);
    }

    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(ActivityStreams::default());
    }

    if !response.status().is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::Api(format!(
        "Failed to fetch streams: {}",
        error_text
      )));
    }

    let response_text = response.text().await?;

    // key_by_type=true gives an object keyed by stream name:
    // {"heartrate": {"data": [...]}, "velocity_smooth": {"data": [...]}}
    let streams: ActivityStreams = serde_json::from_str(&response_text).map_err(|e| {
      eprintln!("Failed to parse streams response: {}", e);
      eprintln!(
        "Raw response (first 500 chars): {}",
        &response_text[..response_text.len().min(500)]
      );
      StravaError::Api(format!("Failed to parse streams: {}", e))
    })?;

    Ok(streams)
  }
}

/// ---------------------------------------------------------------------------
/// Streams
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamData {
  #[serde(default)]
  pub data: Vec<serde_json::Value>,
}

/// Keyed streams for one activity. Streams Strava did not return stay empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityStreams {
  #[serde(default)]
  pub time: StreamData,
  #[serde(default)]
  pub heartrate: StreamData,
  #[serde(default)]
  pub velocity_smooth: StreamData,
}

impl ActivityStreams {
  pub fn is_empty(&self) -> bool {
    self.heartrate.data.is_empty() && self.velocity_smooth.data.is_empty()
  }

  /// Per-sample pace in seconds per km, derived from the velocity stream
  /// (m/s). Stationary or missing samples become `None` so the run
  /// calculator skips them.
  pub fn pace_sec_per_km(&self) -> Vec<Option<f64>> {
    self
      .velocity_smooth
      .data
      .iter()
      .map(|v| match v.as_f64() {
        Some(mps) if mps > 0.0 => Some(1000.0 / mps),
        _ => None,
      })
      .collect()
  }

  /// Per-sample heart rate in bpm, suitable for `zones::summarize_hr_zones`.
  pub fn hr_series(&self) -> Vec<Option<f64>> {
    self.heartrate.data.iter().map(|v| v.as_f64()).collect()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn test_tokens_needs_refresh_near_expiry() {
    let fresh = StravaTokens {
      access_token: "a".into(),
      refresh_token: "r".into(),
      expires_at: Utc::now() + Duration::hours(2),
    };
    assert!(!fresh.needs_refresh());

    let stale = StravaTokens {
      expires_at: Utc::now() + Duration::minutes(2), // inside the buffer
      ..fresh.clone()
    };
    assert!(stale.needs_refresh());

    let expired = StravaTokens {
      expires_at: Utc::now() - Duration::hours(1),
      ..fresh
    };
    assert!(expired.needs_refresh());
  }

  #[test]
  #[serial]
  fn test_config_from_env() {
    temp_env::with_vars(
      [
        ("STRAVA_CLIENT_ID", Some("12345")),
        ("STRAVA_CLIENT_SECRET", Some("s3cret")),
      ],
      || {
        let config = StravaConfig::from_env().unwrap();
        assert_eq!(config.client_id, "12345");
        assert_eq!(config.client_secret, "s3cret");
        assert_eq!(config.token_url, STRAVA_TOKEN_URL);
      },
    );
  }

  #[test]
  #[serial]
  fn test_config_from_env_missing_secret() {
    temp_env::with_vars(
      [
        ("STRAVA_CLIENT_ID", Some("12345")),
        ("STRAVA_CLIENT_SECRET", None::<&str>),
      ],
      || {
        let err = StravaConfig::from_env().unwrap_err();
        assert!(matches!(err, StravaError::MissingConfig(_)));
      },
    );
  }

  #[tokio::test]
  async fn test_refresh_tokens_parses_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/oauth/token")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"{"access_token":"new-access","refresh_token":"new-refresh","expires_at":4102444800}"#,
      )
      .create_async()
      .await;

    let config = StravaConfig {
      client_id: "id".into(),
      client_secret: "secret".into(),
      token_url: format!("{}/oauth/token", server.url()),
    };

    let tokens = refresh_tokens(&config, "old-refresh").await.unwrap();
    assert_eq!(tokens.access_token, "new-access");
    assert_eq!(tokens.refresh_token, "new-refresh");
    assert!(!tokens.needs_refresh());

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_refresh_tokens_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/oauth/token")
      .with_status(400)
      .with_body(r#"{"message":"Bad Request"}"#)
      .create_async()
      .await;

    let config = StravaConfig {
      client_id: "id".into(),
      client_secret: "secret".into(),
      token_url: format!("{}/oauth/token", server.url()),
    };

    let err = refresh_tokens(&config, "old-refresh").await.unwrap_err();
    assert!(matches!(err, StravaError::Api(_)));
  }

  #[tokio::test]
  async fn test_fetch_activities_deserializes_summaries() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/athlete/activities?per_page=2&after=1700000000")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"[
          {"id": 1, "name": "Lunch Ride", "type": "Ride", "sport_type": "VirtualRide",
           "moving_time": 3600, "distance": 30000.0,
           "average_watts": 180.0, "weighted_average_watts": 195.0},
          {"id": 2, "name": "Evening Run", "type": "Run",
           "moving_time": 1800, "distance": 5000.0, "average_heartrate": 152.0}
        ]"#,
      )
      .create_async()
      .await;

    let client = StravaClient::with_base_url(server.url(), "token");
    let activities = client
      .fetch_activities(Some(1_700_000_000), 2)
      .await
      .unwrap();

    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].sport_type.as_deref(), Some("VirtualRide"));
    assert_eq!(activities[0].weighted_average_watts, Some(195.0));
    assert_eq!(activities[1].duration_sec(), 1800.0);
  }

  #[tokio::test]
  async fn test_fetch_activities_401_maps_to_not_authenticated() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/athlete/activities?per_page=30")
      .with_status(401)
      .with_body(r#"{"message":"Authorization Error"}"#)
      .create_async()
      .await;

    let client = StravaClient::with_base_url(server.url(), "expired");
    let err = client.fetch_activities(None, 30).await.unwrap_err();
    assert!(matches!(err, StravaError::NotAuthenticated));
  }

  #[tokio::test]
  async fn test_fetch_streams_keyed_format() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock(
        "GET",
        "/activities/42/streams?keys=time%2Cheartrate%2Cvelocity_smooth&key_by_type=true",
      )
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        r#"{
          "time": {"data": [0, 1, 2, 3]},
          "heartrate": {"data": [140, 142, 0, 145]},
          "velocity_smooth": {"data": [3.2, 3.3, 0.0, 3.4]}
        }"#,
      )
      .create_async()
      .await;

    let client = StravaClient::with_base_url(server.url(), "token");
    let streams = client.fetch_activity_streams(42).await.unwrap();

    assert!(!streams.is_empty());

    let pace = streams.pace_sec_per_km();
    assert_eq!(pace.len(), 4);
    assert!((pace[0].unwrap() - 312.5).abs() < 0.01); // 1000 / 3.2
    assert_eq!(pace[2], None); // stationary sample

    let hr = streams.hr_series();
    assert_eq!(hr, vec![Some(140.0), Some(142.0), Some(0.0), Some(145.0)]);
  }

  #[tokio::test]
  async fn test_fetch_streams_404_yields_empty() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock(
        "GET",
        mockito::Matcher::Regex(r"^/activities/7/streams.*".to_string()),
      )
      .with_status(404)
      .with_body(r#"{"message":"Record Not Found"}"#)
      .create_async()
      .await;

    let client = StravaClient::with_base_url(server.url(), "token");
    let streams = client.fetch_activity_streams(7).await.unwrap();
    assert!(streams.is_empty());
  }
}
