//! Training Stress Score calculators and routing
//!
//! One pure calculator per sport (power, pace, CSS, heart-rate fallback),
//! plus a router that picks the most plausible method for an activity
//! summary. Nothing here does I/O or holds state; insufficient input is a
//! value (`tss: None`), never an error.

use crate::models::{ActivitySummary, UserSettings};
use crate::sport::{self, Sport};
use serde::{Deserialize, Serialize};

/// Which calculation path produced a score. The wire tags are stable and
/// shown to users alongside the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TssMethod {
  #[serde(rename = "pTSS_np")]
  PowerNp,
  #[serde(rename = "pTSS_avgPower")]
  PowerAvg,
  #[serde(rename = "rTSS_paceStream")]
  RunPaceStream,
  #[serde(rename = "rTSS_avgPace")]
  RunAvgPace,
  #[serde(rename = "sTSS_css")]
  SwimCss,
  #[serde(rename = "hrTSS_lthr")]
  HrLthr,
  #[serde(rename = "n/a")]
  NotAvailable,
}

impl TssMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      TssMethod::PowerNp => "pTSS_np",
      TssMethod::PowerAvg => "pTSS_avgPower",
      TssMethod::RunPaceStream => "rTSS_paceStream",
      TssMethod::RunAvgPace => "rTSS_avgPace",
      TssMethod::SwimCss => "sTSS_css",
      TssMethod::HrLthr => "hrTSS_lthr",
      TssMethod::NotAvailable => "n/a",
    }
  }
}

/// Outcome of one TSS computation. Produced fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssResult {
  /// Non-negative rounded score, or None when inputs are insufficient
  pub tss: Option<i64>,
  pub method: TssMethod,
  /// Short human-readable summary of inputs and IF, for display only
  pub details: String,
}

impl TssResult {
  fn insufficient(reason: &str) -> Self {
    Self {
      tss: None,
      method: TssMethod::NotAvailable,
      details: reason.to_string(),
    }
  }
}

/// Whether an intensity factor gets clamped to [0, 2.0].
///
/// The run, swim, and HR paths always clamp (protects against corrupt
/// sensor data producing absurd scores). The bike path historically does
/// NOT clamp; that inconsistency is preserved behind this knob rather than
/// silently fixed, since clamping it would change historical scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfPolicy {
  Clamped,
  #[default]
  Unclamped,
}

impl IfPolicy {
  fn apply(&self, intensity: f64) -> f64 {
    match self {
      IfPolicy::Clamped => clamp(intensity, 0.0, 2.0),
      IfPolicy::Unclamped => intensity,
    }
  }
}

fn clamp(n: f64, lo: f64, hi: f64) -> f64 {
  n.max(lo).min(hi)
}

fn hours_from_sec(sec: f64) -> f64 {
  sec.max(0.0) / 3600.0
}

/// Present-and-positive filter for optional sensor values.
fn positive(value: Option<f64>) -> Option<f64> {
  value.filter(|v| v.is_finite() && *v > 0.0)
}

/// ---------------------------------------------------------------------------
/// Bike TSS (power-based)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BikeTssInput {
  pub duration_sec: f64,
  /// Functional threshold power, watts
  pub ftp: f64,
  pub normalized_power: Option<f64>,
  pub avg_power: Option<f64>,
  pub if_policy: IfPolicy,
}

/// Power-based TSS: NP preferred, average power as an NP approximation.
///
/// TSS = durationSec * NP * IF / (FTP * 3600) * 100, IF = NP / FTP
pub fn compute_bike_tss(input: &BikeTssInput) -> TssResult {
  if !(input.ftp > 0.0) || !(input.duration_sec > 0.0) {
    return TssResult::insufficient("missing ftp or duration");
  }

  let (np, method) = match positive(input.normalized_power) {
    Some(np) => (np, TssMethod::PowerNp),
    None => match positive(input.avg_power) {
      Some(avg) => (avg, TssMethod::PowerAvg),
      None => return TssResult::insufficient("no power data (np/avgPower missing)"),
    },
  };

  let intensity = input.if_policy.apply(np / input.ftp);
  let tss = input.duration_sec * np * intensity / (input.ftp * 3600.0) * 100.0;

  TssResult {
    tss: Some(tss.round() as i64),
    method,
    details: format!(
      "{}: NP≈{}W, FTP={}W, IF={:.2}",
      method.as_str(),
      np.round(),
      input.ftp.round(),
      intensity
    ),
  }
}

/// ---------------------------------------------------------------------------
/// Run TSS (pace-based)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RunTssInput<'a> {
  pub duration_sec: f64,
  /// Threshold pace, seconds per km
  pub threshold_pace_sec_per_km: f64,
  /// Single average pace, used when no usable stream is present
  pub avg_pace_sec_per_km: Option<f64>,
  /// Per-sample pace stream in seconds per km; entries that are missing,
  /// non-finite, or <= 0 are skipped
  pub pace_stream_sec_per_km: Option<&'a [Option<f64>]>,
}

/// Pace-based TSS: rTSS = hours * IF^2 * 100, IF = avgSpeed / thrSpeed
/// (clamped to [0, 2.0]). A pace stream with at least one valid sample is
/// preferred over the single average pace.
pub fn compute_run_tss(input: &RunTssInput) -> TssResult {
  if !(input.threshold_pace_sec_per_km > 0.0) || !(input.duration_sec > 0.0) {
    return TssResult::insufficient("missing threshold pace or duration");
  }

  let thr_speed = 1000.0 / input.threshold_pace_sec_per_km; // m/s

  if let Some(stream) = input.pace_stream_sec_per_km {
    let mut sum = 0.0;
    let mut count: u64 = 0;
    for pace in stream.iter().filter_map(|p| positive(*p)) {
      sum += pace;
      count += 1;
    }
    if count > 0 {
      let avg_pace = sum / count as f64;
      let avg_speed = 1000.0 / avg_pace;
      let intensity = clamp(avg_speed / thr_speed, 0.0, 2.0);
      let tss = hours_from_sec(input.duration_sec) * intensity * intensity * 100.0;
      return TssResult {
        tss: Some(tss.round() as i64),
        method: TssMethod::RunPaceStream,
        details: format!(
          "rTSS_paceStream: avgPace={:.0}s/km, thr={}s/km, IF={:.2}",
          avg_pace, input.threshold_pace_sec_per_km, intensity
        ),
      };
    }
  }

  let avg_pace = match positive(input.avg_pace_sec_per_km) {
    Some(p) => p,
    None => return TssResult::insufficient("no pace data"),
  };

  let avg_speed = 1000.0 / avg_pace;
  let intensity = clamp(avg_speed / thr_speed, 0.0, 2.0);
  let tss = hours_from_sec(input.duration_sec) * intensity * intensity * 100.0;

  TssResult {
    tss: Some(tss.round() as i64),
    method: TssMethod::RunAvgPace,
    details: format!(
      "rTSS_avgPace: avgPace={:.0}s/km, thr={}s/km, IF={:.2}",
      avg_pace, input.threshold_pace_sec_per_km, intensity
    ),
  }
}

/// ---------------------------------------------------------------------------
/// Swim TSS (CSS-based)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SwimTssInput {
  pub duration_sec: f64,
  pub distance_m: f64,
  /// Critical swim speed, seconds per 100m
  pub css_sec_per_100m: f64,
}

/// CSS-based TSS: IF = CSS / avgPace (pace smaller = faster, so the ratio
/// is css over actual), clamped to [0, 2.0]; sTSS = hours * IF^2 * 100.
pub fn compute_swim_tss(input: &SwimTssInput) -> TssResult {
  if !(input.duration_sec > 0.0) || !(input.distance_m > 0.0) || !(input.css_sec_per_100m > 0.0) {
    return TssResult::insufficient("missing duration/distance/css");
  }

  let avg_pace_sec_per_100 = input.duration_sec / (input.distance_m / 100.0);
  let intensity = clamp(input.css_sec_per_100m / avg_pace_sec_per_100, 0.0, 2.0);
  let tss = hours_from_sec(input.duration_sec) * intensity * intensity * 100.0;

  TssResult {
    tss: Some(tss.round() as i64),
    method: TssMethod::SwimCss,
    details: format!(
      "sTSS_css: avg={:.1}s/100m, css={}s/100m, IF={:.2}",
      avg_pace_sec_per_100, input.css_sec_per_100m, intensity
    ),
  }
}

/// ---------------------------------------------------------------------------
/// Heart-rate fallback
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct HrTssInput {
  pub duration_sec: f64,
  pub avg_hr: Option<f64>,
  /// Lactate threshold heart rate, bpm
  pub lthr: f64,
}

/// HR-based approximation: IF = avgHR / LTHR, clamped to [0, 2.0].
///
/// Provisional - hrTSS/TRIMP formulations differ between methodologies and
/// this is the simplest LTHR-ratio variant.
pub fn compute_hr_tss_fallback(input: &HrTssInput) -> TssResult {
  let avg_hr = match positive(input.avg_hr) {
    Some(hr) if input.duration_sec > 0.0 && input.lthr > 0.0 => hr,
    _ => return TssResult::insufficient("missing avgHR/LTHR/duration"),
  };

  let intensity = clamp(avg_hr / input.lthr, 0.0, 2.0);
  let tss = hours_from_sec(input.duration_sec) * intensity * intensity * 100.0;

  TssResult {
    tss: Some(tss.round() as i64),
    method: TssMethod::HrLthr,
    details: format!(
      "hrTSS_lthr: avgHR={}, LTHR={}, IF={:.2}",
      avg_hr, input.lthr, intensity
    ),
  }
}

/// ---------------------------------------------------------------------------
/// Router
/// ---------------------------------------------------------------------------

/// Compute TSS for an activity summary using the most plausible method.
///
/// Never fails: missing inputs degrade to `{ tss: None, method: n/a }`.
/// At the summary stage the run path only has the average pace; callers
/// that have fetched per-second streams should use
/// [`compute_tss_with_streams`] instead.
pub fn compute_tss_for_activity(activity: &ActivitySummary, settings: &UserSettings) -> TssResult {
  route(activity, settings, None)
}

/// Same routing as [`compute_tss_for_activity`], but the run path uses the
/// supplied pace stream (seconds per km). Other sports ignore it.
pub fn compute_tss_with_streams(
  activity: &ActivitySummary,
  settings: &UserSettings,
  pace_stream_sec_per_km: &[Option<f64>],
) -> TssResult {
  route(activity, settings, Some(pace_stream_sec_per_km))
}

fn route(
  activity: &ActivitySummary,
  settings: &UserSettings,
  pace_stream: Option<&[Option<f64>]>,
) -> TssResult {
  let duration_sec = activity.duration_sec();

  match sport::classify(activity) {
    Sport::Ride => compute_bike_tss(&BikeTssInput {
      duration_sec,
      ftp: settings.ftp,
      normalized_power: activity.weighted_average_watts,
      avg_power: activity.average_watts,
      // Historical bike-path semantics: unclamped
      if_policy: IfPolicy::Unclamped,
    }),
    Sport::Run => {
      let dist = activity.distance.unwrap_or(0.0);
      let avg_pace_sec_per_km = if dist > 0.0 {
        Some(duration_sec / (dist / 1000.0))
      } else {
        None
      };
      compute_run_tss(&RunTssInput {
        duration_sec,
        threshold_pace_sec_per_km: settings.run_threshold_pace_sec_per_km,
        avg_pace_sec_per_km,
        pace_stream_sec_per_km: pace_stream,
      })
    }
    Sport::Swim => compute_swim_tss(&SwimTssInput {
      duration_sec,
      distance_m: activity.distance.unwrap_or(0.0),
      css_sec_per_100m: settings.css_sec_per_100m,
    }),
    // Provisional default for anything unrecognized
    Sport::Other => compute_hr_tss_fallback(&HrTssInput {
      duration_sec,
      avg_hr: activity.average_heartrate,
      lthr: settings.lthr,
    }),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
