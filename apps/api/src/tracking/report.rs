//! Report generation — point-in-time session summaries and the attention score.
//!
//! The report shape (maps of `{seconds, formatted}` per label) matches what the
//! product's report store persists, so a frontend can forward it unmodified.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tracking::labels::{Emotion, EyeState, HeadState};
use crate::tracking::session::SessionTracker;

/// Attention score weights: eye focus dominates, head position second,
/// positive emotion (happy + surprise) last.
const EYE_WEIGHT: f64 = 0.5;
const HEAD_WEIGHT: f64 = 0.3;
const EMOTION_WEIGHT: f64 = 0.2;

/// One duration bucket, in raw seconds plus an `HH:MM:SS` rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTiming {
    pub seconds: f64,
    pub formatted: String,
}

impl StateTiming {
    fn new(seconds: f64) -> Self {
        Self {
            seconds,
            formatted: format_hms(seconds),
        }
    }
}

/// Full session summary returned by the report endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub total_time: StateTiming,
    pub eye_states: BTreeMap<String, StateTiming>,
    pub head_states: BTreeMap<String, StateTiming>,
    pub emotions: BTreeMap<String, StateTiming>,
    pub frames_processed: u64,
    pub attention_score: f64,
    pub generated_at: DateTime<Utc>,
}

impl SessionReport {
    /// Builds a report from a tracker. The caller is expected to have flushed
    /// the tracker at `now` first so the in-flight interval is included.
    pub fn from_tracker(tracker: &SessionTracker, now: DateTime<Utc>) -> Self {
        let total_seconds = (now - tracker.start_time()).num_milliseconds().max(0) as f64 / 1000.0;

        Self {
            session_id: tracker.id(),
            total_time: StateTiming::new(total_seconds),
            eye_states: EyeState::ALL
                .iter()
                .map(|s| (s.label().to_string(), StateTiming::new(tracker.eye_duration(*s))))
                .collect(),
            head_states: HeadState::ALL
                .iter()
                .map(|s| (s.label().to_string(), StateTiming::new(tracker.head_duration(*s))))
                .collect(),
            emotions: Emotion::ALL
                .iter()
                .map(|e| (e.label().to_string(), StateTiming::new(tracker.emotion_duration(*e))))
                .collect(),
            frames_processed: tracker.frames_processed(),
            attention_score: attention_score(tracker),
            generated_at: now,
        }
    }
}

/// Weighted 0–100 attention score:
/// `0.5 * focused-eye share + 0.3 * centered-head share + 0.2 * positive-emotion share`,
/// each share expressed as a percentage of its own clock. A zero-denominator
/// term contributes 0 instead of dividing by zero.
pub fn attention_score(tracker: &SessionTracker) -> f64 {
    let total = tracker.tracked_seconds();
    let positive_emotion =
        tracker.emotion_duration(Emotion::Happy) + tracker.emotion_duration(Emotion::Surprise);

    let score = EYE_WEIGHT * share(tracker.eye_duration(EyeState::Focused), total)
        + HEAD_WEIGHT * share(tracker.head_duration(HeadState::Centered), total)
        + EMOTION_WEIGHT * share(positive_emotion, total);

    score.clamp(0.0, 100.0)
}

fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Renders seconds as `HH:MM:SS`, truncating sub-second precision.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::labels::StateTriple;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2026-01-15T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.9), "00:00:59");
        assert_eq!(format_hms(61.0), "00:01:01");
        assert_eq!(format_hms(3661.0), "01:01:01");
        assert_eq!(format_hms(-5.0), "00:00:00");
    }

    #[test]
    fn test_fresh_session_scores_zero() {
        let tracker = SessionTracker::new(Uuid::new_v4(), t0());
        assert_eq!(attention_score(&tracker), 0.0);
    }

    #[test]
    fn test_fully_attentive_session_scores_100() {
        let mut tracker = SessionTracker::new(Uuid::new_v4(), t0());
        let attentive = StateTriple::new(EyeState::Focused, HeadState::Centered, Emotion::Happy);
        tracker.observe(attentive, t0());
        tracker.observe(attentive, t0() + Duration::seconds(10));
        let score = attention_score(&tracker);
        assert!((score - 100.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_half_focused_session() {
        let mut tracker = SessionTracker::new(Uuid::new_v4(), t0());
        let attentive = StateTriple::new(EyeState::Focused, HeadState::Centered, Emotion::Happy);
        let away = StateTriple::new(EyeState::LookingLeft, HeadState::NotCentered, Emotion::Sad);
        tracker.observe(attentive, t0());
        tracker.observe(away, t0() + Duration::seconds(5));
        tracker.observe(away, t0() + Duration::seconds(10));
        // Each term at 50%: 0.5*50 + 0.3*50 + 0.2*50 = 50
        let score = attention_score(&tracker);
        assert!((score - 50.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_score_bounded_for_any_distribution() {
        let mut tracker = SessionTracker::new(Uuid::new_v4(), t0());
        tracker.observe(StateTriple::fallback(), t0());
        tracker.observe(StateTriple::fallback(), t0() + Duration::seconds(30));
        let score = attention_score(&tracker);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_report_covers_every_label() {
        let tracker = SessionTracker::new(Uuid::new_v4(), t0());
        let report = SessionReport::from_tracker(&tracker, t0());
        assert_eq!(report.eye_states.len(), EyeState::ALL.len());
        assert_eq!(report.head_states.len(), HeadState::ALL.len());
        assert_eq!(report.emotions.len(), Emotion::ALL.len());
        assert_eq!(report.frames_processed, 0);
        assert_eq!(report.attention_score, 0.0);
        assert_eq!(report.total_time.seconds, 0.0);
    }

    #[test]
    fn test_report_total_time_runs_from_start() {
        let mut tracker = SessionTracker::new(Uuid::new_v4(), t0());
        let now = t0() + Duration::seconds(90);
        tracker.flush(now);
        let report = SessionReport::from_tracker(&tracker, now);
        assert_eq!(report.total_time.seconds, 90.0);
        assert_eq!(report.total_time.formatted, "00:01:30");
    }
}
