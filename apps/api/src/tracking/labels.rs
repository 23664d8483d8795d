#![allow(dead_code)]

//! Behavioral state labels — the closed label sets the classifier sidecar emits.
//!
//! The sets are closed by contract: anything the sidecar returns outside them
//! (typos, new model classes, garbage) maps to the fallback label rather than
//! opening a new timer bucket. The report shape depends on the sets being fixed.

use serde::{Deserialize, Serialize};

/// Eye-gaze direction for one classified frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EyeState {
    #[serde(rename = "Looking Left")]
    LookingLeft,
    #[serde(rename = "Looking Right")]
    LookingRight,
    #[serde(rename = "Looking Up")]
    LookingUp,
    #[serde(rename = "Looking Down")]
    LookingDown,
    #[serde(rename = "Eyes Focused")]
    Focused,
    #[serde(rename = "Unable to Detect")]
    Undetected,
}

impl EyeState {
    pub const ALL: [EyeState; 6] = [
        EyeState::LookingLeft,
        EyeState::LookingRight,
        EyeState::LookingUp,
        EyeState::LookingDown,
        EyeState::Focused,
        EyeState::Undetected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EyeState::LookingLeft => "Looking Left",
            EyeState::LookingRight => "Looking Right",
            EyeState::LookingUp => "Looking Up",
            EyeState::LookingDown => "Looking Down",
            EyeState::Focused => "Eyes Focused",
            EyeState::Undetected => "Unable to Detect",
        }
    }

    /// Parses a sidecar label, case-insensitively. Unknown labels fall back to
    /// `Undetected` so a misbehaving classifier can never widen the label set.
    pub fn from_label(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(EyeState::Undetected)
    }
}

/// Head position for one classified frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadState {
    #[serde(rename = "Head Centered")]
    Centered,
    #[serde(rename = "Head Not Centered")]
    NotCentered,
    #[serde(rename = "Unable to Detect")]
    Undetected,
}

impl HeadState {
    pub const ALL: [HeadState; 3] = [
        HeadState::Centered,
        HeadState::NotCentered,
        HeadState::Undetected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HeadState::Centered => "Head Centered",
            HeadState::NotCentered => "Head Not Centered",
            HeadState::Undetected => "Unable to Detect",
        }
    }

    pub fn from_label(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(HeadState::Undetected)
    }
}

/// Dominant facial emotion for one classified frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Angry => "Angry",
            Emotion::Fear => "Fear",
            Emotion::Surprise => "Surprise",
            Emotion::Disgust => "Disgust",
        }
    }

    /// Unknown emotions fall back to `Neutral`, matching the sidecar's own
    /// behavior when no face is detected.
    pub fn from_label(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(Emotion::Neutral)
    }
}

/// The (eye, head, emotion) triple describing one classified frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTriple {
    pub eye: EyeState,
    pub head: HeadState,
    pub emotion: Emotion,
}

impl StateTriple {
    pub fn new(eye: EyeState, head: HeadState, emotion: Emotion) -> Self {
        Self { eye, head, emotion }
    }

    /// The triple substituted when the classifier cannot produce a confident
    /// result (no face, corrupt frame, sidecar timeout).
    pub fn fallback() -> Self {
        Self {
            eye: EyeState::Undetected,
            head: HeadState::Undetected,
            emotion: Emotion::Neutral,
        }
    }

    /// Parses raw sidecar labels into a triple, with per-field fallback.
    pub fn from_labels(eye: &str, head: &str, emotion: &str) -> Self {
        Self {
            eye: EyeState::from_label(eye),
            head: HeadState::from_label(head),
            emotion: Emotion::from_label(emotion),
        }
    }
}

impl Default for StateTriple {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_round_trip() {
        for eye in EyeState::ALL {
            assert_eq!(EyeState::from_label(eye.label()), eye);
        }
        for head in HeadState::ALL {
            assert_eq!(HeadState::from_label(head.label()), head);
        }
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_label(emotion.label()), emotion);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(EyeState::from_label("eyes focused"), EyeState::Focused);
        assert_eq!(HeadState::from_label("HEAD CENTERED"), HeadState::Centered);
        assert_eq!(Emotion::from_label("happy"), Emotion::Happy);
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        assert_eq!(EyeState::from_label("Squinting"), EyeState::Undetected);
        assert_eq!(HeadState::from_label("Tilted"), HeadState::Undetected);
        assert_eq!(Emotion::from_label("Contempt"), Emotion::Neutral);
    }

    #[test]
    fn test_fallback_triple() {
        let t = StateTriple::fallback();
        assert_eq!(t.eye, EyeState::Undetected);
        assert_eq!(t.head, HeadState::Undetected);
        assert_eq!(t.emotion, Emotion::Neutral);
        assert_eq!(StateTriple::default(), t);
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&EyeState::Focused).unwrap();
        assert_eq!(json, "\"Eyes Focused\"");
        let json = serde_json::to_string(&HeadState::NotCentered).unwrap();
        assert_eq!(json, "\"Head Not Centered\"");
    }
}
