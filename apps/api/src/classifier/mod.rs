//! Frame Classifier — the single point of entry for all inference calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the inference sidecar
//! directly. All per-frame classification (eye gaze, head pose, emotion) goes
//! through the `FrameClassifier` trait here.
//!
//! `AppState` holds an `Arc<dyn FrameClassifier>`; the default backend is
//! `HttpFrameClassifier`, which POSTs frame bytes to the sidecar's `/classify`
//! endpoint. Callers are expected to map any `ClassifierError` to
//! `StateTriple::fallback()` — a bad frame must never abort a session.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::tracking::labels::StateTriple;

const CLASSIFY_PATH: &str = "/classify";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sidecar error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw response shape of the sidecar's `/classify` endpoint.
#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    eye_status: String,
    head_status: String,
    emotion: String,
}

/// The frame classifier trait. Implement this to swap inference backends
/// without touching the handlers or the tracker.
#[async_trait]
pub trait FrameClassifier: Send + Sync {
    /// Classifies one image frame into its (eye, head, emotion) triple.
    async fn classify(&self, frame: &[u8]) -> Result<StateTriple, ClassifierError>;
}

/// HTTP backend: the face-mesh/emotion inference sidecar.
///
/// The reqwest client carries a built-in timeout so a hung inference call
/// surfaces as an error (and therefore a fallback label) instead of blocking
/// the request forever.
pub struct HttpFrameClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFrameClassifier {
    pub fn new(base_url: String, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(timeout_ms))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FrameClassifier for HttpFrameClassifier {
    async fn classify(&self, frame: &[u8]) -> Result<StateTriple, ClassifierError> {
        let url = format!("{}{}", self.base_url, CLASSIFY_PATH);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(frame.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ClassifyResponse = response.json().await?;
        debug!(
            "Classified frame: eye={}, head={}, emotion={}",
            parsed.eye_status, parsed.head_status, parsed.emotion
        );

        // Unknown labels map to the fallback variants here, keeping the label
        // sets closed no matter what the sidecar returns.
        Ok(StateTriple::from_labels(
            &parsed.eye_status,
            &parsed.head_status,
            &parsed.emotion,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::labels::{Emotion, EyeState, HeadState};

    #[test]
    fn test_sidecar_response_parses_into_triple() {
        let raw = r#"{"eye_status": "Eyes Focused", "head_status": "Head Centered", "emotion": "Happy"}"#;
        let parsed: ClassifyResponse = serde_json::from_str(raw).unwrap();
        let triple =
            StateTriple::from_labels(&parsed.eye_status, &parsed.head_status, &parsed.emotion);
        assert_eq!(triple.eye, EyeState::Focused);
        assert_eq!(triple.head, HeadState::Centered);
        assert_eq!(triple.emotion, Emotion::Happy);
    }

    #[test]
    fn test_unknown_sidecar_labels_close_to_fallback() {
        let triple = StateTriple::from_labels("Cross-eyed", "Upside Down", "Bewildered");
        assert_eq!(triple.eye, EyeState::Undetected);
        assert_eq!(triple.head, HeadState::Undetected);
        assert_eq!(triple.emotion, Emotion::Neutral);
    }
}
