use std::collections::BTreeMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::FrameClassifier;
use crate::errors::AppError;
use crate::state::AppState;
use crate::tracking::labels::{Emotion, EyeState, HeadState, StateTriple};
use crate::tracking::registry::SharedSession;
use crate::tracking::report::{attention_score, format_hms, SessionReport};
use crate::tracking::session::SessionTracker;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// Per-frame analysis returned on every submitted frame: the frame's classified
/// triple plus the running totals, so a frontend can render a live dashboard
/// without polling the report endpoint.
#[derive(Serialize)]
pub struct FrameAnalysis {
    pub session_id: Uuid,
    pub eye_status: EyeState,
    pub head_status: HeadState,
    pub emotion: Emotion,
    pub frames_processed: u64,
    pub eye_timers: BTreeMap<String, String>,
    pub head_timers: BTreeMap<String, String>,
    pub emotion_timers: BTreeMap<String, String>,
    pub total_time: String,
    pub attention_score: f64,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session_id = state.registry.create().await;
    info!("Created session {session_id}");
    Ok(Json(CreateSessionResponse { session_id }))
}

/// POST /api/v1/sessions/:id/frames
///
/// Multipart upload, field `frame` = raw image bytes. The classifier call runs
/// before the session lock is taken, so a slow inference never serializes
/// unrelated sessions.
pub async fn handle_submit_frame(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<FrameAnalysis>, AppError> {
    let session = state.registry.get(id).await?;

    let frame = read_frame_field(&mut multipart).await?;
    validate_frame(&frame)?;

    let triple = classify_or_fallback(state.classifier.as_ref(), &frame).await;

    let mut tracker = session.lock().await;
    let now = Utc::now();
    tracker.observe(triple, now);
    Ok(Json(build_frame_analysis(&tracker, triple, now)))
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

/// GET /api/v1/sessions/:id/report
///
/// Flushes the in-flight interval before computing totals, so a report
/// requested mid-state is accurate up to now. `?format=download` serves the
/// same JSON as an attachment.
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let session = state.registry.get(id).await?;

    let mut tracker = session.lock().await;
    let now = Utc::now();
    tracker.flush(now);
    let report = SessionReport::from_tracker(&tracker, now);
    drop(tracker);

    if params.format.as_deref() == Some("download") {
        let disposition = format!("attachment; filename=\"session-report-{id}.json\"");
        Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(report)).into_response())
    } else {
        Ok(Json(report).into_response())
    }
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = state.registry.get(id).await?;
    session.lock().await.reset(Utc::now());
    info!("Reset timers for session {id}");
    Ok(Json(json!({ "message": "Timers reset", "session_id": id })))
}

/// GET /api/v1/sessions/:id/stream
///
/// WebSocket upgrade: each inbound message is one frame (binary bytes, or text
/// carrying a base64/data-URL payload), each outbound message is that frame's
/// analysis. Closing the connection ends the stream but not the session.
pub async fn handle_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let session = state.registry.get(id).await?;
    Ok(ws.on_upgrade(move |socket| stream_session(socket, state, session, id)))
}

async fn stream_session(mut socket: WebSocket, state: AppState, session: SharedSession, id: Uuid) {
    info!("Connected to session stream {id}");

    while let Some(Ok(msg)) = socket.recv().await {
        let frame: Bytes = match msg {
            Message::Binary(bytes) => bytes.into(),
            Message::Text(text) => match decode_base64_frame(&text) {
                Ok(bytes) => bytes.into(),
                Err(e) => {
                    // Bad frame: report inline and keep the stream (and the
                    // session) alive. The last completed update stays valid.
                    if send_error(&mut socket, &e).await.is_err() {
                        break;
                    }
                    continue;
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum automatically.
            _ => continue,
        };

        if let Err(e) = validate_frame(&frame) {
            if send_error(&mut socket, &e).await.is_err() {
                break;
            }
            continue;
        }

        let triple = classify_or_fallback(state.classifier.as_ref(), &frame).await;

        let analysis = {
            let mut tracker = session.lock().await;
            let now = Utc::now();
            tracker.observe(triple, now);
            build_frame_analysis(&tracker, triple, now)
        };

        let payload = match serde_json::to_string(&analysis) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to serialize frame analysis: {e}");
                continue;
            }
        };
        if socket.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }

    info!("Disconnected from session stream {id}");
}

async fn send_error(socket: &mut WebSocket, error: &AppError) -> Result<(), axum::Error> {
    let body = json!({ "error": { "code": "INVALID_FRAME", "message": error.to_string() } });
    socket.send(Message::Text(body.to_string())).await
}

/// Pulls the `frame` field out of a multipart upload.
async fn read_frame_field(multipart: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("frame") {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read frame field: {e}")));
        }
    }
    Err(AppError::Validation(
        "Missing multipart field 'frame'".to_string(),
    ))
}

/// Rejects bytes that cannot be an image before they reach the classifier.
/// On rejection the session is left unmodified.
fn validate_frame(frame: &[u8]) -> Result<(), AppError> {
    if frame.is_empty() {
        return Err(AppError::InvalidFrame("Empty frame".to_string()));
    }
    image::guess_format(frame)
        .map(|_| ())
        .map_err(|_| AppError::InvalidFrame("Bytes do not decode as an image".to_string()))
}

/// Decodes a base64 frame as sent by the browser frontend, with or without a
/// `data:image/jpeg;base64,` prefix.
fn decode_base64_frame(text: &str) -> Result<Vec<u8>, AppError> {
    let payload = text
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or(text)
        .trim();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::InvalidFrame(format!("Invalid base64 payload: {e}")))
}

/// Runs the classifier, degrading any failure (timeout, transport error,
/// sidecar fault) to the fallback triple. A single bad frame never aborts a
/// session.
async fn classify_or_fallback(classifier: &dyn FrameClassifier, frame: &[u8]) -> StateTriple {
    match classifier.classify(frame).await {
        Ok(triple) => triple,
        Err(e) => {
            warn!("Classifier failure, substituting fallback labels: {e}");
            StateTriple::fallback()
        }
    }
}

fn build_frame_analysis(
    tracker: &SessionTracker,
    triple: StateTriple,
    now: DateTime<Utc>,
) -> FrameAnalysis {
    let total_seconds = (now - tracker.start_time()).num_milliseconds().max(0) as f64 / 1000.0;

    FrameAnalysis {
        session_id: tracker.id(),
        eye_status: triple.eye,
        head_status: triple.head,
        emotion: triple.emotion,
        frames_processed: tracker.frames_processed(),
        eye_timers: EyeState::ALL
            .iter()
            .map(|s| (s.label().to_string(), format_hms(tracker.eye_duration(*s))))
            .collect(),
        head_timers: HeadState::ALL
            .iter()
            .map(|s| (s.label().to_string(), format_hms(tracker.head_duration(*s))))
            .collect(),
        emotion_timers: Emotion::ALL
            .iter()
            .map(|e| (e.label().to_string(), format_hms(tracker.emotion_duration(*e))))
            .collect(),
        total_time: format_hms(total_seconds),
        attention_score: attention_score(tracker),
    }
}
