use std::sync::Arc;

use crate::classifier::FrameClassifier;
use crate::config::Config;
use crate::tracking::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions. Explicitly owned here rather than module-level globals so
    /// tests and requests never contaminate each other.
    pub registry: Arc<SessionRegistry>,
    /// Pluggable frame classifier. Default: `HttpFrameClassifier` against the
    /// inference sidecar; tests swap in a fixed-response stub.
    pub classifier: Arc<dyn FrameClassifier>,
    pub config: Config,
}
