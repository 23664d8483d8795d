//! Attentiveness session tracking: per-session accumulation of time spent in
//! each behavioral state, report generation, and the HTTP/WebSocket surface.

pub mod handlers;
pub mod labels;
pub mod registry;
pub mod report;
pub mod session;
