#![allow(dead_code)]

//! Session tracker — per-session accumulation of time spent in each behavioral state.
//!
//! The accrual model is accrue-then-advance: every observation first credits the
//! elapsed wall-clock interval to whichever state triple was current *before* the
//! call, then installs the newly classified triple. Repeated frames in an unchanged
//! state therefore keep extending the same bucket, which is how one continuous
//! interval is accumulated across many frames. Wall-clock accrual (rather than
//! frame counting) keeps the totals correct under variable frame rates and sparse
//! sampling.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::tracking::labels::{Emotion, EyeState, HeadState, StateTriple};

/// One monitored interview attempt. All timestamps are UTC; durations are seconds.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    id: Uuid,
    start_time: DateTime<Utc>,
    eye_durations: HashMap<EyeState, f64>,
    head_durations: HashMap<HeadState, f64>,
    emotion_durations: HashMap<Emotion, f64>,
    current: StateTriple,
    last_transition: DateTime<Utc>,
    frames_processed: u64,
}

impl SessionTracker {
    pub fn new(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            start_time: now,
            eye_durations: EyeState::ALL.into_iter().map(|s| (s, 0.0)).collect(),
            head_durations: HeadState::ALL.into_iter().map(|s| (s, 0.0)).collect(),
            emotion_durations: Emotion::ALL.into_iter().map(|s| (s, 0.0)).collect(),
            current: StateTriple::fallback(),
            last_transition: now,
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn current_state(&self) -> StateTriple {
        self.current
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn eye_duration(&self, state: EyeState) -> f64 {
        self.eye_durations.get(&state).copied().unwrap_or(0.0)
    }

    pub fn head_duration(&self, state: HeadState) -> f64 {
        self.head_durations.get(&state).copied().unwrap_or(0.0)
    }

    pub fn emotion_duration(&self, emotion: Emotion) -> f64 {
        self.emotion_durations.get(&emotion).copied().unwrap_or(0.0)
    }

    /// Total tracked seconds. All three duration maps advance together, so the
    /// eye-state sum stands for all of them.
    pub fn tracked_seconds(&self) -> f64 {
        self.eye_durations.values().sum()
    }

    /// Records one classified frame: credits the elapsed interval to the previous
    /// state's buckets, then makes `triple` current.
    pub fn observe(&mut self, triple: StateTriple, now: DateTime<Utc>) {
        self.accrue(now);
        self.current = triple;
        self.frames_processed += 1;
    }

    /// Credits the in-flight interval to the current state without advancing it.
    /// Used by report generation so a report requested mid-state is accurate up
    /// to now; does not count as a processed frame.
    pub fn flush(&mut self, now: DateTime<Utc>) {
        self.accrue(now);
    }

    /// Zeroes every duration bucket and restarts both clocks at `now`. The
    /// current state and the frame counter are deliberately left untouched.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        for v in self.eye_durations.values_mut() {
            *v = 0.0;
        }
        for v in self.head_durations.values_mut() {
            *v = 0.0;
        }
        for v in self.emotion_durations.values_mut() {
            *v = 0.0;
        }
        self.start_time = now;
        self.last_transition = now;
    }

    pub fn last_transition(&self) -> DateTime<Utc> {
        self.last_transition
    }

    fn accrue(&mut self, now: DateTime<Utc>) {
        // Clamp to zero on clock skew rather than corrupting the totals.
        let elapsed = (now - self.last_transition).num_milliseconds().max(0) as f64 / 1000.0;
        *self.eye_durations.entry(self.current.eye).or_insert(0.0) += elapsed;
        *self.head_durations.entry(self.current.head).or_insert(0.0) += elapsed;
        *self
            .emotion_durations
            .entry(self.current.emotion)
            .or_insert(0.0) += elapsed;
        self.last_transition = now;
    }
}
