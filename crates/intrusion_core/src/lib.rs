//! Intrusion Decision Core
//!
//! Time-and-confidence hysteresis over per-frame detection summaries:
//! - a dwell requirement in DETECTING before any alert can trigger
//! - smoothed-confidence gating against single-frame false positives
//! - a clear-timeout grace period so momentary detection gaps do not
//!   flap the state back to CLEAR
//!
//! The engine is pure and synchronous: callers inject the current time and
//! receive an immutable snapshot per update. No I/O happens here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use vision_models::DetectionSummary;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("detection threshold must be positive, got {0}")]
    NonPositiveDetectionThreshold(f64),
    #[error("confidence threshold must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),
    #[error("clear timeout must be positive, got {0}")]
    NonPositiveClearTimeout(f64),
}

/// Samples retained for confidence smoothing (~1 second at 30 fps).
pub const CONFIDENCE_WINDOW_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntrusionState {
    Clear,
    Detecting,
    Alert,
}

impl IntrusionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntrusionState::Clear => "CLEAR",
            IntrusionState::Detecting => "DETECTING",
            IntrusionState::Alert => "ALERT",
        }
    }
}

/// Thresholds driving the state machine. Validated once at engine
/// construction, immutable afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Continuous detection required before an alert triggers, in seconds.
    pub detection_threshold_secs: f64,
    /// Minimum smoothed confidence for the ALERT transition, in [0, 1].
    pub confidence_threshold: f64,
    /// Absence tolerated before returning to CLEAR, in seconds. Intended to
    /// be shorter than `detection_threshold_secs`, though not enforced.
    pub clear_timeout_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection_threshold_secs: 3.0,
            confidence_threshold: 0.6,
            clear_timeout_secs: 2.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.detection_threshold_secs > 0.0) {
            return Err(ConfigError::NonPositiveDetectionThreshold(
                self.detection_threshold_secs,
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::ConfidenceOutOfRange(self.confidence_threshold));
        }
        if !(self.clear_timeout_secs > 0.0) {
            return Err(ConfigError::NonPositiveClearTimeout(self.clear_timeout_secs));
        }
        Ok(())
    }
}

/// Bounded FIFO of per-frame confidence samples, collected only while a
/// person is present. Its arithmetic mean is the smoothed confidence used
/// for thresholding and reporting.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceWindow {
    samples: VecDeque<f64>,
}

impl ConfidenceWindow {
    pub fn push(&mut self, confidence: f64) {
        if self.samples.len() == CONFIDENCE_WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(confidence);
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Immutable view of the engine after one update.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state: IntrusionState,
    pub person_count: usize,
    pub avg_confidence: f64,
    pub time_in_state_secs: f64,
    pub detection_threshold_secs: f64,
    pub is_intrusion: bool,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative counters plus the configured thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_detections: u64,
    pub total_alerts: u64,
    pub false_alarm_preventions: u64,
    pub current_state: String,
    pub detection_threshold_secs: f64,
    pub confidence_threshold: f64,
    pub clear_timeout_secs: f64,
}

/// The decision engine. Owns all mutable decision state; `update` is the
/// only mutator.
pub struct IntrusionEngine {
    config: EngineConfig,
    state: IntrusionState,
    detection_start_time: Option<DateTime<Utc>>,
    last_detection_time: Option<DateTime<Utc>>,
    alert_triggered_time: Option<DateTime<Utc>>,
    window: ConfidenceWindow,
    total_detections: u64,
    total_alerts: u64,
    false_alarm_preventions: u64,
}

impl IntrusionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: IntrusionState::Clear,
            detection_start_time: None,
            last_detection_time: None,
            alert_triggered_time: None,
            window: ConfidenceWindow::default(),
            total_detections: 0,
            total_alerts: 0,
            false_alarm_preventions: 0,
        })
    }

    pub fn state(&self) -> IntrusionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance the state machine by one frame.
    ///
    /// Out-of-range confidences are accepted and simply participate in
    /// averaging; this function never fails.
    pub fn update(&mut self, summary: &DetectionSummary, now: DateTime<Utc>) -> StateSnapshot {
        if summary.person_present {
            self.total_detections += 1;
            self.last_detection_time = Some(now);
            self.window.push(summary.max_confidence);
            let avg_confidence = self.window.mean();

            match self.state {
                IntrusionState::Clear => {
                    self.state = IntrusionState::Detecting;
                    self.detection_start_time = Some(now);
                }
                IntrusionState::Detecting => {
                    if avg_confidence < self.config.confidence_threshold {
                        // Gate holds the transition without restarting the dwell timer.
                        self.false_alarm_preventions += 1;
                    } else if elapsed_secs(self.detection_start_time, now)
                        >= self.config.detection_threshold_secs
                    {
                        self.state = IntrusionState::Alert;
                        self.alert_triggered_time = Some(now);
                        self.total_alerts += 1;
                    }
                }
                // Stays armed while a person is present.
                IntrusionState::Alert => {}
            }
        } else {
            match self.state {
                IntrusionState::Clear => {}
                IntrusionState::Detecting => {
                    if elapsed_secs(self.last_detection_time, now) >= self.config.clear_timeout_secs
                    {
                        self.state = IntrusionState::Clear;
                        self.detection_start_time = None;
                        self.window.clear();
                    }
                }
                IntrusionState::Alert => {
                    if elapsed_secs(self.last_detection_time, now) >= self.config.clear_timeout_secs
                    {
                        self.state = IntrusionState::Clear;
                        self.detection_start_time = None;
                        self.alert_triggered_time = None;
                        self.window.clear();
                    }
                }
            }
        }

        self.snapshot(summary.person_count, now)
    }

    fn snapshot(&self, person_count: usize, now: DateTime<Utc>) -> StateSnapshot {
        let time_in_state_secs = match self.state {
            IntrusionState::Clear => 0.0,
            IntrusionState::Detecting => elapsed_secs(self.detection_start_time, now),
            IntrusionState::Alert => elapsed_secs(self.alert_triggered_time, now),
        };

        StateSnapshot {
            state: self.state,
            person_count,
            avg_confidence: self.window.mean(),
            time_in_state_secs,
            detection_threshold_secs: self.config.detection_threshold_secs,
            is_intrusion: self.state == IntrusionState::Alert,
            timestamp: now,
        }
    }

    /// Idempotent view of the cumulative counters.
    pub fn statistics(&self) -> EngineStats {
        EngineStats {
            total_detections: self.total_detections,
            total_alerts: self.total_alerts,
            false_alarm_preventions: self.false_alarm_preventions,
            current_state: self.state.as_str().to_string(),
            detection_threshold_secs: self.config.detection_threshold_secs,
            confidence_threshold: self.config.confidence_threshold,
            clear_timeout_secs: self.config.clear_timeout_secs,
        }
    }

    /// Back to CLEAR with all timers and the window dropped. Cumulative
    /// counters are retained.
    pub fn reset(&mut self) {
        self.state = IntrusionState::Clear;
        self.detection_start_time = None;
        self.last_detection_time = None;
        self.alert_triggered_time = None;
        self.window.clear();
    }
}

/// Seconds since `since`; 0 when the timer is unset.
fn elapsed_secs(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    since
        .map(|t| (now - t).num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0)
}
