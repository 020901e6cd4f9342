//! Shared helpers for driving the full pipeline in integration tests.
//!
//! Phases are expanded into per-frame summaries with synthetic timestamps,
//! so runs are deterministic and need no sleeping.

use alert_manager::AlertManager;
use chrono::{DateTime, Duration, Utc};
use intrusion_core::{IntrusionEngine, StateSnapshot};
use vision_models::{BoundingBox, DetectionSummary, Frame, PersonDetection};

/// One scripted stretch of frames.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSpec {
    pub frames: usize,
    pub person_count: usize,
    pub confidence: f64,
}

/// One processed frame: timestamp, engine snapshot, open alert id (if any).
pub struct FrameOutcome {
    pub at: DateTime<Utc>,
    pub snapshot: StateSnapshot,
    pub alert_id: Option<String>,
}

pub fn detections(count: usize, confidence: f64) -> Vec<PersonDetection> {
    (0..count)
        .map(|i| PersonDetection {
            bbox: BoundingBox {
                x1: 40 + (i as i32) * 160,
                y1: 60,
                x2: 160 + (i as i32) * 160,
                y2: 420,
            },
            label: "person".to_string(),
            confidence,
        })
        .collect()
}

pub fn frame() -> Frame {
    Frame::filled(64, 48, [40, 40, 40])
}

/// Feed every phase through the engine and the alert manager at a fixed
/// frame step, returning the per-frame outcomes.
pub fn drive(
    engine: &mut IntrusionEngine,
    manager: &mut AlertManager,
    phases: &[PhaseSpec],
    start: DateTime<Utc>,
    step_ms: i64,
) -> Vec<FrameOutcome> {
    let mut outcomes = Vec::new();
    let mut tick = 0i64;

    for phase in phases {
        for _ in 0..phase.frames {
            let now = start + Duration::milliseconds(tick * step_ms);
            tick += 1;

            let detections = detections(phase.person_count, phase.confidence);
            let summary = DetectionSummary::from_detections(&detections);
            let frame = frame();
            let snapshot = engine.update(&summary, now);
            let alert_id = manager.on_snapshot(&frame, &snapshot, &detections, now);

            outcomes.push(FrameOutcome {
                at: now,
                snapshot,
                alert_id,
            });
        }
    }

    outcomes
}
