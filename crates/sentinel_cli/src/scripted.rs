//! Scripted stand-ins for the camera feed and the person-detection model.
//!
//! A scenario is a list of phases; each phase holds a person count and a
//! detection confidence for a duration. Feed and detector walk the same
//! precomputed schedule, one step per frame, so a replay is deterministic
//! and needs no hardware or loaded model.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use vision_interfaces::{DetectorError, FrameSource, PersonDetector, SourceError};
use vision_models::{BoundingBox, Frame, PersonDetection};

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPhase {
    pub duration_secs: f64,
    #[serde(default)]
    pub person_count: usize,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub phases: Vec<ScenarioPhase>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario =
            serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Built-in walkthrough: quiet start, a confident visitor long enough to
    /// trigger, a short occlusion gap, then an empty scene.
    pub fn demo() -> Self {
        Self {
            phases: vec![
                ScenarioPhase {
                    duration_secs: 2.0,
                    person_count: 0,
                    confidence: 0.0,
                },
                ScenarioPhase {
                    duration_secs: 4.0,
                    person_count: 1,
                    confidence: 0.85,
                },
                ScenarioPhase {
                    duration_secs: 1.0,
                    person_count: 0,
                    confidence: 0.0,
                },
                ScenarioPhase {
                    duration_secs: 2.0,
                    person_count: 2,
                    confidence: 0.9,
                },
                ScenarioPhase {
                    duration_secs: 3.0,
                    person_count: 0,
                    confidence: 0.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduledFrame {
    pub person_count: usize,
    pub confidence: f64,
}

/// Expand phases into one entry per frame at the given cadence. Every phase
/// contributes at least one frame.
pub fn build_schedule(scenario: &Scenario, fps: f64) -> Vec<ScheduledFrame> {
    let mut schedule = Vec::new();
    for phase in &scenario.phases {
        let frames = (phase.duration_secs * fps).round().max(1.0) as usize;
        for _ in 0..frames {
            schedule.push(ScheduledFrame {
                person_count: phase.person_count,
                confidence: phase.confidence,
            });
        }
    }
    schedule
}

pub struct ScriptedFeed {
    schedule: Vec<ScheduledFrame>,
    cursor: usize,
}

impl ScriptedFeed {
    pub fn new(schedule: Vec<ScheduledFrame>) -> Self {
        Self {
            schedule,
            cursor: 0,
        }
    }
}

impl FrameSource for ScriptedFeed {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let step = match self.schedule.get(self.cursor) {
            Some(step) => *step,
            None => return Err(SourceError::Exhausted),
        };
        self.cursor += 1;

        // Scene brightness tracks occupancy so evidence frames differ visibly.
        let level = if step.person_count > 0 { 96 } else { 24 };
        Ok(Frame::filled(FRAME_WIDTH, FRAME_HEIGHT, [level; 3]))
    }
}

pub struct ScriptedDetector {
    schedule: Vec<ScheduledFrame>,
    cursor: usize,
}

impl ScriptedDetector {
    pub fn new(schedule: Vec<ScheduledFrame>) -> Self {
        Self {
            schedule,
            cursor: 0,
        }
    }
}

impl PersonDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<PersonDetection>, DetectorError> {
        let step = match self.schedule.get(self.cursor) {
            Some(step) => *step,
            None => return Ok(Vec::new()),
        };
        self.cursor += 1;

        Ok((0..step.person_count)
            .map(|i| PersonDetection {
                bbox: BoundingBox {
                    x1: 40 + (i as i32) * 160,
                    y1: 60,
                    x2: 160 + (i as i32) * 160,
                    y2: 420,
                },
                label: "person".to_string(),
                confidence: step.confidence,
            })
            .collect())
    }
}
