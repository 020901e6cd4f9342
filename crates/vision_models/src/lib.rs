//! Shared data model for the SentinelEdge pipeline.
//!
//! Frames flow in from an opaque source, detections flow in from an opaque
//! person detector; everything downstream consumes these types.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }
}

/// One person detection, already filtered to the person class upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetection {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f64,
}

/// Fixed-resolution RGB24 raster. The decision core never mutates `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Solid-color frame, used by synthetic sources and tests.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Bytes an RGB24 raster of this geometry must hold.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn geometry_ok(&self) -> bool {
        self.data.len() == self.expected_len()
    }
}

/// Per-frame input to the decision engine: presence, count, peak confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub person_present: bool,
    pub person_count: usize,
    pub max_confidence: f64,
}

impl DetectionSummary {
    pub fn from_detections(detections: &[PersonDetection]) -> Self {
        let max_confidence = detections
            .iter()
            .map(|d| d.confidence)
            .fold(0.0_f64, f64::max);
        Self {
            person_present: !detections.is_empty(),
            person_count: detections.len(),
            max_confidence,
        }
    }

    pub fn absent() -> Self {
        Self {
            person_present: false,
            person_count: 0,
            max_confidence: 0.0,
        }
    }
}
