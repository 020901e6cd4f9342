//! Capability boundary between the intrusion core and its collaborators.
//!
//! The core depends on these traits only, never on a capture library or an
//! inference backend, so it stays portable and testable without hardware.

use thiserror::Error;
use vision_models::{Frame, PersonDetection};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("frame source exhausted")]
    Exhausted,
    #[error("frame source failure: {0}")]
    Failure(String),
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector failure: {0}")]
    Failure(String),
}

/// Opaque producer of fixed-resolution frames at an unspecified rate.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError>;
}

/// Opaque person detector. Class filtering happens upstream; implementations
/// return person detections only.
pub trait PersonDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<PersonDetection>, DetectorError>;
}
