//! Filesystem evidence store for alert frames.
//!
//! Each captured frame is persisted as a binary PPM (P6) file named from the
//! alert id plus a millisecond-precision timestamp, so lexical order equals
//! capture order and names are unique within an alert.

use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vision_models::Frame;

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame geometry mismatch: {width}x{height} raster needs {expected} bytes, got {actual}")]
    GeometryMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, EvidenceError>;

pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one frame as `{alert_id}_{%Y%m%d_%H%M%S_%3f}.ppm` and return
    /// the stored path. The frame buffer is written as-is; pixel data is
    /// never mutated.
    pub fn save_frame(
        &self,
        alert_id: &str,
        frame: &Frame,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        if !frame.geometry_ok() {
            return Err(EvidenceError::GeometryMismatch {
                width: frame.width,
                height: frame.height,
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }

        let filename = format!("{}_{}.ppm", alert_id, now.format("%Y%m%d_%H%M%S_%3f"));
        let path = self.dir.join(filename);

        let mut file = File::create(&path)?;
        write!(file, "P6\n{} {}\n255\n", frame.width, frame.height)?;
        file.write_all(&frame.data)?;
        file.sync_all()?;

        log::info!("evidence saved: {}", path.display());
        Ok(path)
    }
}
