//! Dual-sink event logging for alert lifecycle events.
//!
//! Every event is recorded twice: a human-readable block appended to
//! `intrusion_log.txt`, and a structured entry in the `intrusion_log.json`
//! array. The text sink is pure append, so prior corruption never blocks new
//! writes. The structured sink rewrites the whole array through a temp file
//! and an atomic rename, so a crash mid-write cannot lose entries that were
//! already committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TEXT_LOG_FILE: &str = "intrusion_log.txt";
pub const JSON_LOG_FILE: &str = "intrusion_log.json";

const SEPARATOR_WIDTH: usize = 60;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "ALERT_START")]
    AlertStart,
    #[serde(rename = "ALERT_END")]
    AlertEnd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AlertStart => "ALERT_START",
            EventKind::AlertEnd => "ALERT_END",
        }
    }
}

/// Immutable record appended to both sinks. `screenshots` is populated only
/// on ALERT_END.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventKind,
    pub alert_id: String,
    pub state: String,
    pub person_count: usize,
    pub avg_confidence: f64,
    pub detections_count: usize,
    #[serde(default)]
    pub screenshots: Vec<String>,
}

/// The two synchronized sinks. Each append is independent; callers attempt
/// both and report failures without aborting alert processing.
pub struct EventLog {
    logs_dir: PathBuf,
    text_path: PathBuf,
    json_path: PathBuf,
}

impl EventLog {
    /// Creates the log directory and seeds both files: a header block for the
    /// text log, an empty array for the structured log.
    pub fn new(logs_dir: impl AsRef<Path>) -> Result<Self> {
        let logs_dir = logs_dir.as_ref().to_path_buf();
        fs::create_dir_all(&logs_dir)?;

        let text_path = logs_dir.join(TEXT_LOG_FILE);
        let json_path = logs_dir.join(JSON_LOG_FILE);

        if !text_path.exists() {
            write_text_header(&text_path)?;
        }
        if !json_path.exists() {
            fs::write(&json_path, "[]")?;
        }

        Ok(Self {
            logs_dir,
            text_path,
            json_path,
        })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Append one human-readable block. Pure append: no read-before-write.
    pub fn append_text(&self, entry: &EventLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.text_path)?;

        writeln!(
            file,
            "[{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.event_type.as_str()
        )?;
        writeln!(file, "  Alert ID: {}", entry.alert_id)?;
        writeln!(file, "  State: {}", entry.state)?;
        writeln!(file, "  Persons: {}", entry.person_count)?;
        writeln!(file, "  Confidence: {:.2}", entry.avg_confidence)?;
        writeln!(file, "  Detections: {}", entry.detections_count)?;
        writeln!(file, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        file.flush()?;
        Ok(())
    }

    /// Append one structured entry: read the array, push, rewrite through a
    /// temp file, then rename into place. The rename is the commit point.
    pub fn append_json(&self, entry: &EventLogEntry) -> Result<()> {
        let mut entries = self.read_entries_or_empty();
        entries.push(entry.clone());

        let payload = serde_json::to_vec_pretty(&entries)?;
        let tmp_path = self.json_path.with_extension("json.tmp");
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&payload)?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.json_path)?;
        Ok(())
    }

    /// All committed structured entries, oldest first.
    pub fn read_entries(&self) -> Result<Vec<EventLogEntry>> {
        let raw = fs::read_to_string(&self.json_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn read_entries_or_empty(&self) -> Vec<EventLogEntry> {
        match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("structured log unreadable ({e}), starting a fresh array");
                Vec::new()
            }
        }
    }
}

fn write_text_header(path: &Path) -> Result<()> {
    let bar = "=".repeat(SEPARATOR_WIDTH);
    let mut file = File::create(path)?;
    writeln!(file, "{bar}")?;
    writeln!(file, "SentinelEdge - Intrusion Detection Log")?;
    writeln!(file, "{bar}")?;
    writeln!(
        file,
        "Log created: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(file, "{bar}")?;
    writeln!(file)?;
    Ok(())
}
