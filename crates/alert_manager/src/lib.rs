//! Alert Lifecycle Manager
//!
//! Reacts to decision-engine snapshots: opens at most one alert at a time,
//! captures rate-limited evidence while it is open, and records every
//! ALERT_START/ALERT_END in both log sinks. Evidence and log failures are
//! isolated per operation and never interrupt alert tracking.

use chrono::{DateTime, Utc};
use event_log::{EventKind, EventLog, EventLogEntry};
use evidence_store::EvidenceStore;
use intrusion_core::{IntrusionState, StateSnapshot};
use serde::Serialize;
use vision_models::{Frame, PersonDetection};

/// Evidence images captured per alert lifetime, not per unit time.
pub const MAX_EVIDENCE_PER_ALERT: usize = 5;

/// The single live alert. Created on the first ALERT snapshot after idle,
/// closed on the first non-ALERT snapshot (or at finalize), then discarded;
/// it survives only through its log entries.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub alert_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub evidence_paths: Vec<String>,
    /// Last observation while the alert was open, used when closing at
    /// shutdown with no fresh snapshot available.
    pub last_person_count: usize,
    pub last_avg_confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertStats {
    pub total_alerts: u64,
    pub alert_active: bool,
    pub current_alert_id: Option<String>,
    pub alerts_dir: String,
    pub logs_dir: String,
}

pub struct AlertManager {
    store: EvidenceStore,
    log: EventLog,
    active: Option<AlertRecord>,
    alert_count: u64,
}

impl AlertManager {
    pub fn new(store: EvidenceStore, log: EventLog) -> Self {
        Self {
            store,
            log,
            active: None,
            alert_count: 0,
        }
    }

    pub fn active_alert_id(&self) -> Option<&str> {
        self.active.as_ref().map(|record| record.alert_id.as_str())
    }

    /// Consume one snapshot. Returns the open alert's id while the state is
    /// ALERT, `None` otherwise.
    pub fn on_snapshot(
        &mut self,
        frame: &Frame,
        snapshot: &StateSnapshot,
        detections: &[PersonDetection],
        now: DateTime<Utc>,
    ) -> Option<String> {
        if snapshot.is_intrusion {
            self.trigger(frame, snapshot, detections, now)
        } else {
            if self.active.is_some() {
                self.clear(snapshot, now);
            }
            None
        }
    }

    fn trigger(
        &mut self,
        frame: &Frame,
        snapshot: &StateSnapshot,
        detections: &[PersonDetection],
        now: DateTime<Utc>,
    ) -> Option<String> {
        if self.active.is_none() {
            self.alert_count += 1;
            let alert_id = format!("ALERT_{}_{:03}", now.format("%Y%m%d_%H%M%S"), self.alert_count);
            log::warn!(
                "intrusion alert {} triggered: {} person(s), confidence {:.2}",
                alert_id,
                snapshot.person_count,
                snapshot.avg_confidence
            );

            self.active = Some(AlertRecord {
                alert_id: alert_id.clone(),
                start_time: now,
                end_time: None,
                evidence_paths: Vec::new(),
                last_person_count: snapshot.person_count,
                last_avg_confidence: snapshot.avg_confidence,
            });

            self.write_entry(&EventLogEntry {
                timestamp: now,
                event_type: EventKind::AlertStart,
                alert_id,
                state: snapshot.state.as_str().to_string(),
                person_count: snapshot.person_count,
                avg_confidence: snapshot.avg_confidence,
                detections_count: detections.len(),
                screenshots: Vec::new(),
            });
        }

        let record = self.active.as_mut()?;
        record.last_person_count = snapshot.person_count;
        record.last_avg_confidence = snapshot.avg_confidence;

        if record.evidence_paths.len() < MAX_EVIDENCE_PER_ALERT {
            match self.store.save_frame(&record.alert_id, frame, now) {
                Ok(path) => record
                    .evidence_paths
                    .push(path.to_string_lossy().into_owned()),
                Err(e) => log::warn!(
                    "evidence capture failed for {} ({e}), continuing",
                    record.alert_id
                ),
            }
        }

        Some(record.alert_id.clone())
    }

    fn clear(&mut self, snapshot: &StateSnapshot, now: DateTime<Utc>) {
        if let Some(mut record) = self.active.take() {
            record.end_time = Some(now);
            let duration_secs = (now - record.start_time).num_milliseconds() as f64 / 1000.0;
            log::info!(
                "alert {} cleared after {:.1}s with {} evidence frame(s)",
                record.alert_id,
                duration_secs,
                record.evidence_paths.len()
            );

            self.write_entry(&EventLogEntry {
                timestamp: now,
                event_type: EventKind::AlertEnd,
                alert_id: record.alert_id,
                state: snapshot.state.as_str().to_string(),
                person_count: snapshot.person_count,
                avg_confidence: snapshot.avg_confidence,
                detections_count: 0,
                screenshots: record.evidence_paths,
            });
        }
    }

    /// Orderly shutdown: close the open alert, if any, so every ALERT_START
    /// gets its ALERT_END before process exit.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        if let Some(mut record) = self.active.take() {
            record.end_time = Some(now);
            log::info!("finalizing open alert {} at shutdown", record.alert_id);

            self.write_entry(&EventLogEntry {
                timestamp: now,
                event_type: EventKind::AlertEnd,
                alert_id: record.alert_id,
                state: IntrusionState::Alert.as_str().to_string(),
                person_count: record.last_person_count,
                avg_confidence: record.last_avg_confidence,
                detections_count: 0,
                screenshots: record.evidence_paths,
            });
        }
    }

    /// Idempotent view of the manager's bookkeeping.
    pub fn statistics(&self) -> AlertStats {
        AlertStats {
            total_alerts: self.alert_count,
            alert_active: self.active.is_some(),
            current_alert_id: self.active.as_ref().map(|r| r.alert_id.clone()),
            alerts_dir: self.store.dir().display().to_string(),
            logs_dir: self.log.logs_dir().display().to_string(),
        }
    }

    fn write_entry(&self, entry: &EventLogEntry) {
        // Each sink is attempted independently; a failed sink degrades
        // observability only.
        if let Err(e) = self.log.append_text(entry) {
            log::error!("text log write failed: {e}");
        }
        if let Err(e) = self.log.append_json(entry) {
            log::error!("structured log write failed: {e}");
        }
    }
}
