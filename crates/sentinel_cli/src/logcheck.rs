//! Offline consistency checks over the structured event log.

use event_log::{EventKind, EventLogEntry};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Serialize)]
pub struct LogSummary {
    pub total_entries: usize,
    pub alert_starts: usize,
    pub alert_ends: usize,
    pub open_alerts: usize,
}

pub fn summarize(entries: &[EventLogEntry]) -> LogSummary {
    let alert_starts = entries
        .iter()
        .filter(|e| e.event_type == EventKind::AlertStart)
        .count();
    let alert_ends = entries
        .iter()
        .filter(|e| e.event_type == EventKind::AlertEnd)
        .count();
    LogSummary {
        total_entries: entries.len(),
        alert_starts,
        alert_ends,
        open_alerts: alert_starts.saturating_sub(alert_ends),
    }
}

#[derive(Debug, Serialize)]
pub struct LogViolation {
    pub alert_id: String,
    pub reason: String,
}

/// Walk the log in order and verify the lifecycle invariants: every
/// ALERT_START is followed by exactly one ALERT_END with the same id, alerts
/// never overlap, and ids are unique with strictly increasing sequence
/// numbers.
pub fn verify(entries: &[EventLogEntry]) -> Vec<LogViolation> {
    let mut violations = Vec::new();
    let mut open: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut last_seq: Option<u64> = None;

    for entry in entries {
        match entry.event_type {
            EventKind::AlertStart => {
                if let Some(ref open_id) = open {
                    violations.push(LogViolation {
                        alert_id: entry.alert_id.clone(),
                        reason: format!("started while {open_id} was still open"),
                    });
                }
                if !seen.insert(entry.alert_id.clone()) {
                    violations.push(LogViolation {
                        alert_id: entry.alert_id.clone(),
                        reason: "duplicate alert id".to_string(),
                    });
                }
                match sequence_number(&entry.alert_id) {
                    Some(seq) => {
                        if let Some(prev) = last_seq {
                            if seq <= prev {
                                violations.push(LogViolation {
                                    alert_id: entry.alert_id.clone(),
                                    reason: format!(
                                        "sequence {seq} not greater than previous {prev}"
                                    ),
                                });
                            }
                        }
                        last_seq = Some(seq);
                    }
                    None => violations.push(LogViolation {
                        alert_id: entry.alert_id.clone(),
                        reason: "unparsable sequence number".to_string(),
                    }),
                }
                open = Some(entry.alert_id.clone());
            }
            EventKind::AlertEnd => match open.take() {
                Some(open_id) if open_id == entry.alert_id => {}
                Some(open_id) => violations.push(LogViolation {
                    alert_id: entry.alert_id.clone(),
                    reason: format!("end does not match open alert {open_id}"),
                }),
                None => violations.push(LogViolation {
                    alert_id: entry.alert_id.clone(),
                    reason: "end without a matching start".to_string(),
                }),
            },
        }
    }

    if let Some(open_id) = open {
        violations.push(LogViolation {
            alert_id: open_id,
            reason: "start without a matching end".to_string(),
        });
    }

    violations
}

fn sequence_number(alert_id: &str) -> Option<u64> {
    alert_id.rsplit('_').next()?.parse().ok()
}
