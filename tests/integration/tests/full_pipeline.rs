//! Full pipeline integration tests
//!
//! Drive scripted detection phases through the decision engine and the alert
//! lifecycle manager against real (temporary) evidence and log directories,
//! with synthetic timestamps for determinism.

use alert_manager::{AlertManager, MAX_EVIDENCE_PER_ALERT};
use chrono::{DateTime, TimeZone, Utc};
use event_log::{EventKind, EventLog};
use evidence_store::EvidenceStore;
use intrusion_core::{EngineConfig, IntrusionEngine, IntrusionState};
use sentinel_integration_tests::{drive, PhaseSpec};
use tempfile::tempdir;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn build(
    dir: &std::path::Path,
) -> (IntrusionEngine, AlertManager) {
    let engine = IntrusionEngine::new(EngineConfig::default()).expect("valid config");
    let manager = AlertManager::new(
        EvidenceStore::new(dir.join("alerts")).expect("evidence store"),
        EventLog::new(dir.join("logs")).expect("event log"),
    );
    (engine, manager)
}

fn reopen_log(dir: &std::path::Path) -> EventLog {
    EventLog::new(dir.join("logs")).expect("reopen log")
}

#[test]
fn full_intrusion_cycle_produces_paired_logs_and_evidence() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    // Quiet scene, a confident visitor for 4s, then an empty scene long
    // enough to clear. 100ms frame step.
    let phases = [
        PhaseSpec {
            frames: 10,
            person_count: 0,
            confidence: 0.0,
        },
        PhaseSpec {
            frames: 40,
            person_count: 1,
            confidence: 0.85,
        },
        PhaseSpec {
            frames: 30,
            person_count: 0,
            confidence: 0.0,
        },
    ];
    let outcomes = drive(&mut engine, &mut manager, &phases, start_time(), 100);

    // The alert must not fire before 3.0s of continuous detection.
    let presence_start = outcomes
        .iter()
        .position(|o| o.snapshot.state != IntrusionState::Clear)
        .expect("presence observed");
    let first_alert = outcomes
        .iter()
        .position(|o| o.snapshot.is_intrusion)
        .expect("alert fired");
    let dwell_ms = (outcomes[first_alert].at - outcomes[presence_start].at).num_milliseconds();
    assert!(dwell_ms >= 3000, "alert after {dwell_ms}ms of dwell");

    // One alert, opened once, closed once, back to CLEAR at the end.
    assert_eq!(engine.statistics().total_alerts, 1);
    assert_eq!(engine.state(), IntrusionState::Clear);
    let stats = manager.statistics();
    assert_eq!(stats.total_alerts, 1);
    assert!(!stats.alert_active);

    // Structured log carries the pair, end with the evidence list.
    let entries = reopen_log(dir.path()).read_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].event_type, EventKind::AlertStart);
    assert!(entries[0].screenshots.is_empty());
    assert_eq!(entries[1].event_type, EventKind::AlertEnd);
    assert_eq!(entries[1].alert_id, entries[0].alert_id);
    assert!(!entries[1].screenshots.is_empty());

    // Evidence on disk matches the logged list, capped per alert.
    let on_disk: Vec<_> = std::fs::read_dir(dir.path().join("alerts"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(on_disk.len(), entries[1].screenshots.len());
    assert!(on_disk.len() <= MAX_EVIDENCE_PER_ALERT);

    // The clear happened only after the 2.0s grace period ran out.
    let last_present = outcomes
        .iter()
        .rposition(|o| o.snapshot.person_count > 0)
        .unwrap();
    let cleared = outcomes
        .iter()
        .position(|o| {
            o.at > outcomes[last_present].at && o.snapshot.state == IntrusionState::Clear
        })
        .expect("cleared after absence");
    let grace_ms = (outcomes[cleared].at - outcomes[last_present].at).num_milliseconds();
    assert!(grace_ms >= 2000, "cleared after {grace_ms}ms of absence");

    // Text sink recorded the same two events.
    let text = std::fs::read_to_string(reopen_log(dir.path()).text_path()).unwrap();
    assert_eq!(text.matches("ALERT_START").count(), 1);
    assert_eq!(text.matches("ALERT_END").count(), 1);
}

#[test]
fn low_confidence_presence_never_reaches_the_alert_manager() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    // 5s of presence at 0.3, below the 0.6 gate.
    let phases = [PhaseSpec {
        frames: 50,
        person_count: 1,
        confidence: 0.3,
    }];
    let outcomes = drive(&mut engine, &mut manager, &phases, start_time(), 100);

    assert!(outcomes.iter().all(|o| !o.snapshot.is_intrusion));
    assert!(outcomes.iter().all(|o| o.alert_id.is_none()));

    let stats = engine.statistics();
    assert_eq!(stats.total_alerts, 0);
    assert!(stats.false_alarm_preventions > 0);

    assert_eq!(reopen_log(dir.path()).read_entries().unwrap().len(), 0);
    assert_eq!(
        std::fs::read_dir(dir.path().join("alerts")).unwrap().count(),
        0
    );
}

#[test]
fn sustained_alert_caps_evidence_at_five() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    // 15s of confident presence: far more ALERT frames than the cap.
    let phases = [PhaseSpec {
        frames: 150,
        person_count: 1,
        confidence: 0.9,
    }];
    drive(&mut engine, &mut manager, &phases, start_time(), 100);

    assert!(manager.statistics().alert_active);
    assert_eq!(
        std::fs::read_dir(dir.path().join("alerts")).unwrap().count(),
        MAX_EVIDENCE_PER_ALERT
    );

    manager.finalize(start_time() + chrono::Duration::seconds(20));
    let entries = reopen_log(dir.path()).read_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].screenshots.len(), MAX_EVIDENCE_PER_ALERT);
}

#[test]
fn shutdown_mid_alert_writes_exactly_one_end() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    let phases = [PhaseSpec {
        frames: 40,
        person_count: 2,
        confidence: 0.85,
    }];
    drive(&mut engine, &mut manager, &phases, start_time(), 100);
    assert!(manager.statistics().alert_active);

    // Shutdown path: finalize before reporting statistics.
    manager.finalize(start_time() + chrono::Duration::seconds(5));
    let stats = manager.statistics();
    assert!(!stats.alert_active);
    assert_eq!(stats.total_alerts, 1);

    let entries = reopen_log(dir.path()).read_entries().unwrap();
    let starts: Vec<_> = entries
        .iter()
        .filter(|e| e.event_type == EventKind::AlertStart)
        .collect();
    let ends: Vec<_> = entries
        .iter()
        .filter(|e| e.event_type == EventKind::AlertEnd)
        .collect();
    assert_eq!(starts.len(), 1);
    assert_eq!(ends.len(), 1);
    assert_eq!(starts[0].alert_id, ends[0].alert_id);
    assert_eq!(ends[0].person_count, 2);
}

#[test]
fn repeated_intrusions_produce_unique_monotonic_ids() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    // Two separate intrusions with a long quiet stretch between them.
    let phases = [
        PhaseSpec {
            frames: 40,
            person_count: 1,
            confidence: 0.9,
        },
        PhaseSpec {
            frames: 40,
            person_count: 0,
            confidence: 0.0,
        },
        PhaseSpec {
            frames: 40,
            person_count: 1,
            confidence: 0.9,
        },
        PhaseSpec {
            frames: 40,
            person_count: 0,
            confidence: 0.0,
        },
    ];
    drive(&mut engine, &mut manager, &phases, start_time(), 100);

    let entries = reopen_log(dir.path()).read_entries().unwrap();
    assert_eq!(entries.len(), 4);

    let ids: Vec<&str> = entries
        .iter()
        .filter(|e| e.event_type == EventKind::AlertStart)
        .map(|e| e.alert_id.as_str())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(ids[0] < ids[1]);
    assert!(ids[0].ends_with("_001"));
    assert!(ids[1].ends_with("_002"));

    // Every start is followed by its own end.
    assert_eq!(entries[0].alert_id, entries[1].alert_id);
    assert_eq!(entries[2].alert_id, entries[3].alert_id);
}

#[test]
fn statistics_queries_do_not_disturb_the_pipeline() {
    let dir = tempdir().unwrap();
    let (mut engine, mut manager) = build(dir.path());

    let phases = [PhaseSpec {
        frames: 35,
        person_count: 1,
        confidence: 0.85,
    }];
    drive(&mut engine, &mut manager, &phases, start_time(), 100);

    let engine_before = serde_json::to_value(engine.statistics()).unwrap();
    let manager_before = serde_json::to_value(manager.statistics()).unwrap();
    for _ in 0..5 {
        let _ = engine.statistics();
        let _ = manager.statistics();
    }
    assert_eq!(
        engine_before,
        serde_json::to_value(engine.statistics()).unwrap()
    );
    assert_eq!(
        manager_before,
        serde_json::to_value(manager.statistics()).unwrap()
    );

    let entries = reopen_log(dir.path()).read_entries().unwrap();
    assert_eq!(entries.len(), 1, "stats queries must not append log entries");
}
