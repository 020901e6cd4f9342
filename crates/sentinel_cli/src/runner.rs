//! Per-frame driving loop: capture, detect, decide, react.
//!
//! Single-threaded and synchronous by design; evidence and log writes block
//! the loop, which is the accepted tradeoff for the offline edge target.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alert_manager::{AlertManager, AlertStats};
use chrono::Utc;
use intrusion_core::{EngineStats, IntrusionEngine};
use serde::Serialize;
use tracing::{info, warn};
use vision_interfaces::{FrameSource, PersonDetector, SourceError};
use vision_models::DetectionSummary;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub frames_processed: u64,
    pub engine: EngineStats,
    pub alerts: AlertStats,
}

/// Drive the pipeline until the source is exhausted, it fails, or the stop
/// flag is raised. Always finalizes the alert manager on the way out, so an
/// open alert gets its ALERT_END before the statistics are reported.
pub fn run(
    source: &mut dyn FrameSource,
    detector: &mut dyn PersonDetector,
    engine: &mut IntrusionEngine,
    manager: &mut AlertManager,
    stop: &AtomicBool,
    frame_interval: Duration,
) -> RunReport {
    let mut frames_processed = 0u64;

    loop {
        if stop.load(Ordering::SeqCst) {
            info!("shutdown requested");
            break;
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(SourceError::Exhausted) => {
                info!("frame source exhausted");
                break;
            }
            Err(e) => {
                warn!("frame source failure: {e}");
                break;
            }
        };
        frames_processed += 1;

        // A detector fault yields an absent-person frame; the decision core
        // keeps running on whatever the detector can deliver.
        let detections = match detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("detector failure: {e}");
                Vec::new()
            }
        };

        let summary = DetectionSummary::from_detections(&detections);
        let now = Utc::now();
        let snapshot = engine.update(&summary, now);
        manager.on_snapshot(&frame, &snapshot, &detections, now);

        if !frame_interval.is_zero() {
            std::thread::sleep(frame_interval);
        }
    }

    manager.finalize(Utc::now());

    RunReport {
        frames_processed,
        engine: engine.statistics(),
        alerts: manager.statistics(),
    }
}
