//! SentinelEdge command-line entry point.

mod logcheck;
mod runner;
mod scripted;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use event_log::EventLog;
use evidence_store::EvidenceStore;
use alert_manager::AlertManager;
use intrusion_core::{EngineConfig, IntrusionEngine};

#[derive(Parser)]
#[command(name = "sentinel", about = "SentinelEdge intrusion detection", version)]
struct Cli {
    /// Output JSON instead of human text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detection pipeline over a scripted scenario
    Run {
        /// Scenario file (JSON); the built-in demo scenario when omitted
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Seconds of continuous detection required before an alert
        #[arg(long, default_value_t = 3.0)]
        detection_threshold: f64,
        /// Minimum smoothed confidence in [0, 1]
        #[arg(long, default_value_t = 0.6)]
        confidence_threshold: f64,
        /// Seconds without detection before returning to CLEAR
        #[arg(long, default_value_t = 2.0)]
        clear_timeout: f64,
        /// Frames per second to synthesize
        #[arg(long, default_value_t = 10.0)]
        fps: f64,
        /// Evidence directory (default: $SENTINEL_ALERTS_DIR or ./alerts)
        #[arg(long)]
        alerts_dir: Option<PathBuf>,
        /// Log directory (default: $SENTINEL_LOGS_DIR or ./logs)
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
    /// Summarize the structured event log
    Stats {
        /// Log directory (default: $SENTINEL_LOGS_DIR or ./logs)
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
    /// Verify start/end pairing and id ordering in the structured log
    CheckLog {
        /// Log directory (default: $SENTINEL_LOGS_DIR or ./logs)
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            detection_threshold,
            confidence_threshold,
            clear_timeout,
            fps,
            alerts_dir,
            logs_dir,
        } => cmd_run(
            cli.json,
            scenario,
            detection_threshold,
            confidence_threshold,
            clear_timeout,
            fps,
            alerts_dir_or_default(alerts_dir),
            logs_dir_or_default(logs_dir),
        ),
        Commands::Stats { logs_dir } => cmd_stats(cli.json, logs_dir_or_default(logs_dir)),
        Commands::CheckLog { logs_dir } => cmd_check_log(cli.json, logs_dir_or_default(logs_dir)),
    }
}

fn alerts_dir_or_default(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| {
        PathBuf::from(std::env::var("SENTINEL_ALERTS_DIR").unwrap_or_else(|_| "./alerts".to_string()))
    })
}

fn logs_dir_or_default(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| {
        PathBuf::from(std::env::var("SENTINEL_LOGS_DIR").unwrap_or_else(|_| "./logs".to_string()))
    })
}

fn cmd_run(
    json: bool,
    scenario: Option<PathBuf>,
    detection_threshold: f64,
    confidence_threshold: f64,
    clear_timeout: f64,
    fps: f64,
    alerts_dir: PathBuf,
    logs_dir: PathBuf,
) -> Result<()> {
    if !(fps > 0.0) {
        bail!("fps must be positive, got {fps}");
    }

    let scenario = match scenario {
        Some(path) => scripted::Scenario::load(&path)?,
        None => scripted::Scenario::demo(),
    };
    let schedule = scripted::build_schedule(&scenario, fps);
    let mut source = scripted::ScriptedFeed::new(schedule.clone());
    let mut detector = scripted::ScriptedDetector::new(schedule);

    let config = EngineConfig {
        detection_threshold_secs: detection_threshold,
        confidence_threshold,
        clear_timeout_secs: clear_timeout,
    };
    let mut engine = IntrusionEngine::new(config).context("invalid engine configuration")?;
    let store = EvidenceStore::new(&alerts_dir)
        .with_context(|| format!("opening evidence store at {}", alerts_dir.display()))?;
    let log = EventLog::new(&logs_dir)
        .with_context(|| format!("opening event log at {}", logs_dir.display()))?;
    let mut manager = AlertManager::new(store, log);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("installing ctrl-c handler")?;
    }

    let frame_interval = Duration::from_secs_f64(1.0 / fps);
    let report = runner::run(
        &mut source,
        &mut detector,
        &mut engine,
        &mut manager,
        &stop,
        frame_interval,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let bar = "=".repeat(60);
    println!("{bar}");
    println!("{}", "FINAL STATISTICS".bold());
    println!("{bar}");
    println!("Total frames processed: {}", report.frames_processed);
    println!("Total detections: {}", report.engine.total_detections);
    println!("Total alerts triggered: {}", report.alerts.total_alerts);
    println!(
        "False alarms prevented: {}",
        report.engine.false_alarm_preventions
    );
    println!("Final state: {}", state_label(&report.engine.current_state));
    println!("Evidence saved to: {}", report.alerts.alerts_dir);
    println!("Logs saved to: {}", report.alerts.logs_dir);
    println!("{bar}");
    Ok(())
}

fn state_label(state: &str) -> colored::ColoredString {
    match state {
        "ALERT" => state.red().bold(),
        "DETECTING" => state.yellow(),
        _ => state.green(),
    }
}

fn cmd_stats(json: bool, logs_dir: PathBuf) -> Result<()> {
    let log = EventLog::new(&logs_dir)
        .with_context(|| format!("opening event log at {}", logs_dir.display()))?;
    let entries = log.read_entries().context("reading structured log")?;
    let summary = logcheck::summarize(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Structured log: {}", log.json_path().display());
    println!("  Entries: {}", summary.total_entries);
    println!("  Alert starts: {}", summary.alert_starts);
    println!("  Alert ends: {}", summary.alert_ends);
    println!("  Open alerts: {}", summary.open_alerts);
    Ok(())
}

fn cmd_check_log(json: bool, logs_dir: PathBuf) -> Result<()> {
    let log = EventLog::new(&logs_dir)
        .with_context(|| format!("opening event log at {}", logs_dir.display()))?;
    let entries = log.read_entries().context("reading structured log")?;
    let violations = logcheck::verify(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&violations)?);
    } else if violations.is_empty() {
        println!(
            "{} {} entries, every start paired with its end",
            "OK".green().bold(),
            entries.len()
        );
    } else {
        for violation in &violations {
            println!(
                "{} {}: {}",
                "VIOLATION".red().bold(),
                violation.alert_id,
                violation.reason
            );
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        bail!("{} log violation(s) found", violations.len());
    }
}
