//! Step telemetry for the launch pipeline
//!
//! Collects per-step events, derives summary statistics for terminal
//! display, and appends a timestamped record to the launch log.

use chrono::Local;
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum LaunchEvent {
    RuntimeDetected {
        command: String,
        version: String,
    },
    StepStarted {
        step: String,
    },
    StepCompleted {
        step: String,
        success: bool,
        duration_ms: u64,
    },
    StepSkipped {
        step: String,
        reason: String,
    },
    WarningRaised {
        step: String,
        message: String,
    },
}

/// Derived statistics over the recorded events
#[derive(Debug, Clone, Default)]
pub struct LaunchStats {
    pub steps_run: usize,
    pub steps_succeeded: usize,
    pub steps_failed: usize,
    pub steps_skipped: usize,
    pub warnings: usize,
}

/// Telemetry collector shared across the pipeline
#[derive(Clone)]
pub struct LaunchTelemetry {
    events: Arc<Mutex<Vec<LaunchEvent>>>,
    stats: Arc<Mutex<LaunchStats>>,
    start_time: Instant,
}

impl Default for LaunchTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchTelemetry {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(LaunchStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: LaunchEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                LaunchEvent::StepStarted { .. } => {
                    stats.steps_run += 1;
                }
                LaunchEvent::StepCompleted { success, .. } => {
                    if *success {
                        stats.steps_succeeded += 1;
                    } else {
                        stats.steps_failed += 1;
                    }
                }
                LaunchEvent::StepSkipped { .. } => {
                    stats.steps_skipped += 1;
                }
                LaunchEvent::WarningRaised { .. } => {
                    stats.warnings += 1;
                }
                LaunchEvent::RuntimeDetected { .. } => {}
            }
        }

        let mut events = self.events.lock().unwrap();
        events.push(event);
    }

    /// Get current statistics
    pub fn stats(&self) -> LaunchStats {
        self.stats.lock().unwrap().clone()
    }

    /// Get elapsed time since the collector was created
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<LaunchEvent> {
        let events = self.events.lock().unwrap();
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Print the post-run summary line
    pub fn display_summary(&self) {
        let stats = self.stats();
        let elapsed = self.elapsed().as_secs_f64();

        let mut parts = vec![format!(
            "{}/{} steps succeeded",
            stats.steps_succeeded, stats.steps_run
        )];
        if stats.steps_skipped > 0 {
            parts.push(format!("{} skipped", stats.steps_skipped));
        }
        if stats.warnings > 0 {
            parts.push(format!("{} warning(s)", stats.warnings));
        }

        let line = format!("{} in {:.1}s", parts.join(", "), elapsed);
        if stats.steps_failed > 0 {
            println!("{}", line.red());
        } else if stats.warnings > 0 {
            println!("{}", line.yellow());
        } else {
            println!("{}", line.green());
        }
    }

    /// Append a timestamped record of this run to the launch log.
    ///
    /// Log failures are swallowed: the log is a convenience, not part of
    /// the exit-code contract.
    pub fn append_log(&self, path: &Path, outcome: &str) {
        let stats = self.stats();
        let line = format!(
            "{} outcome={} steps={} ok={} failed={} skipped={} warnings={} elapsed_ms={}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            outcome,
            stats.steps_run,
            stats.steps_succeeded,
            stats.steps_failed,
            stats.steps_skipped,
            stats.warnings,
            self.elapsed().as_millis(),
        );

        let result = path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
            })
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            eprintln!("{} could not write launch log: {}", "warning:".yellow(), e);
        }
    }
}
