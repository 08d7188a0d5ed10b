//! Shared launch-pipeline logic for the default command and `check`
//!
//! Sequences the preflight and launch steps, records telemetry for each,
//! and applies the failure policy: every step is fatal except the
//! browser-driver provisioning, which degrades to a warning.

use crate::bootstrap::{Bootstrap, RuntimeInfo, DRIVER_PACKAGE};
use crate::cli::Verbosity;
use crate::errors::{LaunchError, Result};
use crate::manifest::{self, Requirement};
use crate::telemetry::{LaunchEvent, LaunchTelemetry};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Drives the launch sequence over a resolved plan
pub struct LaunchPipeline {
    bootstrap: Bootstrap,
    telemetry: LaunchTelemetry,
    verbosity: Verbosity,
}

impl LaunchPipeline {
    pub fn new(bootstrap: Bootstrap, telemetry: LaunchTelemetry, verbosity: Verbosity) -> Self {
        Self {
            bootstrap,
            telemetry,
            verbosity,
        }
    }

    /// Run the full pipeline. With `launch_app` false only the preflight
    /// steps run (the `check` path reuses `Bootstrap::check` instead; this
    /// flag exists for tests that exercise the pipeline without an app).
    pub async fn run(&self, launch_app: bool) -> Result<()> {
        let runtime = self.step_runtime().await?;
        let requirements = self.step_manifest()?;
        self.step_dependencies(&runtime, &requirements).await?;
        self.step_driver(&runtime, &requirements).await;

        if launch_app {
            self.step_launch(&runtime).await?;
        }

        Ok(())
    }

    /// Step 1: locate the runtime
    async fn step_runtime(&self) -> Result<RuntimeInfo> {
        let started = self.step_started("runtime");

        match self.bootstrap.detect_runtime().await {
            Ok(runtime) => {
                self.telemetry.record(LaunchEvent::RuntimeDetected {
                    command: runtime.command.clone(),
                    version: runtime.version.clone(),
                });
                self.step_completed("runtime", true, started);
                self.info(&format!(
                    "Using {} (Python {})",
                    runtime.command.bold(),
                    runtime.version
                ));
                Ok(runtime)
            }
            Err(e) => {
                self.step_completed("runtime", false, started);
                if matches!(e, LaunchError::RuntimeNotFound { .. }) {
                    Bootstrap::show_runtime_install_instructions(
                        &self.bootstrap.plan().candidates,
                    );
                }
                Err(e)
            }
        }
    }

    /// Step 2: verify and parse the manifest
    fn step_manifest(&self) -> Result<Vec<Requirement>> {
        let started = self.step_started("manifest");

        match self.bootstrap.load_requirements() {
            Ok(requirements) => {
                self.step_completed("manifest", true, started);
                self.info(&format!(
                    "Manifest ok ({} requirement(s))",
                    requirements.len()
                ));
                Ok(requirements)
            }
            Err(e) => {
                self.step_completed("manifest", false, started);
                Err(e)
            }
        }
    }

    /// Step 3: conditional dependency install
    async fn step_dependencies(
        &self,
        runtime: &RuntimeInfo,
        requirements: &[Requirement],
    ) -> Result<()> {
        let started = self.step_started("dependencies");

        let spinner = self.spinner("Checking installed packages");
        let missing = self
            .bootstrap
            .missing_dependencies(runtime, requirements)
            .await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let missing = match missing {
            Ok(missing) => missing,
            Err(e) => {
                self.step_completed("dependencies", false, started);
                return Err(e);
            }
        };

        if missing.is_empty() && !self.bootstrap.plan().reinstall {
            self.step_skipped("dependencies", "all requirements satisfied");
            self.info("Dependencies already satisfied");
            return Ok(());
        }

        if !missing.is_empty() {
            self.info(&format!("Missing packages: {}", missing.join(", ")));
        }
        self.info("Installing dependencies (pip install)...");

        match self.bootstrap.install_dependencies(runtime).await {
            Ok(()) => {
                self.step_completed("dependencies", true, started);
                Ok(())
            }
            Err(e) => {
                self.step_completed("dependencies", false, started);
                Err(e)
            }
        }
    }

    /// Step 4: browser-driver provisioning; failure is a warning, not an error
    async fn step_driver(&self, runtime: &RuntimeInfo, requirements: &[Requirement]) {
        if self.bootstrap.plan().skip_driver {
            self.step_skipped("driver", "--skip-driver");
            return;
        }

        if !manifest::requires_package(requirements, DRIVER_PACKAGE) {
            self.step_skipped("driver", "manifest does not require the driver package");
            return;
        }

        let started = self.step_started("driver");
        self.info("Provisioning browser binaries (playwright install)...");

        match self.bootstrap.install_browser_driver(runtime).await {
            Ok(0) => {
                self.step_completed("driver", true, started);
            }
            Ok(code) => {
                self.step_completed("driver", false, started);
                self.warn("driver", &format!("installer exited with code {}", code));
                Bootstrap::show_driver_warning(&format!("exit code {}", code));
            }
            Err(e) => {
                self.step_completed("driver", false, started);
                self.warn("driver", &e.to_string());
                Bootstrap::show_driver_warning(&e.to_string());
            }
        }
    }

    /// Step 5: launch the application and wait for it
    async fn step_launch(&self, runtime: &RuntimeInfo) -> Result<()> {
        let started = self.step_started("launch");
        self.info(&format!(
            "Launching {} -m {}...",
            runtime.command,
            self.bootstrap.plan().entry
        ));

        match self.bootstrap.launch_app(runtime).await {
            Ok(()) => {
                self.step_completed("launch", true, started);
                Ok(())
            }
            Err(e) => {
                self.step_completed("launch", false, started);
                Err(e)
            }
        }
    }

    fn step_started(&self, step: &str) -> Instant {
        self.telemetry.record(LaunchEvent::StepStarted {
            step: step.to_string(),
        });
        Instant::now()
    }

    fn step_completed(&self, step: &str, success: bool, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        self.telemetry.record(LaunchEvent::StepCompleted {
            step: step.to_string(),
            success,
            duration_ms,
        });

        if self.verbosity.show_events() {
            let status = if success { "ok" } else { "failed" };
            eprintln!("[step] {} {} ({}ms)", step, status, duration_ms);
        }
    }

    fn step_skipped(&self, step: &str, reason: &str) {
        self.telemetry.record(LaunchEvent::StepSkipped {
            step: step.to_string(),
            reason: reason.to_string(),
        });

        if self.verbosity.show_events() {
            eprintln!("[step] {} skipped: {}", step, reason);
        }
    }

    fn warn(&self, step: &str, message: &str) {
        self.telemetry.record(LaunchEvent::WarningRaised {
            step: step.to_string(),
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        if self.verbosity.show_progress() {
            println!("{}", message);
        }
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.verbosity.show_progress() {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    }
}
