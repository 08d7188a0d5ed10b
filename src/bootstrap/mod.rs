//! Bootstrap system for hpblaunch
//!
//! Detects the Python runtime, checks the dependency manifest, drives the
//! conditional dependency install, provisions browser binaries, and starts
//! the application module. Each step maps onto the original launcher's
//! exit-code contract.

use crate::errors::{LaunchError, Result};
use crate::manifest::{self, InstalledPackage, Requirement};
use crate::process;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the browser-automation package whose presence in the manifest
/// triggers the driver-provisioning step
pub const DRIVER_PACKAGE: &str = "playwright";

/// Exit code for every fatal pipeline failure
pub const EXIT_CODE_FAILURE: i32 = 1;

/// Everything the pipeline needs to know, resolved from config and flags
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Explicit runtime command, bypassing candidate probing
    pub runtime_override: Option<String>,

    /// Candidate commands probed in order
    pub candidates: Vec<String>,

    /// Optional `major.minor` floor on the runtime version
    pub min_version: Option<String>,

    /// Project root; subprocess working directory
    pub project_dir: PathBuf,

    /// Absolute manifest path
    pub manifest_path: PathBuf,

    /// Module passed to `<runtime> -m`
    pub entry: String,

    /// Scratch directory name, relative to the project root
    pub temp_dir: String,

    /// Browser targets for the driver installer
    pub browsers: Vec<String>,

    /// Skip the driver step entirely
    pub skip_driver: bool,

    /// Run the installer even when requirements are satisfied
    pub reinstall: bool,

    /// Deadline for version and package-list probes. The install and
    /// launch steps run untimed with inherited stdio.
    pub probe_timeout: Duration,
}

/// Detected runtime interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    /// Command that answered the probe
    pub command: String,

    /// Version reported by `--version` ("3.11.4", or "unknown")
    pub version: String,
}

/// Preflight result backing the `check` subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Ready,
    RuntimeMissing,
    ManifestMissing,
    DependenciesMissing(Vec<String>),
}

/// Runtime detector and launch-step driver
pub struct Bootstrap {
    plan: LaunchPlan,
}

impl Bootstrap {
    pub fn new(plan: LaunchPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    /// Probe the configured candidates and return the first interpreter
    /// that answers `--version`. Spawn failures move on to the next
    /// candidate; only exhausting the list is an error.
    pub async fn detect_runtime(&self) -> Result<RuntimeInfo> {
        let candidates: Vec<String> = match &self.plan.runtime_override {
            Some(cmd) => vec![cmd.clone()],
            None => self.plan.candidates.clone(),
        };

        for candidate in &candidates {
            let probe = process::run_captured(
                candidate,
                &["--version".to_string()],
                None,
                self.plan.probe_timeout,
            )
            .await;

            let outcome = match probe {
                Ok(outcome) if outcome.success => outcome,
                _ => continue,
            };

            let version =
                parse_version(outcome.first_line()).unwrap_or_else(|| "unknown".to_string());

            if let Some(min) = &self.plan.min_version {
                if version != "unknown" && !version_at_least(&version, min) {
                    return Err(LaunchError::RuntimeTooOld {
                        version,
                        required: min.clone(),
                    });
                }
            }

            return Ok(RuntimeInfo {
                command: candidate.clone(),
                version,
            });
        }

        Err(LaunchError::RuntimeNotFound {
            tried: candidates.join(", "),
        })
    }

    /// Load and parse the manifest; absence is fatal
    pub fn load_requirements(&self) -> Result<Vec<Requirement>> {
        manifest::load_manifest(&self.plan.manifest_path)
    }

    /// Query the runtime's installed package list
    pub async fn installed_packages(&self, runtime: &RuntimeInfo) -> Result<Vec<InstalledPackage>> {
        let args: Vec<String> = ["-m", "pip", "list", "--format=json"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let outcome = process::run_captured(
            &runtime.command,
            &args,
            Some(&self.plan.project_dir),
            self.plan.probe_timeout,
        )
        .await?;

        if !outcome.success {
            return Err(LaunchError::PackageListError(format!(
                "pip list exited with code {}",
                outcome.exit_code
            )));
        }

        manifest::parse_installed(&outcome.output)
    }

    /// Requirement names absent from the installed set
    pub async fn missing_dependencies(
        &self,
        runtime: &RuntimeInfo,
        requirements: &[Requirement],
    ) -> Result<Vec<String>> {
        let installed = self.installed_packages(runtime).await?;
        Ok(manifest::missing_requirements(requirements, &installed))
    }

    /// Run `pip install -r <manifest>` with inherited stdio; non-zero is fatal
    pub async fn install_dependencies(&self, runtime: &RuntimeInfo) -> Result<()> {
        let args: Vec<String> = vec![
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            self.plan.manifest_path.display().to_string(),
        ];

        let code =
            process::run_interactive(&runtime.command, &args, Some(&self.plan.project_dir)).await?;

        if code != 0 {
            return Err(LaunchError::InstallFailed { code });
        }

        Ok(())
    }

    /// Run the browser-driver installer. The caller treats a non-zero exit
    /// (or a spawn failure) as a warning, so this returns the exit code
    /// instead of mapping it to an error.
    pub async fn install_browser_driver(&self, runtime: &RuntimeInfo) -> Result<i32> {
        let mut args: Vec<String> = vec![
            "-m".to_string(),
            DRIVER_PACKAGE.to_string(),
            "install".to_string(),
        ];
        args.extend(self.plan.browsers.iter().cloned());

        process::run_interactive(&runtime.command, &args, Some(&self.plan.project_dir)).await
    }

    /// Launch the application module and wait for it; non-zero is fatal
    pub async fn launch_app(&self, runtime: &RuntimeInfo) -> Result<()> {
        let args: Vec<String> = vec!["-m".to_string(), self.plan.entry.clone()];

        let code =
            process::run_interactive(&runtime.command, &args, Some(&self.plan.project_dir)).await?;

        if code != 0 {
            return Err(LaunchError::AppFailed { code });
        }

        Ok(())
    }

    /// Run the preflight checks without side effects
    pub async fn check(&self) -> Result<BootstrapStatus> {
        let runtime = match self.detect_runtime().await {
            Ok(runtime) => runtime,
            Err(LaunchError::RuntimeNotFound { .. }) => return Ok(BootstrapStatus::RuntimeMissing),
            Err(e) => return Err(e),
        };

        let requirements = match self.load_requirements() {
            Ok(reqs) => reqs,
            Err(LaunchError::ManifestMissing { .. }) => {
                return Ok(BootstrapStatus::ManifestMissing)
            }
            Err(e) => return Err(e),
        };

        let missing = self.missing_dependencies(&runtime, &requirements).await?;
        if !missing.is_empty() {
            return Ok(BootstrapStatus::DependenciesMissing(missing));
        }

        Ok(BootstrapStatus::Ready)
    }

    /// Guidance printed when no runtime answered the probe
    pub fn show_runtime_install_instructions(candidates: &[String]) {
        eprintln!();
        eprintln!("{} No Python runtime found.", "error:".red().bold());
        eprintln!();
        eprintln!("Tried: {}", candidates.join(", "));
        eprintln!();
        eprintln!("Install Python 3 and make sure it is on your PATH:");
        eprintln!("   Windows: https://www.python.org/downloads/ (check \"Add python.exe to PATH\")");
        eprintln!("   macOS:   brew install python");
        eprintln!("   Linux:   use your distribution's package manager");
        eprintln!();
    }

    /// Guidance printed when the driver installer failed (non-fatal)
    pub fn show_driver_warning(detail: &str) {
        eprintln!();
        eprintln!(
            "{} Browser driver installation failed: {}",
            "warning:".yellow().bold(),
            detail
        );
        eprintln!("The application may not be able to drive a browser.");
        eprintln!("You can retry later with: python -m playwright install");
        eprintln!();
    }
}

/// Extract "3.11.4" from a `--version` line like "Python 3.11.4"
pub fn parse_version(line: &str) -> Option<String> {
    line.split_whitespace()
        .find(|token| {
            token.chars().next().is_some_and(|c| c.is_ascii_digit())
                && token.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(|token| token.trim_end_matches('.').to_string())
}

/// Compare dotted version strings component-wise ("3.9" < "3.11")
pub fn version_at_least(version: &str, min: &str) -> bool {
    let parse = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0))
            .collect()
    };

    let have = parse(version);
    let want = parse(min);

    for i in 0..have.len().max(want.len()) {
        let h = have.get(i).copied().unwrap_or(0);
        let w = want.get(i).copied().unwrap_or(0);
        if h != w {
            return h > w;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_plan(dir: &std::path::Path) -> LaunchPlan {
        LaunchPlan {
            runtime_override: None,
            candidates: vec!["python".to_string()],
            min_version: None,
            project_dir: dir.to_path_buf(),
            manifest_path: dir.join("requirements.txt"),
            entry: "src.app".to_string(),
            temp_dir: "temp".to_string(),
            browsers: vec!["chromium".to_string()],
            skip_driver: false,
            reinstall: false,
            probe_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("Python 3.11.4"), Some("3.11.4".to_string()));
        assert_eq!(parse_version("Python 3.12.0b1"), None);
        assert_eq!(parse_version(""), None);
        assert_eq!(parse_version("3.9"), Some("3.9".to_string()));
    }

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least("3.11.4", "3.10"));
        assert!(version_at_least("3.10", "3.10"));
        assert!(!version_at_least("3.9.18", "3.10"));
        // Numeric comparison, not lexicographic
        assert!(version_at_least("3.11", "3.9"));
    }

    #[test]
    fn test_bootstrap_status_equality() {
        assert_eq!(BootstrapStatus::Ready, BootstrapStatus::Ready);
        assert_eq!(
            BootstrapStatus::DependenciesMissing(vec!["playwright".to_string()]),
            BootstrapStatus::DependenciesMissing(vec!["playwright".to_string()])
        );
        assert_ne!(BootstrapStatus::Ready, BootstrapStatus::RuntimeMissing);
    }

    #[test]
    fn test_exit_code_constant() {
        assert_eq!(EXIT_CODE_FAILURE, 1);
    }

    #[tokio::test]
    async fn test_detect_runtime_none_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = test_plan(dir.path());
        plan.candidates = vec!["definitely-not-python-xyz".to_string()];

        let err = Bootstrap::new(plan).detect_runtime().await.unwrap_err();
        assert!(matches!(err, LaunchError::RuntimeNotFound { .. }));
    }

    #[cfg(unix)]
    fn write_stub(dir: &std::path::Path, name: &str, script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_runtime_with_stub() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "python-stub", "echo \"Python 3.11.4\"");

        let mut plan = test_plan(dir.path());
        plan.candidates = vec!["definitely-not-python-xyz".to_string(), stub.clone()];

        let runtime = Bootstrap::new(plan).detect_runtime().await.unwrap();
        assert_eq!(runtime.command, stub);
        assert_eq!(runtime.version, "3.11.4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detect_runtime_too_old() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "python-stub", "echo \"Python 3.8.10\"");

        let mut plan = test_plan(dir.path());
        plan.candidates = vec![stub];
        plan.min_version = Some("3.10".to_string());

        let err = Bootstrap::new(plan).detect_runtime().await.unwrap_err();
        assert!(matches!(err, LaunchError::RuntimeTooOld { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_reports_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "python-stub", "echo \"Python 3.11.4\"");

        let mut plan = test_plan(dir.path());
        plan.candidates = vec![stub];

        let status = Bootstrap::new(plan).check().await.unwrap();
        assert_eq!(status, BootstrapStatus::ManifestMissing);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_reports_missing_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        // Stub answers both `--version` and `-m pip list --format=json`
        let stub = write_stub(
            dir.path(),
            "python-stub",
            r#"if [ "$1" = "--version" ]; then echo "Python 3.11.4"; else echo '[{"name": "requests", "version": "2.31.0"}]'; fi"#,
        );
        std::fs::write(dir.path().join("requirements.txt"), "requests\nplaywright\n").unwrap();

        let mut plan = test_plan(dir.path());
        plan.candidates = vec![stub];

        let status = Bootstrap::new(plan).check().await.unwrap();
        assert_eq!(
            status,
            BootstrapStatus::DependenciesMissing(vec!["playwright".to_string()])
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_ready() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(
            dir.path(),
            "python-stub",
            r#"if [ "$1" = "--version" ]; then echo "Python 3.11.4"; else echo '[{"name": "requests", "version": "2.31.0"}, {"name": "playwright", "version": "1.40.0"}]'; fi"#,
        );
        std::fs::write(dir.path().join("requirements.txt"), "requests\nplaywright\n").unwrap();

        let mut plan = test_plan(dir.path());
        plan.candidates = vec![stub];

        let status = Bootstrap::new(plan).check().await.unwrap();
        assert_eq!(status, BootstrapStatus::Ready);
    }
}
