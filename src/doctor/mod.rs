//! Doctor command for system diagnostics
//!
//! Health checks for everything the launch pipeline and the application
//! behind it depend on: runtime, pip, manifest, installed dependencies,
//! browser driver cache, scratch directory, disk space, and the network
//! path to the scraped site.

use crate::bootstrap::{Bootstrap, LaunchPlan, DRIVER_PACKAGE};
use crate::manifest;
use colored::Colorize;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Site the application scrapes; used for the network reachability check
const NETWORK_PROBE_URL: &str = "https://beauty.hotpepper.jp/";

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    bootstrap: Bootstrap,
}

impl Doctor {
    /// Create a new doctor instance over the resolved launch plan
    pub fn new(plan: LaunchPlan) -> Self {
        Self {
            bootstrap: Bootstrap::new(plan),
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let runtime = self.bootstrap.detect_runtime().await.ok();

        checks.push(self.check_runtime(runtime.as_ref()));
        checks.push(self.check_pip(runtime.as_ref()).await);
        checks.push(self.check_manifest());
        checks.push(self.check_dependencies(runtime.as_ref()).await);
        checks.push(self.check_driver_cache());
        checks.push(self.check_temp_dir());
        checks.push(self.check_disk_space());
        checks.push(self.check_network().await);

        checks
    }

    /// Check 1: runtime present
    fn check_runtime(&self, runtime: Option<&crate::bootstrap::RuntimeInfo>) -> HealthCheck {
        match runtime {
            Some(_) => HealthCheck::new("Python Runtime", HealthStatus::Pass),
            None => HealthCheck::new(
                "Python Runtime",
                HealthStatus::Fail(format!(
                    "no candidate answered --version (tried: {})",
                    self.bootstrap.plan().candidates.join(", ")
                )),
            ),
        }
    }

    /// Check 2: pip importable
    async fn check_pip(&self, runtime: Option<&crate::bootstrap::RuntimeInfo>) -> HealthCheck {
        let Some(runtime) = runtime else {
            return HealthCheck::new(
                "pip",
                HealthStatus::Fail("skipped: no runtime".to_string()),
            );
        };

        let args: Vec<String> = ["-m", "pip", "--version"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        match crate::process::run_captured(
            &runtime.command,
            &args,
            None,
            self.bootstrap.plan().probe_timeout,
        )
        .await
        {
            Ok(outcome) if outcome.success => HealthCheck::new("pip", HealthStatus::Pass),
            Ok(outcome) => HealthCheck::new(
                "pip",
                HealthStatus::Fail(format!("pip exited with code {}", outcome.exit_code)),
            ),
            Err(e) => HealthCheck::new("pip", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 3: manifest present and parseable
    fn check_manifest(&self) -> HealthCheck {
        match self.bootstrap.load_requirements() {
            Ok(reqs) if reqs.is_empty() => HealthCheck::new(
                "Manifest",
                HealthStatus::Warn("manifest lists no requirements".to_string()),
            ),
            Ok(_) => HealthCheck::new("Manifest", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Manifest", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 4: required packages installed
    async fn check_dependencies(
        &self,
        runtime: Option<&crate::bootstrap::RuntimeInfo>,
    ) -> HealthCheck {
        let Some(runtime) = runtime else {
            return HealthCheck::new(
                "Dependencies",
                HealthStatus::Fail("skipped: no runtime".to_string()),
            );
        };

        let requirements = match self.bootstrap.load_requirements() {
            Ok(reqs) => reqs,
            Err(e) => {
                return HealthCheck::new(
                    "Dependencies",
                    HealthStatus::Fail(format!("cannot read manifest: {}", e)),
                )
            }
        };

        match self
            .bootstrap
            .missing_dependencies(runtime, &requirements)
            .await
        {
            Ok(missing) if missing.is_empty() => {
                HealthCheck::new("Dependencies", HealthStatus::Pass)
            }
            Ok(missing) => HealthCheck::new(
                "Dependencies",
                HealthStatus::Warn(format!("missing: {}", missing.join(", "))),
            ),
            Err(e) => HealthCheck::new("Dependencies", HealthStatus::Fail(e.to_string())),
        }
    }

    /// Check 5: browser driver cache present
    fn check_driver_cache(&self) -> HealthCheck {
        let requirements = self.bootstrap.load_requirements().unwrap_or_default();
        if !manifest::requires_package(&requirements, DRIVER_PACKAGE) {
            return HealthCheck::new(
                "Browser Driver",
                HealthStatus::Warn("manifest does not name the driver package".to_string()),
            );
        }

        match driver_cache_dir() {
            Some(dir) if dir.exists() => HealthCheck::new("Browser Driver", HealthStatus::Pass),
            Some(dir) => HealthCheck::new(
                "Browser Driver",
                HealthStatus::Warn(format!(
                    "browser cache not found at {} (run: python -m playwright install)",
                    dir.display()
                )),
            ),
            None => HealthCheck::new(
                "Browser Driver",
                HealthStatus::Warn("could not determine the browser cache location".to_string()),
            ),
        }
    }

    /// Check 6: temp directory writable
    fn check_temp_dir(&self) -> HealthCheck {
        let plan = self.bootstrap.plan();
        let temp_dir = plan.project_dir.join(&plan.temp_dir);

        if !plan.project_dir.exists() {
            return HealthCheck::new(
                "Temp Directory",
                HealthStatus::Fail("project directory does not exist".to_string()),
            );
        }

        if let Err(e) = std::fs::create_dir_all(&temp_dir) {
            return HealthCheck::new(
                "Temp Directory",
                HealthStatus::Fail(format!("cannot create {}: {}", temp_dir.display(), e)),
            );
        }

        let probe = temp_dir.join(".hpblaunch_probe");
        match std::fs::write(&probe, "probe") {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
                HealthCheck::new("Temp Directory", HealthStatus::Pass)
            }
            Err(_) => HealthCheck::new(
                "Temp Directory",
                HealthStatus::Fail("no write permission in temp directory".to_string()),
            ),
        }
    }

    /// Check 7: disk space on the project volume
    fn check_disk_space(&self) -> HealthCheck {
        use sysinfo::Disks;
        let disks = Disks::new_with_refreshed_list();

        let project_dir = &self.bootstrap.plan().project_dir;

        for disk in &disks {
            if project_dir.starts_with(disk.mount_point()) {
                let available_gb = disk.available_space() / (1024 * 1024 * 1024);

                return if available_gb < 1 {
                    HealthCheck::new(
                        "Disk Space",
                        HealthStatus::Fail(format!(
                            "less than 1GB available ({} GB)",
                            available_gb
                        )),
                    )
                } else if available_gb < 5 {
                    HealthCheck::new(
                        "Disk Space",
                        HealthStatus::Warn(format!(
                            "low disk space ({} GB available)",
                            available_gb
                        )),
                    )
                } else {
                    HealthCheck::new("Disk Space", HealthStatus::Pass)
                };
            }
        }

        HealthCheck::new(
            "Disk Space",
            HealthStatus::Warn("could not determine disk space".to_string()),
        )
    }

    /// Check 8: network path to the scraped site
    async fn check_network(&self) -> HealthCheck {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        match client.get(NETWORK_PROBE_URL).send().await {
            Ok(response) if response.status().is_success() => {
                HealthCheck::new("Network", HealthStatus::Pass)
            }
            Ok(response) => HealthCheck::new(
                "Network",
                HealthStatus::Warn(format!(
                    "{} answered with status {}",
                    NETWORK_PROBE_URL,
                    response.status()
                )),
            ),
            Err(_) => HealthCheck::new(
                "Network",
                HealthStatus::Warn(format!("cannot reach {}", NETWORK_PROBE_URL)),
            ),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!();
        println!("hpblaunch diagnostics");
        println!();
        println!("{:<16} {}", "Check", "Status");
        println!("{}", "=".repeat(50));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("{} {}", "WARN".yellow(), msg),
                HealthStatus::Fail(msg) => format!("{} {}", "FAIL".red(), msg),
            };

            println!("{:<16} {}", check.name, status);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// Default Playwright browser cache location per platform
fn driver_cache_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("ms-playwright"))
    } else if cfg!(target_os = "macos") {
        dirs::home_dir().map(|d| d.join("Library").join("Caches").join("ms-playwright"))
    } else {
        dirs::cache_dir().map(|d| d.join("ms-playwright"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_plan(dir: &std::path::Path) -> LaunchPlan {
        LaunchPlan {
            runtime_override: None,
            candidates: vec!["definitely-not-python-xyz".to_string()],
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
    fn test_health_status_equality() {
        assert_eq!(HealthStatus::Pass, HealthStatus::Pass);
        assert_eq!(
            HealthStatus::Warn("test".to_string()),
            HealthStatus::Warn("test".to_string())
        );
        assert_ne!(
            HealthStatus::Warn("a".to_string()),
            HealthStatus::Fail("a".to_string())
        );
    }

    #[test]
    fn test_overall_status_pass_with_warnings() {
        let checks = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&checks));
    }

    #[test]
    fn test_overall_status_fail() {
        let checks = vec![
            HealthCheck::new("a", HealthStatus::Pass),
            HealthCheck::new("b", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&checks));
    }

    #[test]
    fn test_check_manifest_missing() {
        let dir = tempfile::tempdir().unwrap();
        let doctor = Doctor::new(test_plan(dir.path()));

        let check = doctor.check_manifest();
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }

    #[test]
    fn test_check_manifest_empty_warns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "# nothing yet\n").unwrap();
        let doctor = Doctor::new(test_plan(dir.path()));

        let check = doctor.check_manifest();
        assert!(matches!(check.status, HealthStatus::Warn(_)));
    }

    #[test]
    fn test_check_temp_dir_writable() {
        let dir = tempfile::tempdir().unwrap();
        let doctor = Doctor::new(test_plan(dir.path()));

        let check = doctor.check_temp_dir();
        assert_eq!(check.status, HealthStatus::Pass);
        assert!(dir.path().join("temp").exists());
    }

    #[test]
    fn test_check_temp_dir_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = test_plan(dir.path());
        plan.project_dir = dir.path().join("gone");
        let doctor = Doctor::new(plan);

        let check = doctor.check_temp_dir();
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }

    #[test]
    fn test_check_runtime_fail_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let doctor = Doctor::new(test_plan(dir.path()));

        let check = doctor.check_runtime(None);
        match check.status {
            HealthStatus::Fail(msg) => assert!(msg.contains("definitely-not-python-xyz")),
            other => panic!("expected Fail, got {:?}", other),
        }
    }
}
