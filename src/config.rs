use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub driver: DriverConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Candidate commands probed in order until one answers `--version`
    pub candidates: Vec<String>,

    /// Optional `major.minor` floor on the detected interpreter
    pub min_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root the application is launched from (current dir when unset)
    pub dir: Option<PathBuf>,

    /// Manifest file name, relative to the project root
    pub manifest: String,

    /// Module passed to `<runtime> -m`
    pub entry: String,

    /// Scratch directory the application expects, relative to the project root
    pub temp_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Browser targets handed to the driver installer
    pub browsers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Deadline for version/package-list probes
    pub probe_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                "python".to_string(),
                "python3".to_string(),
                "py".to_string(),
            ],
            min_version: None,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            dir: None,
            manifest: "requirements.txt".to_string(),
            entry: "src.app".to_string(),
            temp_dir: "temp".to_string(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["chromium".to_string()],
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".hpblaunch").join("config.toml"))
    }

    /// Path of the append-only launch log
    pub fn log_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".hpblaunch").join("launch.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_candidates() {
        let config = Config::default();
        assert_eq!(config.runtime.candidates[0], "python");
        assert!(config.runtime.candidates.contains(&"py".to_string()));
    }

    #[test]
    fn test_config_default_project() {
        let config = Config::default();
        assert_eq!(config.project.manifest, "requirements.txt");
        assert_eq!(config.project.entry, "src.app");
        assert!(config.project.dir.is_none());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default();
        config.runtime.min_version = Some("3.10".to_string());
        config.driver.browsers = vec!["chromium".to_string(), "firefox".to_string()];

        let toml_string = toml::to_string(&config).unwrap();
        assert!(toml_string.contains("3.10"));

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(deserialized.runtime.min_version.as_deref(), Some("3.10"));
        assert_eq!(deserialized.driver.browsers.len(), 2);
    }

    #[test]
    fn test_config_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[project]\nmanifest = \"reqs.txt\"\nentry = \"src.app\"\ntemp_dir = \"temp\"\n").unwrap();
        assert_eq!(config.project.manifest, "reqs.txt");
        assert_eq!(config.limits.probe_timeout_secs, 15);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let config = Config::load_from(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(config.project.manifest, "requirements.txt");

        // Second load reads the file it just wrote
        let reloaded = Config::load_from(path).unwrap();
        assert_eq!(reloaded.runtime.candidates.len(), 3);
    }
}
