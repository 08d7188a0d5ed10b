//! Error types for the hpblaunch pipeline
//!
//! One variant per failure point of the launch sequence, so callers can
//! map errors onto the exit-code contract without string matching.

use thiserror::Error;

/// Main error type for the launcher
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No configured runtime candidate responded to a version probe
    #[error("No working Python runtime found (tried: {tried})")]
    RuntimeNotFound { tried: String },

    /// Detected runtime is older than the configured floor
    #[error("Runtime {version} is older than required {required}")]
    RuntimeTooOld { version: String, required: String },

    /// Dependency manifest file is absent
    #[error("Dependency manifest not found: {path}")]
    ManifestMissing { path: String },

    /// Manifest exists but a line could not be understood
    #[error("Invalid requirement on line {line}: {text}")]
    ManifestParse { line: usize, text: String },

    /// Dependency installer exited non-zero
    #[error("Dependency installation failed (pip exited with code {code})")]
    InstallFailed { code: i32 },

    /// Application module exited non-zero
    #[error("Application exited with code {code}")]
    AppFailed { code: i32 },

    /// A subprocess could not be spawned or produced unreadable output
    #[error("Command '{command}' failed: {reason}")]
    CommandError { command: String, reason: String },

    /// A probe command exceeded its deadline
    #[error("Command '{command}' timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    /// Package list output from pip could not be decoded
    #[error("Could not read installed package list: {0}")]
    PackageListError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Launcher error: {0}")]
    Generic(String),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Convert anyhow errors to LaunchError
impl From<anyhow::Error> for LaunchError {
    fn from(err: anyhow::Error) -> Self {
        LaunchError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_install_failed() {
        let err = LaunchError::InstallFailed { code: 2 };
        assert!(err.to_string().contains("code 2"));
    }

    #[test]
    fn test_error_display_runtime_not_found() {
        let err = LaunchError::RuntimeNotFound {
            tried: "python, python3, py".to_string(),
        };
        assert!(err.to_string().contains("python3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LaunchError = io.into();
        assert!(matches!(err, LaunchError::IoError(_)));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: LaunchError = anyhow::anyhow!("wrapped").into();
        assert!(err.to_string().contains("wrapped"));
    }
}
