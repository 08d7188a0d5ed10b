//! Command-line argument parsing for hpblaunch
//!
//! Provides clap-based CLI with subcommands and verbosity control.
//! Without a subcommand the full launch pipeline runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hpblaunch - preflight and launch the HPB image posting tool
#[derive(Parser, Debug)]
#[command(name = "hpblaunch")]
#[command(version)]
#[command(about = "Preflight, dependency setup, and launcher for the HPB image posting tool", long_about = None)]
pub struct Args {
    /// Runtime command to use instead of probing the configured candidates
    #[arg(short, long)]
    pub runtime: Option<String>,

    /// Project root containing the manifest and application sources
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Dependency manifest path (relative paths resolve against the project root)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Application module passed to `<runtime> -m`
    #[arg(long)]
    pub entry: Option<String>,

    /// Skip the browser-driver provisioning step
    #[arg(long)]
    pub skip_driver: bool,

    /// Run the dependency installer even when all requirements are present
    #[arg(long)]
    pub reinstall: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress and step output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the preflight checks without launching the application
    Check,

    /// Run system diagnostics and health checks
    Doctor,

    /// Display current configuration
    Config,

    /// Remove the application temp directory
    Clean {
        /// Also remove the launch log
        #[arg(long)]
        logs: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Get project root (current dir if not specified here or in config)
    pub fn project_dir(&self, config_dir: Option<&PathBuf>) -> PathBuf {
        self.project_dir
            .clone()
            .or_else(|| config_dir.cloned())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl Verbosity {
    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show per-step event lines
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Check if should echo captured subprocess output
    pub fn show_command_output(&self) -> bool {
        matches!(self, Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            runtime: None,
            project_dir: None,
            manifest: None,
            entry: None,
            skip_driver: false,
            reinstall: false,
            config: None,
            verbose: 0,
            quiet: false,
            command: None,
        }
    }

    #[test]
    fn test_verbosity_quiet() {
        let args = Args {
            quiet: true,
            ..base_args()
        };
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        assert_eq!(base_args().verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_verbose() {
        let args = Args {
            verbose: 1,
            ..base_args()
        };
        assert_eq!(args.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_very_verbose() {
        let args = Args {
            verbose: 3,
            ..base_args()
        };
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let args = Args {
            verbose: 2,
            quiet: true,
            ..base_args()
        };
        assert_eq!(args.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_project_dir_flag_wins() {
        let args = Args {
            project_dir: Some(PathBuf::from("/flag")),
            ..base_args()
        };
        let from_config = PathBuf::from("/config");
        assert_eq!(args.project_dir(Some(&from_config)), PathBuf::from("/flag"));
    }

    #[test]
    fn test_project_dir_falls_back_to_config() {
        let from_config = PathBuf::from("/config");
        assert_eq!(
            base_args().project_dir(Some(&from_config)),
            PathBuf::from("/config")
        );
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());

        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());

        assert!(!Verbosity::Verbose.show_command_output());
        assert!(Verbosity::VeryVerbose.show_command_output());
    }

    #[test]
    fn test_parse_subcommand_clean() {
        let args = Args::parse_from(["hpblaunch", "clean", "--logs"]);
        assert!(matches!(args.command, Some(Commands::Clean { logs: true })));
    }

    #[test]
    fn test_parse_default_is_launch() {
        let args = Args::parse_from(["hpblaunch", "--skip-driver"]);
        assert!(args.command.is_none());
        assert!(args.skip_driver);
    }
}
