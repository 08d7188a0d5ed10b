//! hpblaunch - Main CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use hpblaunch::bootstrap::{Bootstrap, BootstrapStatus, LaunchPlan, EXIT_CODE_FAILURE};
use hpblaunch::cli::{Args, Commands};
use hpblaunch::config::Config;
use hpblaunch::doctor::Doctor;
use hpblaunch::pipeline::LaunchPipeline;
use hpblaunch::telemetry::LaunchTelemetry;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };

    let plan = resolve_plan(&args, &config);

    match &args.command {
        Some(Commands::Check) => {
            run_check(plan).await?;
        }
        Some(Commands::Doctor) => {
            run_doctor(plan).await;
        }
        Some(Commands::Config) => {
            let config_path = match &args.config {
                Some(path) => path.clone(),
                None => Config::config_path()?,
            };
            show_config(&config, &plan, &config_path);
        }
        Some(Commands::Clean { logs }) => {
            clean_state(&plan, *logs).await?;
        }
        None => {
            run_launch(&args, plan).await;
        }
    }

    Ok(())
}

/// Build the resolved plan from config-file values and flag overrides
fn resolve_plan(args: &Args, config: &Config) -> LaunchPlan {
    let project_dir = args.project_dir(config.project.dir.as_ref());

    let manifest_path = match &args.manifest {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => project_dir.join(path),
        None => project_dir.join(&config.project.manifest),
    };

    LaunchPlan {
        runtime_override: args.runtime.clone(),
        candidates: config.runtime.candidates.clone(),
        min_version: config.runtime.min_version.clone(),
        project_dir,
        manifest_path,
        entry: args
            .entry
            .clone()
            .unwrap_or_else(|| config.project.entry.clone()),
        temp_dir: config.project.temp_dir.clone(),
        browsers: config.driver.browsers.clone(),
        skip_driver: args.skip_driver,
        reinstall: args.reinstall,
        probe_timeout: Duration::from_secs(config.limits.probe_timeout_secs),
    }
}

/// Default command: full preflight then application launch
async fn run_launch(args: &Args, plan: LaunchPlan) {
    let telemetry = LaunchTelemetry::new();
    let verbosity = args.verbosity();
    let pipeline = LaunchPipeline::new(Bootstrap::new(plan), telemetry.clone(), verbosity);

    let result = pipeline.run(true).await;

    if verbosity.show_progress() {
        println!();
        telemetry.display_summary();
    }

    match result {
        Ok(()) => {
            if let Ok(log_path) = Config::log_path() {
                telemetry.append_log(&log_path, "ok");
            }
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            if let Ok(log_path) = Config::log_path() {
                telemetry.append_log(&log_path, "failed");
            }
            std::process::exit(EXIT_CODE_FAILURE);
        }
    }
}

/// `check`: preflight only, no installs and no launch
async fn run_check(plan: LaunchPlan) -> Result<()> {
    let bootstrap = Bootstrap::new(plan);

    match bootstrap.check().await? {
        BootstrapStatus::Ready => {
            println!("{} environment is ready to launch", "ok:".green().bold());
        }
        BootstrapStatus::RuntimeMissing => {
            Bootstrap::show_runtime_install_instructions(&bootstrap.plan().candidates);
            std::process::exit(EXIT_CODE_FAILURE);
        }
        BootstrapStatus::ManifestMissing => {
            eprintln!(
                "{} dependency manifest not found: {}",
                "error:".red().bold(),
                bootstrap.plan().manifest_path.display()
            );
            std::process::exit(EXIT_CODE_FAILURE);
        }
        BootstrapStatus::DependenciesMissing(missing) => {
            eprintln!(
                "{} missing packages: {}",
                "not ready:".yellow().bold(),
                missing.join(", ")
            );
            eprintln!("Run hpblaunch without a subcommand to install them and launch.");
            std::process::exit(EXIT_CODE_FAILURE);
        }
    }

    Ok(())
}

async fn run_doctor(plan: LaunchPlan) {
    let doctor = Doctor::new(plan);

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

async fn clean_state(plan: &LaunchPlan, logs: bool) -> Result<()> {
    use tokio::fs;

    let temp_dir = plan.project_dir.join(&plan.temp_dir);
    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir).await?;
        println!("Removed temp directory: {}", temp_dir.display());
    } else {
        println!("No temp directory found.");
    }

    if logs {
        let log_path = Config::log_path()?;
        if log_path.exists() {
            fs::remove_file(&log_path).await?;
            println!("Removed launch log: {}", log_path.display());
        }
    }

    Ok(())
}

fn show_config(config: &Config, plan: &LaunchPlan, config_path: &std::path::Path) {
    println!();
    println!("hpblaunch configuration ({})", config_path.display());
    println!();

    println!("Runtime:");
    println!("  Candidates:  {}", config.runtime.candidates.join(", "));
    println!(
        "  Min version: {}",
        config.runtime.min_version.as_deref().unwrap_or("none")
    );
    println!();

    println!("Project:");
    println!("  Root:     {}", plan.project_dir.display());
    println!("  Manifest: {}", plan.manifest_path.display());
    println!("  Entry:    {}", plan.entry);
    println!("  Temp dir: {}", plan.temp_dir);
    println!();

    println!("Driver:");
    println!("  Browsers: {}", config.driver.browsers.join(", "));
    println!();

    println!("Limits:");
    println!("  Probe timeout: {}s", config.limits.probe_timeout_secs);
    println!();
}
