//! # doit CLI Entry Point
//!
//! `doit [TARGET]... [--clean] [--run] [--watch] [-- ARGS]`
//!
//! Builds the named targets from `doit.toml` (all of them when none is
//! named). This is the single place where errors become exit statuses.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use doit::build::{self, BuildOptions, BuildReport};
use doit::config::{CONFIG_FILE, Layout, ProjectConfig};
use doit::error::{BuildError, BuildFailure};
use doit::process::SystemRunner;

#[derive(Parser)]
#[command(name = "doit")]
#[command(about = "Minimal build orchestrator for C/C++ targets", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Targets to build (default: every target in doit.toml)
    targets: Vec<String>,
    /// Delete build artifacts first (next build runs from scratch)
    #[arg(long)]
    clean: bool,
    /// Run the program after building
    #[arg(long)]
    run: bool,
    /// Rebuild whenever src/ changes
    #[arg(long, conflicts_with = "run")]
    watch: bool,
    /// Project directory
    #[arg(short = 'C', long, default_value = ".")]
    dir: PathBuf,
    /// Configuration file (default: <dir>/doit.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show toolchain commands and header dependencies
    #[arg(short, long)]
    verbose: bool,
    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
    /// Arguments passed to the program with --run
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "doit", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match execute(&cli) {
        Ok(code) => code,
        Err(err) => {
            println!("{} {:#}", "x".red(), err);
            ExitCode::from(exit_code_of(&err))
        }
    }
}

fn exit_code_of(err: &anyhow::Error) -> u8 {
    let code = if let Some(failure) = err.downcast_ref::<BuildFailure>() {
        failure.exit_code()
    } else if let Some(error) = err.downcast_ref::<BuildError>() {
        error.exit_code()
    } else {
        1
    };
    u8::try_from(code).unwrap_or(1)
}

fn execute(cli: &Cli) -> Result<ExitCode> {
    let layout = Layout::default();
    let base_dir = std::fs::canonicalize(&cli.dir)
        .map_err(|e| BuildError::Configuration(format!("{}: {e}", cli.dir.display())))?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| base_dir.join(CONFIG_FILE));

    if cli.clean {
        // Named targets must exist before anything is deleted
        if !cli.targets.is_empty() {
            let project = ProjectConfig::load(&config_path, &base_dir)?;
            for target in &cli.targets {
                project.target(target)?;
            }
        }
        build::clean(&base_dir, &layout, &cli.targets)?;
    }

    if cli.watch {
        let source_root = layout.source_root(&base_dir);
        build::watch(&source_root, || {
            build_selected(cli, &config_path, &base_dir, &layout)?;
            Ok(())
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    let reports = build_selected(cli, &config_path, &base_dir, &layout)?;

    if cli.run {
        for report in &reports {
            let status = build::run_artifact(&report.binary, &cli.args)?;
            if !status.success() {
                let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
                return Ok(ExitCode::from(code.max(1)));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads the config fresh and builds each selected target in turn.
fn build_selected(
    cli: &Cli,
    config_path: &Path,
    base_dir: &Path,
    layout: &Layout,
) -> Result<Vec<BuildReport>> {
    let project = ProjectConfig::load(config_path, base_dir)?;
    let targets = if cli.targets.is_empty() {
        project.target_names()
    } else {
        cli.targets.clone()
    };
    if targets.is_empty() {
        return Err(BuildError::Configuration(format!(
            "{} defines no targets",
            config_path.display()
        ))
        .into());
    }

    let options = BuildOptions {
        verbose: cli.verbose,
    };
    let mut runner = SystemRunner;
    let mut reports = Vec::with_capacity(targets.len());
    for target in &targets {
        let config = project.target(target)?;
        let report = build::build_target(&config, layout, &mut runner, options)?;
        reports.push(report);
    }
    Ok(reports)
}
