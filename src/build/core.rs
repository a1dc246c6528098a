use super::compile::{compile_sources, write_compile_commands};
use super::depgraph::{DependencyGraph, build_dependency_graph};
use super::libraries::resolve_libraries;
use super::link::link_target;
use super::manifest::{BuildManifest, SourceFile};
use super::publish::{assemble_publish_layout, finalize_publish};
use super::sources::locate_sources;
use super::staleness::{StaleReason, stale_sources};
use crate::config::{Layout, OutputKind, TargetConfig};
use crate::error::{BuildError, BuildFailure, BuildState};
use crate::process::CommandRunner;
use crate::ui;
use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Echo toolchain commands and print the header graph.
    pub verbose: bool,
}

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub target: String,
    pub state: BuildState,
    pub sources: usize,
    pub compiled: Vec<PathBuf>,
    pub binary: PathBuf,
    pub frameworks: Vec<PathBuf>,
    pub graph: DependencyGraph,
    pub elapsed: Duration,
}

// --- CORE: Build Target ---
pub fn build_target(
    config: &TargetConfig,
    layout: &Layout,
    runner: &mut dyn CommandRunner,
    options: BuildOptions,
) -> Result<BuildReport, BuildFailure> {
    let start_time = Instant::now();
    let abort = move |state: BuildState| {
        move |error: BuildError| BuildFailure {
            target: config.target.clone(),
            state,
            error,
        }
    };

    let kind = match config.kind {
        OutputKind::Executable => "executable",
        OutputKind::ApplicationBundle => "application bundle",
    };
    println!(
        "{} Target: {} ({} {})",
        "🚀".blue(),
        config.target.bold(),
        kind,
        config.name.bold()
    );

    let base = config.base_dir.as_path();
    let source_root = layout.source_root(base);
    let include_dir = layout.include_dir(base);

    // 1. Locate Sources
    let mut state = BuildState::Configured;
    let sources = locate_sources(&source_root, &config.modules, &config.extensions);
    if sources.is_empty() {
        return Err(abort(state)(BuildError::NoSources { root: source_root }));
    }
    state = BuildState::SourcesLocated;

    // 2. Manifest
    let manifest = BuildManifest::new(
        &source_root,
        &layout.object_dir(base, &config.target),
        &sources,
    )
    .map_err(abort(state))?;
    state = BuildState::ManifestBuilt;

    // 3. Header Graph + Incremental Check
    let graph = build_dependency_graph(
        runner,
        &config.compiler,
        &manifest,
        &include_dir,
        base,
        options.verbose,
    )
    .map_err(abort(state))?;
    if options.verbose {
        print_dependency_graph(&graph, &source_root);
    }

    let stale = stale_sources(&manifest, &graph).map_err(abort(state))?;
    if options.verbose {
        for (source, reason) in &stale {
            println!(
                "   {} {} ({})",
                "~".yellow(),
                source.relative.display(),
                describe_reason(reason, base)
            );
        }
    }
    state = BuildState::StaleSetComputed;

    // 4. Compile
    write_compile_commands(config, &manifest, &include_dir).map_err(abort(state))?;
    let stale_files: Vec<&SourceFile> = stale.iter().map(|(s, _)| *s).collect();
    if stale_files.is_empty() {
        println!(
            "{} Up to date ({} objects)",
            "⚡".green(),
            manifest.len()
        );
    }
    let compiled = compile_sources(runner, config, &stale_files, &include_dir, options.verbose)
        .map_err(abort(state))?;
    state = BuildState::Compiled;

    // 5. Libraries
    let libraries = resolve_libraries(
        &layout.library_root(base),
        &config.external_libs,
        &config.external_frameworks,
    )
    .map_err(abort(state))?;
    state = BuildState::LibrariesResolved;

    // 6. Publish Layout
    let publish = assemble_publish_layout(config, layout).map_err(abort(state))?;
    state = BuildState::PublishLayoutReady;

    // 7. Link
    let binary = link_target(
        runner,
        config,
        &manifest,
        &libraries,
        &publish,
        options.verbose,
    )
    .map_err(abort(state))?;
    state = BuildState::Linked;

    // 8. Bundle Frameworks
    let frameworks = finalize_publish(config, layout, &publish).map_err(abort(state))?;
    for framework in &frameworks {
        if let Some(name) = framework.file_name() {
            println!("   {} Bundled {}", "📦".cyan(), name.to_string_lossy());
        }
    }
    state = BuildState::Published;

    let elapsed = start_time.elapsed();
    println!(
        "{} Build finished in {:.2?} ({} compiled, {} total)",
        "✓".green(),
        elapsed,
        compiled.len(),
        manifest.len()
    );

    Ok(BuildReport {
        target: config.target.clone(),
        state,
        sources: manifest.len(),
        compiled,
        binary,
        frameworks,
        graph,
        elapsed,
    })
}

fn describe_reason(reason: &StaleReason, base: &Path) -> String {
    match reason {
        StaleReason::MissingObject => "no object file".to_string(),
        StaleReason::SourceNewer => "source changed".to_string(),
        StaleReason::HeaderNewer(header) => format!(
            "{} changed",
            header.strip_prefix(base).unwrap_or(header).display()
        ),
    }
}

/// Sources without any header are left out.
fn dependency_table(graph: &DependencyGraph, source_root: &Path) -> ui::Table {
    let mut table = ui::Table::new(&["Source", "Headers"]);
    for (source, headers) in graph.iter() {
        let names: Vec<String> = headers
            .iter()
            .filter_map(|h| h.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        if names.is_empty() {
            continue;
        }
        table.add_row(vec![
            source
                .strip_prefix(source_root)
                .unwrap_or(source)
                .display()
                .to_string(),
            names.join(" "),
        ]);
    }
    table
}

fn print_dependency_graph(graph: &DependencyGraph, source_root: &Path) {
    let table = dependency_table(graph, source_root);
    if table.is_empty() {
        println!("   {} No header dependencies", "-".dimmed());
        return;
    }
    table.print();
}

// --- COMMAND: Run the published artifact ---
pub fn run_artifact(binary: &Path, run_args: &[String]) -> Result<ExitStatus> {
    println!("{} Running {}...\n", "▶".green(), binary.display());
    Command::new(binary)
        .args(run_args)
        .status()
        .with_context(|| format!("Failed to run {}", binary.display()))
}
