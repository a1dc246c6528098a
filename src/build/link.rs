//! Single linker invocation over the whole manifest.

use super::feedback::FeedbackAnalyzer;
use super::libraries::ResolvedLibrarySet;
use super::manifest::BuildManifest;
use super::publish::{BUNDLE_RPATH, PublishLayout};
use crate::config::{OutputKind, TargetConfig};
use crate::error::BuildError;
use crate::process::{CommandRunner, Invocation};
use colored::*;
use std::path::PathBuf;

/// Every object of the manifest is linked, not only the freshly compiled ones.
pub fn link_invocation(
    config: &TargetConfig,
    manifest: &BuildManifest,
    libraries: &ResolvedLibrarySet,
    publish: &PublishLayout,
) -> Invocation {
    let mut inv = Invocation::new(&config.compiler)
        .arg("-o")
        .arg(publish.binary_path(&config.name))
        .args(manifest.objects());

    for dir in &libraries.library_dirs {
        inv = inv.arg(format!("-L{}", dir.display()));
    }
    for dir in &libraries.framework_dirs {
        inv = inv.arg(format!("-F{}", dir.display()));
    }
    for lib in &libraries.libraries {
        inv = inv.arg(format!("-l{lib}"));
    }
    for framework in &libraries.frameworks {
        inv = inv.arg("-framework").arg(framework);
    }

    inv = inv.args(&config.lflags);
    if config.kind == OutputKind::ApplicationBundle {
        inv = inv.arg(BUNDLE_RPATH);
    }

    inv.cwd(&config.base_dir)
}

/// Links the published binary; returns its path.
pub fn link_target(
    runner: &mut dyn CommandRunner,
    config: &TargetConfig,
    manifest: &BuildManifest,
    libraries: &ResolvedLibrarySet,
    publish: &PublishLayout,
    verbose: bool,
) -> Result<PathBuf, BuildError> {
    let invocation = link_invocation(config, manifest, libraries, publish);
    let output_path = publish.binary_path(&config.name);

    println!("   {} Linking {}...", "🔗".cyan(), config.name.bold());
    if verbose {
        println!("   {} {}", "$".dimmed(), invocation.to_string().dimmed());
    }

    let output = runner.run(&invocation)?;
    if !output.success {
        println!("{}", output.stderr);
        println!("{} Linking failed", "x".red());
        if let Some(hint) = FeedbackAnalyzer::analyze(&output.stderr) {
            println!("{} {}", "💡".yellow(), hint);
        }
        return Err(BuildError::Link {
            output: output_path,
            stderr: output.stderr,
        });
    }

    Ok(output_path)
}
