//! Header dependency discovery through the compiler's `-MM` mode.

use super::manifest::BuildManifest;
use super::utils::normalize_path;
use crate::error::BuildError;
use crate::process::{CommandRunner, Invocation};
use colored::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Flag that makes the compiler print a make rule instead of compiling.
pub const DEPENDENCY_FLAG: &str = "-MM";

/// Headers each source includes, as reported by the compiler for this build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    headers: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DependencyGraph {
    pub fn insert(&mut self, source: PathBuf, headers: BTreeSet<PathBuf>) {
        self.headers.insert(source, headers);
    }

    pub fn headers_of(&self, source: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.headers.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<PathBuf>)> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Splits a make rule into its prerequisites.
///
/// Tokens are separated by whitespace and `\` line continuations; the first
/// token (the rule target, e.g. `bar.o:`) is dropped.
pub fn parse_make_rule(output: &str) -> Vec<String> {
    output
        .replace("\\\r\n", " ")
        .replace("\\\n", " ")
        .split_whitespace()
        .filter(|token| *token != "\\")
        .skip(1)
        .map(str::to_string)
        .collect()
}

pub fn dependency_invocation(compiler: &Path, source: &Path, include_dir: &Path) -> Invocation {
    Invocation::new(compiler)
        .arg(DEPENDENCY_FLAG)
        .arg(source)
        .arg(format!("-I{}", include_dir.display()))
}

/// Queries the compiler once per manifest entry.
///
/// A failed query is reported as a warning and leaves that source with an
/// empty header set; only a compiler that cannot be started is fatal.
pub fn build_dependency_graph(
    runner: &mut dyn CommandRunner,
    compiler: &Path,
    manifest: &BuildManifest,
    include_dir: &Path,
    base_dir: &Path,
    verbose: bool,
) -> Result<DependencyGraph, BuildError> {
    let mut graph = DependencyGraph::default();

    for source in manifest.sources() {
        let invocation = dependency_invocation(compiler, &source.path, include_dir).cwd(base_dir);
        if verbose {
            println!("   {} {}", "$".dimmed(), invocation.to_string().dimmed());
        }

        let output = runner.run(&invocation)?;
        let headers = if output.success {
            parse_make_rule(&output.stdout)
                .into_iter()
                .map(|token| normalize_path(&base_dir.join(token)))
                .filter(|header| *header != normalize_path(&source.path))
                .collect()
        } else {
            println!(
                "{} Could not list headers of {}; relying on its own timestamp",
                "!".yellow(),
                source.relative.display()
            );
            BTreeSet::new()
        };

        graph.insert(source.path.clone(), headers);
    }

    Ok(graph)
}
