//! Source discovery.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the source files of a target, sorted.
///
/// With no modules, the whole source root is scanned recursively. Otherwise
/// only the top level of the source root is scanned, plus each module's
/// subdirectory recursively. Missing directories contribute nothing.
pub fn locate_sources(
    source_root: &Path,
    modules: &[String],
    extensions: &BTreeSet<String>,
) -> Vec<PathBuf> {
    let suffixes: Vec<String> = extensions.iter().map(|e| format!(".{e}")).collect();
    let mut found = BTreeSet::new();

    if modules.is_empty() {
        found.extend(files_in_dir(source_root, &suffixes, true));
    } else {
        found.extend(files_in_dir(source_root, &suffixes, false));
        let mut seen = HashSet::new();
        for module in modules {
            if seen.insert(module.as_str()) {
                found.extend(files_in_dir(&source_root.join(module), &suffixes, true));
            }
        }
    }

    found.into_iter().collect()
}

fn files_in_dir(dir: &Path, suffixes: &[String], recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).min_depth(1).follow_links(true);
    if !recursive {
        walker = walker.max_depth(1);
    }

    walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            suffixes.iter().any(|s| name.ends_with(s.as_str()))
        })
        .map(|e| e.into_path())
        .collect()
}
