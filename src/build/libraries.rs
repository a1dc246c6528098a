//! Discovery of libraries and frameworks under `lib/`.
//!
//! Layout expected under the library root:
//!
//! ```text
//! lib/
//!   sdl/
//!     libSDL2.a          -> library "SDL2", search dir lib/sdl
//!   mac/
//!     Sparkle.framework/ -> framework "Sparkle", search dir lib/mac
//! ```

use crate::error::{BuildError, IoResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LIBRARY_PREFIX: &str = "lib";
pub const FRAMEWORK_SUFFIX: &str = ".framework";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLibrarySet {
    pub libraries: Vec<String>,
    pub frameworks: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    pub framework_dirs: Vec<PathBuf>,
}

/// What a single directory entry contributes, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LibraryEntry {
    Library(String),
    Framework(String),
}

fn classify(path: &Path, is_dir: bool, is_file: bool) -> Option<LibraryEntry> {
    let file_name = path.file_name()?.to_string_lossy();
    if file_name.starts_with('.') {
        return None;
    }

    if is_dir {
        let name = file_name.strip_suffix(FRAMEWORK_SUFFIX)?;
        return (!name.is_empty()).then(|| LibraryEntry::Framework(name.to_string()));
    }

    if is_file {
        let rest = file_name.strip_prefix(LIBRARY_PREFIX)?;
        // libFoo.a, libFoo.so.1, libFoo.dylib -> Foo
        let name = rest.split('.').next().unwrap_or_default();
        return (!name.is_empty()).then(|| LibraryEntry::Library(name.to_string()));
    }

    None
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_path("read", dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Scans the immediate subdirectories of `library_root` and merges what they
/// contain with the externally declared names.
///
/// A name may occur only once per collection. Several flavors of one library
/// in the same subdirectory (`libFoo.a` next to `libFoo.dylib`) count once.
pub fn resolve_libraries(
    library_root: &Path,
    external_libs: &[String],
    external_frameworks: &[String],
) -> Result<ResolvedLibrarySet, BuildError> {
    let mut resolved = ResolvedLibrarySet::default();

    if library_root.is_dir() {
        for subdir in sorted_entries(library_root)? {
            if !subdir.is_dir() {
                continue;
            }

            let mut libraries: Vec<String> = Vec::new();
            let mut frameworks: Vec<String> = Vec::new();
            for entry in sorted_entries(&subdir)? {
                match classify(&entry, entry.is_dir(), entry.is_file()) {
                    Some(LibraryEntry::Library(name)) if !libraries.contains(&name) => {
                        libraries.push(name)
                    }
                    Some(LibraryEntry::Framework(name)) if !frameworks.contains(&name) => {
                        frameworks.push(name)
                    }
                    _ => {}
                }
            }

            if !libraries.is_empty() {
                resolved.library_dirs.push(subdir.clone());
                resolved.libraries.extend(libraries);
            }
            if !frameworks.is_empty() {
                resolved.framework_dirs.push(subdir);
                resolved.frameworks.extend(frameworks);
            }
        }
    }

    resolved.libraries.extend(external_libs.iter().cloned());
    resolved.frameworks.extend(external_frameworks.iter().cloned());

    let libraries = duplicates(&resolved.libraries);
    let frameworks = duplicates(&resolved.frameworks);
    if !libraries.is_empty() || !frameworks.is_empty() {
        return Err(BuildError::DuplicateDependency {
            libraries,
            frameworks,
        });
    }

    Ok(resolved)
}

fn duplicates(names: &[String]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}
