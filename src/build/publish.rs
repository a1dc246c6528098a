//! Publish directory preparation and finalization.

use super::libraries::FRAMEWORK_SUFFIX;
use super::utils::{copy_dir_recursive, remove_dir_if_exists};
use crate::config::{Layout, OutputKind, TargetConfig, validate_target_name};
use crate::error::{BuildError, IoResultExt};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime search path that lets a bundled binary find `Contents/Frameworks`.
pub const BUNDLE_RPATH: &str = "-Wl,-rpath,@executable_path/../Frameworks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishLayout {
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    pub frameworks_dir: Option<PathBuf>,
}

impl PublishLayout {
    pub fn binary_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }
}

pub fn bundle_dir(publish_root: &Path, name: &str) -> PathBuf {
    publish_root.join(format!("{name}.app"))
}

/// Wipes `pub/<target>` and recreates the directory tree for the output kind.
pub fn assemble_publish_layout(
    config: &TargetConfig,
    layout: &Layout,
) -> Result<PublishLayout, BuildError> {
    validate_target_name(&config.target)?;
    let root = layout.publish_dir(&config.base_dir, &config.target);
    remove_dir_if_exists(&root)?;

    let publish = match config.kind {
        OutputKind::Executable => PublishLayout {
            root: root.clone(),
            bin_dir: root.clone(),
            frameworks_dir: None,
        },
        OutputKind::ApplicationBundle => {
            let contents = bundle_dir(&root, &config.name).join("Contents");
            PublishLayout {
                root: root.clone(),
                bin_dir: contents.join("MacOS"),
                frameworks_dir: Some(contents.join("Frameworks")),
            }
        }
    };

    fs::create_dir_all(&publish.bin_dir).with_path("create", &publish.bin_dir)?;
    if let Some(frameworks) = &publish.frameworks_dir {
        fs::create_dir_all(frameworks).with_path("create", frameworks)?;
    }

    Ok(publish)
}

/// Copies every `*.framework` under `lib/<module>` into the bundle.
///
/// Returns the copied framework directories; nothing happens for layouts
/// without a frameworks directory.
pub fn finalize_publish(
    config: &TargetConfig,
    layout: &Layout,
    publish: &PublishLayout,
) -> Result<Vec<PathBuf>, BuildError> {
    let Some(frameworks_dir) = &publish.frameworks_dir else {
        return Ok(Vec::new());
    };

    let library_root = layout.library_root(&config.base_dir);
    let mut copied = Vec::new();
    let mut seen = HashSet::new();

    for module in &config.modules {
        if !seen.insert(module.as_str()) {
            continue;
        }
        let module_dir = library_root.join(module);
        if !module_dir.is_dir() {
            continue;
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&module_dir)
            .with_path("read", &module_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().ends_with(FRAMEWORK_SUFFIX))
            })
            .collect();
        entries.sort();

        for framework in entries {
            let Some(file_name) = framework.file_name() else {
                continue;
            };
            let dest = frameworks_dir.join(file_name);
            copy_dir_recursive(&framework, &dest)?;
            copied.push(dest);
        }
    }

    Ok(copied)
}
