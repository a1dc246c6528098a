//! Build artifact cleanup.
//!
//! - `doit --clean <target>` - Remove `obj/<target>` and `pub/<target>`
//! - `doit --clean` - Remove the whole `obj/` and `pub/` directories

use super::utils::remove_dir_if_exists;
use crate::config::{Layout, validate_target_name};
use crate::error::BuildError;
use colored::*;
use std::path::{Path, PathBuf};

/// Removes build outputs; returns the directories that existed and are gone.
pub fn clean(
    base_dir: &Path,
    layout: &Layout,
    targets: &[String],
) -> Result<Vec<PathBuf>, BuildError> {
    for target in targets {
        validate_target_name(target)?;
    }

    let dirs: Vec<PathBuf> = if targets.is_empty() {
        vec![layout.object_root(base_dir), layout.publish_root(base_dir)]
    } else {
        targets
            .iter()
            .flat_map(|t| [layout.object_dir(base_dir, t), layout.publish_dir(base_dir, t)])
            .collect()
    };

    let mut removed = Vec::new();
    for dir in dirs {
        if remove_dir_if_exists(&dir)? {
            println!("{} Removed {}", "🗑️".red(), dir.display());
            removed.push(dir);
        }
    }

    if removed.is_empty() {
        println!("{} Nothing to clean", "!".yellow());
    } else {
        println!("{} Clean complete.", "✓".green());
    }
    Ok(removed)
}
