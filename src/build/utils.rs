use crate::error::{BuildError, IoResultExt};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

// --- Helper: Lexical path normalization (no filesystem access) ---
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !matches!(out.components().next_back(), Some(Component::RootDir)) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// --- Helper: Modification time, None when the file is missing ---
pub fn modified_time(path: &Path) -> Result<Option<SystemTime>, BuildError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified().with_path("read mtime of", path)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(
            format!("failed to stat {}", path.display()),
            e,
        )),
    }
}

// --- Helper: Remove a directory tree if it exists ---
pub fn remove_dir_if_exists(path: &Path) -> Result<bool, BuildError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(
            format!("failed to remove {}", path.display()),
            e,
        )),
    }
}

// --- Helper: Recursive copy, symlinks recreated as symlinks ---
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let msg = format!("failed to walk {}", src.display());
            BuildError::io(msg, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| BuildError::io("path outside copy root", std::io::Error::other(e)))?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).with_path("create", &target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).with_path("copy to", &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), BuildError> {
    let link = fs::read_link(src).with_path("read link", src)?;
    std::os::unix::fs::symlink(&link, dst).with_path("create link", dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), BuildError> {
    if src.is_dir() {
        copy_dir_recursive(&fs::canonicalize(src).with_path("resolve", src)?, dst)
    } else {
        fs::copy(src, dst).with_path("copy to", dst).map(|_| ())
    }
}
