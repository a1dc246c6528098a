//! Source to object path mapping.

use super::utils::normalize_path;
use crate::error::{BuildError, ObjectCollision};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const OBJECT_EXTENSION: &str = "o";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source root.
    pub relative: PathBuf,
    pub object: PathBuf,
}

/// The object directory of a target and every source it compiles.
///
/// Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildManifest {
    object_dir: PathBuf,
    sources: Vec<SourceFile>,
}

impl BuildManifest {
    /// Maps each source to `<object_dir>/<relative path>.o`.
    ///
    /// Fails with [`BuildError::ManifestCollision`] when two sources would
    /// share an object file (`a.c` and `a.cpp` in the same directory).
    pub fn new(
        source_root: &Path,
        object_dir: &Path,
        sources: &[PathBuf],
    ) -> Result<Self, BuildError> {
        let mut entries = Vec::with_capacity(sources.len());
        let mut by_object: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        for path in sources {
            let relative = path
                .strip_prefix(source_root)
                .unwrap_or(path.as_path())
                .to_path_buf();
            let object = object_path(object_dir, &relative);

            by_object
                .entry(object.clone())
                .or_default()
                .push(path.clone());
            entries.push(SourceFile {
                path: path.clone(),
                relative,
                object,
            });
        }

        let collisions: Vec<ObjectCollision> = by_object
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(object, sources)| ObjectCollision { object, sources })
            .collect();
        if !collisions.is_empty() {
            return Err(BuildError::ManifestCollision { collisions });
        }

        Ok(Self {
            object_dir: object_dir.to_path_buf(),
            sources: entries,
        })
    }

    pub fn object_dir(&self) -> &Path {
        &self.object_dir
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn objects(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(|s| s.object.as_path())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Object path of a source, as a pure function of its relative path.
pub fn object_path(object_dir: &Path, relative: &Path) -> PathBuf {
    normalize_path(&object_dir.join(relative.with_extension(OBJECT_EXTENSION)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_mirrors_source_tree() {
        let manifest = BuildManifest::new(
            Path::new("src"),
            Path::new("obj/t1"),
            &[PathBuf::from("src/foo/bar.cpp")],
        )
        .unwrap();

        let entry = &manifest.sources()[0];
        assert_eq!(entry.relative, PathBuf::from("foo/bar.cpp"));
        assert_eq!(entry.object, PathBuf::from("obj/t1/foo/bar.o"));
        assert_eq!(manifest.object_dir(), Path::new("obj/t1"));
    }

    #[test]
    fn test_object_path_is_order_independent() {
        let a = PathBuf::from("/p/src/a.cpp");
        let b = PathBuf::from("/p/src/sub/b.c");
        let forward = BuildManifest::new(
            Path::new("/p/src"),
            Path::new("/p/obj/t"),
            &[a.clone(), b.clone()],
        )
        .unwrap();
        let backward =
            BuildManifest::new(Path::new("/p/src"), Path::new("/p/obj/t"), &[b, a]).unwrap();

        let mut f: Vec<_> = forward.objects().collect();
        let mut r: Vec<_> = backward.objects().collect();
        f.sort();
        r.sort();
        assert_eq!(f, r);
    }

    #[test]
    fn test_multi_dot_names_keep_stem() {
        assert_eq!(
            object_path(Path::new("obj/t1"), Path::new("./gen/parser.tab.cc")),
            PathBuf::from("obj/t1/gen/parser.tab.o")
        );
    }

    #[test]
    fn test_extension_collision_detected() {
        let err = BuildManifest::new(
            Path::new("src"),
            Path::new("obj/t1"),
            &[
                PathBuf::from("src/a.c"),
                PathBuf::from("src/a.cpp"),
                PathBuf::from("src/b.cpp"),
            ],
        )
        .unwrap_err();

        match err {
            BuildError::ManifestCollision { collisions } => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].object, PathBuf::from("obj/t1/a.o"));
                assert_eq!(collisions[0].sources.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
