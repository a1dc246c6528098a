//! Target configuration (`doit.toml`).
//!
//! Every top-level table in the file describes one target:
//!
//! ```toml
//! [game]
//! modules = ["linux", "common"]
//! type = "application_bundle"
//! name = "Game"
//! external_frameworks = ["Cocoa"]
//! cflags = "-std=c++17"
//! ```
//!
//! Tables are deserialized once into a [`TargetConfig`]; the build pipeline
//! never looks at raw TOML.

use crate::error::BuildError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE: &str = "doit.toml";
pub const DEFAULT_ARTIFACT_NAME: &str = "main";
pub const DEFAULT_COMPILER: &str = "clang++";
pub const DEFAULT_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "m", "mm"];

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// A single binary placed directly in the publish directory.
    #[default]
    Executable,
    /// `<name>.app/Contents/{MacOS,Frameworks}`.
    ApplicationBundle,
}

/// Directory names of a project, relative to its base directory.
///
/// These are fixed conventions, but they travel as a value so that no
/// component reaches for a global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub source: PathBuf,
    pub object: PathBuf,
    pub publish: PathBuf,
    pub library: PathBuf,
    pub include: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            object: PathBuf::from("obj"),
            publish: PathBuf::from("pub"),
            library: PathBuf::from("lib"),
            include: PathBuf::from("include"),
        }
    }
}

impl Layout {
    pub fn source_root(&self, base: &Path) -> PathBuf {
        base.join(&self.source)
    }

    pub fn object_root(&self, base: &Path) -> PathBuf {
        base.join(&self.object)
    }

    pub fn object_dir(&self, base: &Path, target: &str) -> PathBuf {
        self.object_root(base).join(target)
    }

    pub fn publish_root(&self, base: &Path) -> PathBuf {
        base.join(&self.publish)
    }

    pub fn publish_dir(&self, base: &Path, target: &str) -> PathBuf {
        self.publish_root(base).join(target)
    }

    pub fn library_root(&self, base: &Path) -> PathBuf {
        base.join(&self.library)
    }

    pub fn include_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.include)
    }
}

/// One `[target]` table as written in `doit.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetTable {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: OutputKind,
    pub name: Option<String>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub external_frameworks: Vec<String>,
    #[serde(default)]
    pub external_libs: Vec<String>,
    #[serde(default)]
    pub lflags: String,
    #[serde(default)]
    pub cflags: String,
    pub compiler: Option<String>,
}

/// Fully resolved configuration of a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub target: String,
    pub base_dir: PathBuf,
    pub modules: Vec<String>,
    pub kind: OutputKind,
    pub name: String,
    pub extensions: BTreeSet<String>,
    pub external_frameworks: Vec<String>,
    pub external_libs: Vec<String>,
    pub lflags: Vec<String>,
    pub cflags: Vec<String>,
    pub compiler: PathBuf,
}

impl TargetConfig {
    /// A target with every option at its default.
    pub fn new(target: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            base_dir: base_dir.into(),
            modules: Vec::new(),
            kind: OutputKind::default(),
            name: DEFAULT_ARTIFACT_NAME.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            external_frameworks: Vec::new(),
            external_libs: Vec::new(),
            lflags: Vec::new(),
            cflags: Vec::new(),
            compiler: PathBuf::from(DEFAULT_COMPILER),
        }
    }

    pub fn from_table(
        target: &str,
        base_dir: &Path,
        table: &TargetTable,
    ) -> Result<Self, BuildError> {
        validate_target_name(target)?;
        let mut config = Self::new(target, base_dir);

        let mut seen = HashSet::new();
        for module in &table.modules {
            if !is_relative_subpath(module) {
                return Err(BuildError::Configuration(format!(
                    "target `{target}`: module `{module}` must be a path inside src/"
                )));
            }
            if seen.insert(module.as_str()) {
                config.modules.push(module.clone());
            }
        }
        config.kind = table.kind;

        if let Some(name) = &table.name {
            if name.trim().is_empty() || !is_single_component(name) {
                return Err(BuildError::Configuration(format!(
                    "target `{target}`: `name` must be a plain file name, got `{name}`"
                )));
            }
            config.name = name.clone();
        }

        if let Some(extensions) = &table.extensions {
            // ".cpp" and "cpp" mean the same thing
            config.extensions = extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }

        config.external_frameworks = table.external_frameworks.clone();
        config.external_libs = table.external_libs.clone();
        config.lflags = split_flags(target, "lflags", &table.lflags)?;
        config.cflags = split_flags(target, "cflags", &table.cflags)?;

        if let Some(compiler) = &table.compiler {
            config.compiler = PathBuf::from(compiler);
        }

        Ok(config)
    }
}

/// Target names become one directory below `obj/` and `pub/`, so anything
/// but a plain name (empty, `.`, `..`, separators, absolute) is refused.
pub fn validate_target_name(name: &str) -> Result<(), BuildError> {
    if is_single_component(name) {
        Ok(())
    } else {
        Err(BuildError::Configuration(format!(
            "invalid target name `{name}`: must be a plain directory name"
        )))
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
}

fn is_relative_subpath(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\\')
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn split_flags(target: &str, key: &str, raw: &str) -> Result<Vec<String>, BuildError> {
    shell_words::split(raw).map_err(|e| {
        BuildError::Configuration(format!("target `{target}`: cannot parse `{key}`: {e}"))
    })
}

/// The parsed `doit.toml` of a project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub path: PathBuf,
    pub base_dir: PathBuf,
    pub targets: BTreeMap<String, TargetTable>,
}

impl ProjectConfig {
    pub fn load(path: &Path, base_dir: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            return Err(BuildError::Configuration(format!(
                "{} not found",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            BuildError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content, path, base_dir)
    }

    pub fn parse(content: &str, path: &Path, base_dir: &Path) -> Result<Self, BuildError> {
        let targets: BTreeMap<String, TargetTable> = toml::from_str(content).map_err(|e| {
            BuildError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        for name in targets.keys() {
            validate_target_name(name)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            base_dir: base_dir.to_path_buf(),
            targets,
        })
    }

    /// Target names in sorted order.
    pub fn target_names(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    pub fn target(&self, name: &str) -> Result<TargetConfig, BuildError> {
        let table = self.targets.get(name).ok_or_else(|| {
            let available = if self.targets.is_empty() {
                "none".to_string()
            } else {
                self.target_names().join(", ")
            };
            BuildError::Configuration(format!(
                "target `{name}` not found in {} (available: {available})",
                self.path.display()
            ))
        })?;
        TargetConfig::from_table(name, &self.base_dir, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ProjectConfig, BuildError> {
        ProjectConfig::parse(content, Path::new("doit.toml"), Path::new("/proj"))
    }

    #[test]
    fn test_empty_table_uses_defaults() {
        let project = parse("[t1]\n").unwrap();
        let config = project.target("t1").unwrap();

        assert_eq!(config.target, "t1");
        assert_eq!(config.base_dir, PathBuf::from("/proj"));
        assert!(config.modules.is_empty());
        assert_eq!(config.kind, OutputKind::Executable);
        assert_eq!(config.name, DEFAULT_ARTIFACT_NAME);
        assert!(config.extensions.contains("cpp"));
        assert!(config.extensions.contains("c"));
        assert_eq!(config.compiler, PathBuf::from(DEFAULT_COMPILER));
        assert!(config.cflags.is_empty());
    }

    #[test]
    fn test_full_table() {
        let project = parse(
            r#"
[game]
modules = ["linux", "common"]
type = "application_bundle"
name = "Game"
extensions = [".cpp", "mm"]
external_frameworks = ["Cocoa"]
external_libs = ["z"]
lflags = "-O2 -Wl,-dead_strip"
cflags = "-std=c++17 -DNAME=\"My Game\""
compiler = "/usr/bin/g++"
"#,
        )
        .unwrap();
        let config = project.target("game").unwrap();

        assert_eq!(config.modules, vec!["linux", "common"]);
        assert_eq!(config.kind, OutputKind::ApplicationBundle);
        assert_eq!(config.name, "Game");
        assert_eq!(
            config.extensions.iter().cloned().collect::<Vec<_>>(),
            vec!["cpp", "mm"]
        );
        assert_eq!(config.external_frameworks, vec!["Cocoa"]);
        assert_eq!(config.external_libs, vec!["z"]);
        assert_eq!(config.lflags, vec!["-O2", "-Wl,-dead_strip"]);
        assert_eq!(config.cflags, vec!["-std=c++17", "-DNAME=My Game"]);
        assert_eq!(config.compiler, PathBuf::from("/usr/bin/g++"));
    }

    #[test]
    fn test_missing_target_lists_available() {
        let project = parse("[b]\n[a]\n").unwrap();
        let err = project.target("c").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`c`"));
        assert!(msg.contains("a, b"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("[t1]\nmodlues = []\n").unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(parse("[t1]\ntype = \"dll\"\n").is_err());
    }

    #[test]
    fn test_unbalanced_quotes_in_flags() {
        let project = parse("[t1]\ncflags = \"-DX='oops\"\n").unwrap();
        assert!(project.target("t1").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ProjectConfig::load(Path::new("/nonexistent/doit.toml"), Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_layout_paths() {
        let layout = Layout::default();
        let base = Path::new("/proj");
        assert_eq!(layout.object_dir(base, "t1"), PathBuf::from("/proj/obj/t1"));
        assert_eq!(layout.publish_dir(base, "t1"), PathBuf::from("/proj/pub/t1"));
        assert_eq!(layout.source_root(base), PathBuf::from("/proj/src"));
        assert_eq!(layout.library_root(base), PathBuf::from("/proj/lib"));
        assert_eq!(layout.include_dir(base), PathBuf::from("/proj/include"));
    }

    #[test]
    fn test_target_names_must_be_plain() {
        for bad in ["..", ".", "", "../src", "a/b", "a\\b", "/abs"] {
            let content = format!("[{bad:?}]\n");
            let err = parse(&content).unwrap_err();
            assert!(matches!(err, BuildError::Configuration(_)), "{bad:?}");
            assert!(validate_target_name(bad).is_err(), "{bad:?}");
        }
        assert!(validate_target_name("game-macos_2").is_ok());
        assert!(parse("[\"v1.2\"]\n").is_ok());
    }

    #[test]
    fn test_artifact_name_must_be_plain() {
        let project = parse("[t1]\nname = \"../escape\"\n").unwrap();
        assert!(project.target("t1").is_err());
    }

    #[test]
    fn test_modules_are_deduplicated_and_stay_inside_src() {
        let project = parse("[t1]\nmodules = [\"mac\", \"net/posix\", \"mac\"]\n").unwrap();
        let config = project.target("t1").unwrap();
        assert_eq!(config.modules, vec!["mac", "net/posix"]);

        let project = parse("[t1]\nmodules = [\"../lib\"]\n").unwrap();
        assert!(project.target("t1").is_err());
    }
}
