//! Build errors and their exit codes.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A fatal build error. There is no recovery path: the first one ends the
/// invocation.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no source files found under {}", .root.display())]
    NoSources { root: PathBuf },

    #[error("compilation of {} failed", .file.display())]
    Compile { file: PathBuf, stderr: String },

    #[error("linking {} failed", .output.display())]
    Link { output: PathBuf, stderr: String },

    #[error("{}", describe_duplicates(.libraries, .frameworks))]
    DuplicateDependency {
        libraries: Vec<String>,
        frameworks: Vec<String>,
    },

    #[error("{}", describe_collisions(.collisions))]
    ManifestCollision { collisions: Vec<ObjectCollision> },

    #[error("failed to execute `{}`", .program.display())]
    Toolchain {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Io { .. } => 1,
            BuildError::Configuration(_) | BuildError::NoSources { .. } => 2,
            BuildError::Compile { .. } => 3,
            BuildError::Link { .. } => 4,
            BuildError::DuplicateDependency { .. } => 5,
            BuildError::ManifestCollision { .. } => 6,
            BuildError::Toolchain { .. } => 7,
        }
    }

    /// Captured toolchain output, for errors that have one.
    pub fn toolchain_output(&self) -> Option<&str> {
        match self {
            BuildError::Compile { stderr, .. } | BuildError::Link { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Several sources that derive the same object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCollision {
    pub object: PathBuf,
    pub sources: Vec<PathBuf>,
}

fn describe_duplicates(libraries: &[String], frameworks: &[String]) -> String {
    let mut parts = Vec::new();
    if !libraries.is_empty() {
        parts.push(format!("duplicate libraries: {}", libraries.join(", ")));
    }
    if !frameworks.is_empty() {
        parts.push(format!("duplicate frameworks: {}", frameworks.join(", ")));
    }
    parts.join("; ")
}

fn describe_collisions(collisions: &[ObjectCollision]) -> String {
    let mut out = String::from("several sources map to the same object file:");
    for collision in collisions {
        let sources: Vec<String> = collision
            .sources
            .iter()
            .map(|s| s.display().to_string())
            .collect();
        out.push_str(&format!(
            "\n  {} <- {}",
            collision.object.display(),
            sources.join(", ")
        ));
    }
    out
}

/// Pipeline states, in order. A failure leaves the build in the last state
/// it reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    Configured,
    SourcesLocated,
    ManifestBuilt,
    StaleSetComputed,
    Compiled,
    LibrariesResolved,
    PublishLayoutReady,
    Linked,
    Published,
}

impl BuildState {
    /// The step that runs when leaving this state.
    pub fn next_step(&self) -> &'static str {
        match self {
            BuildState::Configured => "source discovery",
            BuildState::SourcesLocated => "manifest construction",
            BuildState::ManifestBuilt => "staleness analysis",
            BuildState::StaleSetComputed => "compilation",
            BuildState::Compiled => "library resolution",
            BuildState::LibrariesResolved => "publish layout preparation",
            BuildState::PublishLayoutReady => "linking",
            BuildState::Linked => "publishing",
            BuildState::Published => "nothing",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A [`BuildError`] tagged with the target and the state it aborted from.
#[derive(Debug, Error)]
#[error("target `{target}` aborted during {}", .state.next_step())]
pub struct BuildFailure {
    pub target: String,
    pub state: BuildState,
    #[source]
    pub error: BuildError,
}

impl BuildFailure {
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

pub(crate) trait IoResultExt<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T, BuildError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T, BuildError> {
        self.map_err(|e| BuildError::io(format!("failed to {action} {}", path.display()), e))
    }
}
