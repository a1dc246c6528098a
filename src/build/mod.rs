mod clean;
mod compile;
mod core;
mod depgraph;
mod feedback;
mod libraries;
mod link;
mod manifest;
mod publish;
mod sources;
mod staleness;
mod utils;
mod watcher;

pub use clean::clean;
pub use compile::{COMPILE_COMMANDS_FILE, compile_invocation, compile_sources, write_compile_commands};
pub use self::core::{BuildOptions, BuildReport, build_target, run_artifact};
pub use depgraph::{
    DEPENDENCY_FLAG, DependencyGraph, build_dependency_graph, dependency_invocation,
    parse_make_rule,
};
pub use feedback::FeedbackAnalyzer;
pub use libraries::{FRAMEWORK_SUFFIX, LIBRARY_PREFIX, ResolvedLibrarySet, resolve_libraries};
pub use link::{link_invocation, link_target};
pub use manifest::{BuildManifest, OBJECT_EXTENSION, SourceFile, object_path};
pub use publish::{
    BUNDLE_RPATH, PublishLayout, assemble_publish_layout, bundle_dir, finalize_publish,
};
pub use sources::locate_sources;
pub use staleness::{StaleReason, stale_reason, stale_sources};
pub use utils::normalize_path;
pub use watcher::watch;
