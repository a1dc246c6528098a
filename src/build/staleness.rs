//! Incremental build decisions.

use super::depgraph::DependencyGraph;
use super::manifest::{BuildManifest, SourceFile};
use super::utils::modified_time;
use crate::error::BuildError;

/// Why a source has to be recompiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    MissingObject,
    SourceNewer,
    HeaderNewer(std::path::PathBuf),
}

// --- Helper: Check one source against its object and headers ---
pub fn stale_reason(
    source: &SourceFile,
    graph: &DependencyGraph,
) -> Result<Option<StaleReason>, BuildError> {
    let Some(obj_mtime) = modified_time(&source.object)? else {
        return Ok(Some(StaleReason::MissingObject));
    };

    if let Some(src_mtime) = modified_time(&source.path)?
        && obj_mtime < src_mtime
    {
        return Ok(Some(StaleReason::SourceNewer));
    }

    if let Some(headers) = graph.headers_of(&source.path) {
        for header in headers {
            // Headers that disappeared are simply no longer included
            if let Some(h_mtime) = modified_time(header)?
                && obj_mtime < h_mtime
            {
                return Ok(Some(StaleReason::HeaderNewer(header.clone())));
            }
        }
    }

    Ok(None)
}

/// Manifest entries that need compiling, in manifest order.
pub fn stale_sources<'a>(
    manifest: &'a BuildManifest,
    graph: &DependencyGraph,
) -> Result<Vec<(&'a SourceFile, StaleReason)>, BuildError> {
    let mut stale = Vec::new();
    for source in manifest.sources() {
        if let Some(reason) = stale_reason(source, graph)? {
            stale.push((source, reason));
        }
    }
    Ok(stale)
}
