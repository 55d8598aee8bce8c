//! Import graph extraction.
//!
//! Each source file the language profile handles is read and pattern
//! scanned for relative imports. Files that can't be read contribute no
//! edges; package imports never become edges.

use quarry_core::languages::{relative_imports, ImportProfile};
use quarry_core::{DependencyGraph, FileIndex};
use tracing::{debug, info};

/// Builds the dependency graph for every indexed file `profile` handles.
pub async fn extract_dependencies(index: &FileIndex, profile: &dyn ImportProfile) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut scanned = 0usize;

    for entry in index.by_path.values() {
        if !profile.handles(&entry.extension) {
            continue;
        }
        let source = match tokio::fs::read_to_string(&entry.path).await {
            Ok(source) => source,
            Err(e) => {
                debug!("Skipping imports of {}: {}", entry.relative_path, e);
                continue;
            }
        };
        scanned += 1;

        let known = |candidate: &str| index.contains(candidate);
        for target in relative_imports(profile, &entry.relative_path, &source, known) {
            graph.add_edge(&entry.relative_path, &target);
        }
    }

    info!(
        "Extracted {} {} import edges from {} files",
        graph.edge_count(),
        profile.language(),
        scanned
    );
    graph
}
