//! Centrality ranking for project files.
//!
//! We use a simplified PageRank over the import graph. Files imported by
//! many others rank higher, which makes a reasonable tie-break when two
//! candidates are otherwise equally relevant.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use quarry_core::DependencyGraph;
use std::collections::HashMap;

/// Stores centrality scores after computation.
#[derive(Debug, Default, Clone)]
pub struct CentralityScores {
    scores: HashMap<String, f64>,
}

impl CentralityScores {
    /// Gets the score for a path, 0.0 if it has no edges.
    pub fn get(&self, path: &str) -> f64 {
        self.scores.get(path).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Computes centrality scores for every file in the graph.
///
/// * `iterations` - Number of iterations (10-20 is usually enough)
/// * `damping` - Damping factor (0.85 is standard)
pub fn compute_centrality(deps: &DependencyGraph, iterations: usize, damping: f64) -> CentralityScores {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for file in deps.files() {
        graph.add_node(file);
    }
    for (from, targets) in &deps.imports {
        for to in targets {
            graph.add_edge(from.as_str(), to.as_str(), ());
        }
    }

    let node_count = graph.node_count();
    if node_count == 0 {
        return CentralityScores::default();
    }

    let initial_score = 1.0 / node_count as f64;
    let mut scores: HashMap<&str, f64> = graph.nodes().map(|n| (n, initial_score)).collect();

    let out_degree: HashMap<&str, f64> = graph
        .nodes()
        .map(|n| {
            let degree = graph.neighbors_directed(n, Direction::Outgoing).count();
            (n, degree.max(1) as f64)
        })
        .collect();

    for _ in 0..iterations {
        let base = (1.0 - damping) / node_count as f64;
        let next: HashMap<&str, f64> = graph
            .nodes()
            .map(|n| {
                let incoming: f64 = graph
                    .neighbors_directed(n, Direction::Incoming)
                    .map(|importer| scores[importer] / out_degree[importer])
                    .sum();
                (n, base + damping * incoming)
            })
            .collect();
        scores = next;
    }

    // Normalize to [0, 1] range
    let max_score = scores.values().cloned().fold(0.0f64, f64::max);
    if max_score > 0.0 {
        for score in scores.values_mut() {
            *score /= max_score;
        }
    }

    CentralityScores {
        scores: scores
            .into_iter()
            .map(|(path, score)| (path.to_string(), score))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centrality_empty_graph() {
        let scores = compute_centrality(&DependencyGraph::new(), 10, 0.85);
        assert!(scores.is_empty());
        assert_eq!(scores.get("anything.ts"), 0.0);
    }

    #[test]
    fn test_centrality_popular_file_ranks_higher() {
        let mut deps = DependencyGraph::new();
        for i in 0..5 {
            deps.add_edge(&format!("src/page{}.ts", i), "src/db.ts");
        }
        deps.add_edge("src/page0.ts", "src/format.ts");

        let scores = compute_centrality(&deps, 20, 0.85);

        assert_eq!(scores.len(), 7);
        assert!((scores.get("src/db.ts") - 1.0).abs() < f64::EPSILON);
        assert!(scores.get("src/db.ts") > scores.get("src/format.ts"));
        assert!(scores.get("src/format.ts") > scores.get("src/page1.ts"));
    }
}
