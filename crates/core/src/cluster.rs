//! Duplicate cluster selection over the verified similarity graph
//!
//! Every document is a node, including documents without edges. Two
//! selection policies are available:
//!
//! - [`ClusterPolicy::Transitive`]: connected components. If A~B and B~C,
//!   all three collapse to one survivor even when A and C are not similar.
//! - [`ClusterPolicy::Greedy`]: visit documents in index order; a document
//!   that has not been removed is kept and removes its direct neighbours
//!   with larger indices. Only direct similarity causes removal.
//!
//! Both policies keep the smallest index of each cluster.

use crate::similarity::VerifiedEdge;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How verified edges are turned into removals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClusterPolicy {
    #[default]
    Transitive,
    Greedy,
}

impl ClusterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterPolicy::Transitive => "transitive",
            ClusterPolicy::Greedy => "greedy",
        }
    }
}

impl fmt::Display for ClusterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transitive" => Ok(ClusterPolicy::Transitive),
            "greedy" => Ok(ClusterPolicy::Greedy),
            other => Err(format!(
                "unknown cluster policy '{}' (expected 'transitive' or 'greedy')",
                other
            )),
        }
    }
}

/// A group of near-duplicates with one survivor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub representative: usize,
    /// Sorted ascending; the representative comes first
    pub members: Vec<usize>,
}

impl Cluster {
    /// Members marked for removal
    pub fn removed(&self) -> &[usize] {
        &self.members[1..]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of cluster selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSelection {
    /// Clusters of two or more documents, ordered by representative
    pub clusters: Vec<Cluster>,
    pub removed: BTreeSet<usize>,
}

impl ClusterSelection {
    pub fn is_removed(&self, idx: usize) -> bool {
        self.removed.contains(&idx)
    }
}

/// Undirected graph of verified near-duplicate pairs
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    node_count: usize,
    edges: Vec<VerifiedEdge>,
}

impl SimilarityGraph {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
        }
    }

    pub fn from_edges(node_count: usize, edges: Vec<VerifiedEdge>) -> Self {
        let mut graph = Self::new(node_count);
        for edge in edges {
            graph.add_edge(edge);
        }
        graph
    }

    /// Add an edge; edges referencing unknown nodes or self-loops are ignored
    pub fn add_edge(&mut self, edge: VerifiedEdge) {
        if edge.a == edge.b || edge.a >= self.node_count || edge.b >= self.node_count {
            debug!("Ignoring edge ({}, {})", edge.a, edge.b);
            return;
        }
        self.edges.push(edge);
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edges(&self) -> &[VerifiedEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<VerifiedEdge> {
        self.edges
    }

    /// Connected components with two or more members, each sorted
    /// ascending, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut union_find = UnionFind::<usize>::new(self.node_count);
        for edge in &self.edges {
            union_find.union(edge.a, edge.b);
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, root) in union_find.into_labeling().into_iter().enumerate() {
            groups.entry(root).or_default().push(node);
        }

        let mut components: Vec<Vec<usize>> = groups
            .into_values()
            .filter(|members| members.len() > 1)
            .collect();
        components.sort_by_key(|members| members[0]);
        components
    }

    /// Pick survivors and removals under `policy`
    pub fn select(&self, policy: ClusterPolicy) -> ClusterSelection {
        let clusters: Vec<Cluster> = match policy {
            ClusterPolicy::Transitive => self
                .components()
                .into_iter()
                .map(|members| Cluster {
                    representative: members[0],
                    members,
                })
                .collect(),
            ClusterPolicy::Greedy => self.greedy_clusters(),
        };

        let removed: BTreeSet<usize> = clusters
            .iter()
            .flat_map(|cluster| cluster.removed().iter().copied())
            .collect();

        info!(
            "Selected {} clusters under {} policy, {} documents removed",
            clusters.len(),
            policy,
            removed.len()
        );

        ClusterSelection { clusters, removed }
    }

    fn greedy_clusters(&self) -> Vec<Cluster> {
        let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); self.node_count];
        for edge in &self.edges {
            neighbours[edge.a].push(edge.b);
            neighbours[edge.b].push(edge.a);
        }

        let mut removed = vec![false; self.node_count];
        let mut clusters = Vec::new();

        for node in 0..self.node_count {
            if removed[node] {
                continue;
            }

            let mut members = vec![node];
            for &other in &neighbours[node] {
                if other > node && !removed[other] {
                    removed[other] = true;
                    members.push(other);
                }
            }

            if members.len() > 1 {
                members[1..].sort_unstable();
                clusters.push(Cluster {
                    representative: node,
                    members,
                });
            }
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: usize, b: usize) -> VerifiedEdge {
        VerifiedEdge {
            a,
            b,
            similarity: 0.9,
        }
    }

    #[test]
    fn test_chain_collapses_transitively() {
        // A~B, B~C, A and C not directly similar
        let graph = SimilarityGraph::from_edges(3, vec![edge(0, 1), edge(1, 2)]);
        let selection = graph.select(ClusterPolicy::Transitive);

        assert_eq!(selection.clusters.len(), 1);
        assert_eq!(selection.clusters[0].representative, 0);
        assert_eq!(selection.clusters[0].members, vec![0, 1, 2]);
        assert_eq!(selection.removed, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_chain_greedy_keeps_indirect() {
        let graph = SimilarityGraph::from_edges(3, vec![edge(0, 1), edge(1, 2)]);
        let selection = graph.select(ClusterPolicy::Greedy);

        assert_eq!(selection.removed, BTreeSet::from([1]));
        assert_eq!(selection.clusters.len(), 1);
        assert_eq!(selection.clusters[0].members, vec![0, 1]);
        assert!(!selection.is_removed(2));
    }

    #[test]
    fn test_isolated_nodes_survive() {
        let graph = SimilarityGraph::new(4);
        let selection = graph.select(ClusterPolicy::Transitive);

        assert!(selection.clusters.is_empty());
        assert!(selection.removed.is_empty());
    }

    #[test]
    fn test_representative_is_smallest_index() {
        let graph = SimilarityGraph::from_edges(6, vec![edge(5, 3), edge(4, 5), edge(1, 2)]);
        let selection = graph.select(ClusterPolicy::Transitive);

        assert_eq!(selection.clusters.len(), 2);
        assert_eq!(selection.clusters[0].members, vec![1, 2]);
        assert_eq!(selection.clusters[1].representative, 3);
        assert_eq!(selection.clusters[1].removed(), &[4, 5]);
        assert_eq!(selection.removed, BTreeSet::from([2, 4, 5]));
    }

    #[test]
    fn test_greedy_star() {
        let graph = SimilarityGraph::from_edges(4, vec![edge(0, 3), edge(0, 1), edge(2, 3)]);
        let selection = graph.select(ClusterPolicy::Greedy);

        // 0 removes 1 and 3; 2 survives because 3 was already removed
        assert_eq!(selection.clusters.len(), 1);
        assert_eq!(selection.clusters[0].members, vec![0, 1, 3]);
        assert_eq!(selection.removed, BTreeSet::from([1, 3]));
    }

    #[test]
    fn test_invalid_edges_ignored() {
        let mut graph = SimilarityGraph::new(2);
        graph.add_edge(edge(0, 0));
        graph.add_edge(edge(0, 7));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("transitive".parse::<ClusterPolicy>(), Ok(ClusterPolicy::Transitive));
        assert_eq!("Greedy".parse::<ClusterPolicy>(), Ok(ClusterPolicy::Greedy));
        assert!("clique".parse::<ClusterPolicy>().is_err());
        assert_eq!(ClusterPolicy::default(), ClusterPolicy::Transitive);
    }
}
