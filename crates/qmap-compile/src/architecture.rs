//! Device coupling graph.
//!
//! An [`Architecture`] lists which physical nodes can take part in a
//! two-qubit gate together. On construction it precomputes sorted adjacency
//! lists, all-pairs BFS distances with a predecessor matrix for path
//! reconstruction, and connected-component labels, so routing never runs a
//! per-gate search.
//!
//! # Deserialization
//!
//! The serde form is [`ArchitectureSpec`]. Deserializing an `Architecture`
//! validates the edges and rebuilds every cache.
//!
//! ```
//! use qmap_compile::Architecture;
//!
//! let arch = Architecture::new([(0, 1), (1, 2), (2, 3)], 4).unwrap();
//! assert_eq!(arch.distance(0, 3), Some(3));
//! assert_eq!(arch.shortest_path(0, 2), Some(vec![0, 1, 2]));
//! assert!(Architecture::new([(0, 4)], 4).is_err());
//! ```

use std::collections::VecDeque;

use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

const UNREACHABLE: u32 = u32::MAX;

/// Largest node count accepted from edge lists and documents. The distance
/// and predecessor caches take `2 * 4 * nodes^2` bytes.
pub const MAX_NODES: usize = 4096;

/// Serializable description of an [`Architecture`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    /// Number of physical nodes.
    pub nodes: usize,
    /// Coupled node pairs. For directed devices `(control, target)`.
    #[serde(default)]
    pub edges: Vec<(i64, i64)>,
    /// Whether `CX` is only native in the listed direction.
    #[serde(default)]
    pub directed: bool,
}

/// Target device coupling graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ArchitectureSpec", into = "ArchitectureSpec")]
pub struct Architecture {
    node_count: usize,
    /// Deduplicated edges in input order.
    edges: Vec<(u32, u32)>,
    directed: bool,
    /// Undirected neighbours, sorted ascending.
    adjacency: Vec<Vec<u32>>,
    /// Native `(control, target)` pairs on directed devices.
    allowed: FxHashSet<(u32, u32)>,
    /// `distance[from][to]`, `UNREACHABLE` across components.
    distance: Vec<Vec<u32>>,
    /// `predecessor[from][to]` is the node before `to` on the shortest
    /// path from `from`.
    predecessor: Vec<Vec<u32>>,
    /// Component label per node, numbered in order of lowest member.
    component: Vec<usize>,
    num_components: usize,
}

impl Architecture {
    /// Build an undirected architecture.
    ///
    /// Fails with [`CompileError::TooManyNodes`] above [`MAX_NODES`], with
    /// [`CompileError::EdgeOutOfRange`] if an edge references a node outside
    /// `0..node_count` and with [`CompileError::SelfLoop`] for an edge from
    /// a node to itself. Duplicate edges, in either
    /// orientation, are ignored.
    pub fn new(
        edges: impl IntoIterator<Item = (i64, i64)>,
        node_count: usize,
    ) -> CompileResult<Self> {
        let edges = validate_edges(edges, node_count)?;
        Ok(Self::from_edges(edges, node_count, false))
    }

    /// Build a directed architecture where each edge `(c, t)` means `CX(c, t)`
    /// is native. Listing both orientations makes a pair symmetric.
    pub fn new_directed(
        edges: impl IntoIterator<Item = (i64, i64)>,
        node_count: usize,
    ) -> CompileResult<Self> {
        let edges = validate_edges(edges, node_count)?;
        Ok(Self::from_edges(edges, node_count, true))
    }

    /// Build from a serializable description.
    pub fn from_spec(spec: ArchitectureSpec) -> CompileResult<Self> {
        if spec.directed {
            Self::new_directed(spec.edges, spec.nodes)
        } else {
            Self::new(spec.edges, spec.nodes)
        }
    }

    /// The serializable description of this architecture.
    pub fn to_spec(&self) -> ArchitectureSpec {
        ArchitectureSpec {
            nodes: self.node_count,
            edges: self
                .edges
                .iter()
                .map(|&(a, b)| (i64::from(a), i64::from(b)))
                .collect(),
            directed: self.directed,
        }
    }

    /// Edges must already be in range and free of self-loops.
    fn from_edges(raw: Vec<(u32, u32)>, node_count: usize, directed: bool) -> Self {
        let mut edges = Vec::with_capacity(raw.len());
        let mut allowed = FxHashSet::default();
        let mut adjacency = vec![Vec::new(); node_count];

        for (a, b) in raw {
            let key = if directed { (a, b) } else { (a.min(b), a.max(b)) };
            if !allowed.insert(key) {
                continue;
            }
            edges.push((a, b));
            if !adjacency[a as usize].contains(&b) {
                adjacency[a as usize].push(b);
                adjacency[b as usize].push(a);
            }
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        let mut arch = Self {
            node_count,
            edges,
            directed,
            adjacency,
            allowed,
            distance: Vec::new(),
            predecessor: Vec::new(),
            component: Vec::new(),
            num_components: 0,
        };
        arch.precompute_distances();
        arch.label_components();
        arch
    }

    #[allow(clippy::cast_possible_truncation)]
    fn precompute_distances(&mut self) {
        let n = self.node_count;
        self.distance = vec![vec![UNREACHABLE; n]; n];
        self.predecessor = vec![vec![UNREACHABLE; n]; n];

        for src in 0..n {
            let dist = &mut self.distance[src];
            let pred = &mut self.predecessor[src];
            dist[src] = 0;
            let mut queue = VecDeque::from([src as u32]);
            while let Some(current) = queue.pop_front() {
                let cur = current as usize;
                for &neighbor in &self.adjacency[cur] {
                    let nb = neighbor as usize;
                    if dist[nb] == UNREACHABLE {
                        dist[nb] = dist[cur] + 1;
                        pred[nb] = current;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    fn label_components(&mut self) {
        let mut sets = UnionFind::<usize>::new(self.node_count);
        for &(a, b) in &self.edges {
            sets.union(a as usize, b as usize);
        }
        let labeling = sets.into_labeling();

        let mut labels: Vec<Option<usize>> = vec![None; self.node_count];
        self.component = Vec::with_capacity(self.node_count);
        let mut next = 0;
        for root in labeling {
            let label = *labels[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            self.component.push(label);
        }
        self.num_components = next;
    }

    // =========================================================================
    // Standard topologies
    // =========================================================================

    /// Line `0 - 1 - ... - (n-1)`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn linear(n: usize) -> Self {
        let edges = (1..n as u32).map(|i| (i - 1, i)).collect();
        Self::from_edges(edges, n, false)
    }

    /// Line closed into a cycle. Fewer than three nodes give a line.
    #[allow(clippy::cast_possible_truncation)]
    pub fn ring(n: usize) -> Self {
        let mut edges: Vec<_> = (1..n as u32).map(|i| (i - 1, i)).collect();
        if n > 2 {
            edges.push((n as u32 - 1, 0));
        }
        Self::from_edges(edges, n, false)
    }

    /// `rows x cols` grid, node `r * cols + c`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn grid(rows: usize, cols: usize) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let node = (r * cols + c) as u32;
                if c + 1 < cols {
                    edges.push((node, node + 1));
                }
                if r + 1 < rows {
                    edges.push((node, node + cols as u32));
                }
            }
        }
        Self::from_edges(edges, rows * cols, false)
    }

    /// Node 0 coupled to every other node.
    #[allow(clippy::cast_possible_truncation)]
    pub fn star(n: usize) -> Self {
        let edges = (1..n as u32).map(|i| (0, i)).collect();
        Self::from_edges(edges, n, false)
    }

    /// Every pair of nodes coupled.
    #[allow(clippy::cast_possible_truncation)]
    pub fn full(n: usize) -> Self {
        let n32 = n as u32;
        let edges = (0..n32)
            .flat_map(|i| ((i + 1)..n32).map(move |j| (i, j)))
            .collect();
        Self::from_edges(edges, n, false)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of physical nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Deduplicated edges in input order.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Whether `CX` direction is restricted.
    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Whether two nodes are coupled, in either direction.
    #[inline]
    pub fn is_adjacent(&self, a: u32, b: u32) -> bool {
        self.adjacency
            .get(a as usize)
            .is_some_and(|n| n.binary_search(&b).is_ok())
    }

    /// Whether `CX(control, target)` is native.
    pub fn allows(&self, control: u32, target: u32) -> bool {
        if self.directed {
            self.allowed.contains(&(control, target))
        } else {
            self.is_adjacent(control, target)
        }
    }

    /// Neighbours of a node, sorted ascending.
    pub fn neighbors(&self, node: u32) -> &[u32] {
        self.adjacency
            .get(node as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Shortest-path hop count, `None` across components or out of range.
    #[inline]
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        self.distance
            .get(from as usize)
            .and_then(|row| row.get(to as usize))
            .copied()
            .filter(|&d| d != UNREACHABLE)
    }

    /// Nodes on a shortest path from `from` to `to`, both included.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        let hops = self.distance(from, to)?;
        let pred = &self.predecessor[from as usize];
        let mut path = Vec::with_capacity(hops as usize + 1);
        let mut node = to;
        path.push(node);
        while node != from {
            node = pred[node as usize];
            path.push(node);
        }
        path.reverse();
        Some(path)
    }

    /// Neighbours of `from` that lie on some shortest path to `to`.
    pub fn next_hops(&self, from: u32, to: u32) -> impl Iterator<Item = u32> + '_ {
        let target = self.distance(from, to).filter(|&d| d > 0).map(|d| d - 1);
        self.neighbors(from)
            .iter()
            .copied()
            .filter(move |&n| target.is_some() && self.distance(n, to) == target)
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        self.num_components <= 1
    }

    /// Number of connected components.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Component label of a node.
    pub fn component_of(&self, node: u32) -> Option<usize> {
        self.component.get(node as usize).copied()
    }

    /// Largest finite distance between two nodes.
    pub fn diameter(&self) -> u32 {
        self.distance
            .iter()
            .flatten()
            .copied()
            .filter(|&d| d != UNREACHABLE)
            .max()
            .unwrap_or(0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn validate_edges(
    edges: impl IntoIterator<Item = (i64, i64)>,
    node_count: usize,
) -> CompileResult<Vec<(u32, u32)>> {
    if node_count > MAX_NODES {
        return Err(CompileError::TooManyNodes {
            nodes: node_count,
            max: MAX_NODES,
        });
    }
    let in_range = |n: i64| n >= 0 && (n as u64) < node_count as u64;
    edges
        .into_iter()
        .map(|(a, b)| {
            if !in_range(a) || !in_range(b) {
                return Err(CompileError::EdgeOutOfRange {
                    edge: (a, b),
                    node_count,
                });
            }
            if a == b {
                return Err(CompileError::SelfLoop { node: a as u32 });
            }
            Ok((a as u32, b as u32))
        })
        .collect()
}

impl TryFrom<ArchitectureSpec> for Architecture {
    type Error = CompileError;

    fn try_from(spec: ArchitectureSpec) -> CompileResult<Self> {
        Self::from_spec(spec)
    }
}

impl From<Architecture> for ArchitectureSpec {
    fn from(arch: Architecture) -> Self {
        arch.to_spec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let arch = Architecture::linear(5);
        assert_eq!(arch.node_count(), 5);
        assert!(arch.is_adjacent(0, 1));
        assert!(arch.is_adjacent(1, 0));
        assert!(!arch.is_adjacent(0, 2));
        assert_eq!(arch.distance(0, 4), Some(4));
        assert_eq!(arch.diameter(), 4);
        assert!(arch.is_connected());
    }

    #[test]
    fn test_ring_and_grid() {
        let ring = Architecture::ring(6);
        assert_eq!(ring.distance(0, 5), Some(1));
        assert_eq!(ring.distance(0, 3), Some(3));

        let grid = Architecture::grid(3, 3);
        assert_eq!(grid.neighbors(4), &[1, 3, 5, 7]);
        assert_eq!(grid.distance(0, 8), Some(4));
    }

    #[test]
    fn test_star_and_full() {
        let star = Architecture::star(5);
        assert_eq!(star.neighbors(0), &[1, 2, 3, 4]);
        assert_eq!(star.distance(1, 2), Some(2));

        let full = Architecture::full(4);
        assert_eq!(full.edges().len(), 6);
        assert_eq!(full.diameter(), 1);
    }

    #[test]
    fn test_rejects_out_of_range_edge() {
        let err = Architecture::new([(0, 1), (1, 7)], 4).unwrap_err();
        assert!(matches!(
            err,
            CompileError::EdgeOutOfRange {
                edge: (1, 7),
                node_count: 4
            }
        ));
        assert!(Architecture::new([(-1, 0)], 4).is_err());
    }

    #[test]
    fn test_rejects_oversized_document() {
        let json = r#"{"nodes": 4000000000, "edges": []}"#;
        let err = serde_json::from_str::<Architecture>(json).unwrap_err();
        assert!(err.to_string().contains("4000000000"));
        assert!(matches!(
            Architecture::new(Vec::<(i64, i64)>::new(), MAX_NODES + 1),
            Err(CompileError::TooManyNodes { max: MAX_NODES, .. })
        ));
        assert_eq!(Architecture::new(Vec::<(i64, i64)>::new(), 3).unwrap().node_count(), 3);
    }

    #[test]
    fn test_rejects_self_loop() {
        let err = Architecture::new([(2, 2)], 4).unwrap_err();
        assert!(matches!(err, CompileError::SelfLoop { node: 2 }));
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let arch = Architecture::new([(0, 1), (1, 0), (0, 1)], 2).unwrap();
        assert_eq!(arch.edges(), &[(0, 1)]);
        assert_eq!(arch.neighbors(0), &[1]);
    }

    #[test]
    fn test_components() {
        let arch = Architecture::new([(0, 1), (2, 3)], 5).unwrap();
        assert!(!arch.is_connected());
        assert_eq!(arch.num_components(), 3);
        assert_eq!(arch.component_of(0), arch.component_of(1));
        assert_ne!(arch.component_of(1), arch.component_of(2));
        assert_eq!(arch.distance(0, 2), None);
        assert_eq!(arch.shortest_path(0, 3), None);
    }

    #[test]
    fn test_shortest_path_and_next_hops() {
        let grid = Architecture::grid(2, 2);
        assert_eq!(grid.shortest_path(0, 3).map(|p| p.len()), Some(3));
        let hops: Vec<_> = grid.next_hops(0, 3).collect();
        assert_eq!(hops, vec![1, 2]);
        assert_eq!(grid.next_hops(0, 0).count(), 0);
    }

    #[test]
    fn test_directed_allows() {
        let arch = Architecture::new_directed([(0, 1), (2, 1), (1, 2)], 3).unwrap();
        assert!(arch.is_directed());
        assert!(arch.allows(0, 1));
        assert!(!arch.allows(1, 0));
        assert!(arch.allows(1, 2) && arch.allows(2, 1));
        assert!(arch.is_adjacent(1, 0));
        assert_eq!(arch.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_serde_round_trip() {
        let arch = Architecture::new_directed([(0, 1), (1, 2)], 3).unwrap();
        let json = serde_json::to_string(&arch).unwrap();
        let parsed: Architecture = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.to_spec(), arch.to_spec());
        assert_eq!(parsed.distance(0, 2), Some(2));

        let bad = r#"{"nodes": 2, "edges": [[0, 5]]}"#;
        assert!(serde_json::from_str::<Architecture>(bad).is_err());
    }
}
