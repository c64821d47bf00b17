//! Flow builder: turns per-task resource claims into a dependency DAG.
//!
//! The builder records a sequence of [`bind`](FlowBuilder::bind) calls
//! interleaved with [`ro`](FlowBuilder::ro)/[`rw`](FlowBuilder::rw)
//! claims, then materializes an adjacency-matrix graph over the bound
//! tasks. Edges always point from an earlier bind to a later one, so the
//! graph is acyclic by construction.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;

use crate::access::AccessMode;
use crate::task::TaskId;

/// Records claims per bound task and builds the dependency graph.
pub struct FlowBuilder {
    /// Bound ids, in first-bind order. Positions are the graph vertices.
    order: Vec<TaskId>,
    index_of: HashMap<TaskId, usize>,
    /// Per-vertex claims, duplicates merged with write winning.
    claims: Vec<Vec<(u64, AccessMode)>>,
    current: Option<usize>,
}

impl FlowBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            index_of: HashMap::new(),
            claims: Vec::new(),
            current: None,
        }
    }

    /// Sets the task context for subsequent claims.
    ///
    /// Binding a new id appends a vertex; re-binding a known id switches
    /// back to its existing vertex.
    pub fn bind(&mut self, id: TaskId) -> &mut Self {
        let vertex = *self.index_of.entry(id).or_insert_with(|| {
            self.order.push(id);
            self.claims.push(Vec::new());
            self.order.len() - 1
        });
        self.current = Some(vertex);
        self
    }

    /// Claims read access to `key` for the bound task.
    ///
    /// # Panics
    ///
    /// Panics if no task is bound.
    pub fn ro(&mut self, key: u64) -> &mut Self {
        self.claim(key, AccessMode::Read)
    }

    /// Claims write access to `key` for the bound task.
    ///
    /// # Panics
    ///
    /// Panics if no task is bound.
    pub fn rw(&mut self, key: u64) -> &mut Self {
        self.claim(key, AccessMode::Write)
    }

    fn claim(&mut self, key: u64, mode: AccessMode) -> &mut Self {
        let vertex = self
            .current
            .expect("FlowBuilder: claim issued before any bind()");
        let claims = &mut self.claims[vertex];
        match claims.iter_mut().find(|(k, _)| *k == key) {
            Some((_, recorded)) => {
                if mode == AccessMode::Write {
                    *recorded = AccessMode::Write;
                }
            }
            None => claims.push((key, mode)),
        }
        self
    }

    /// Number of bound tasks (graph vertices).
    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// The id bound at `vertex`.
    pub fn task_at(&self, vertex: usize) -> TaskId {
        self.order[vertex]
    }

    /// Number of distinct resources claimed by `vertex`.
    pub fn claim_count(&self, vertex: usize) -> usize {
        self.claims[vertex].len()
    }

    /// Builds the dependency graph from the recorded claims.
    ///
    /// For any two vertices `a` (bound earlier) and `b` (bound later)
    /// claiming the same resource with at least one write, the graph gets
    /// the edge `a → b`. Two reads never produce an edge.
    pub fn graph(&self) -> AdjacencyMatrix {
        let mut matrix = AdjacencyMatrix::new(self.order.len());

        // Claim sites per resource, in bind order.
        let mut sites: HashMap<u64, Vec<(usize, AccessMode)>> = HashMap::new();
        for (vertex, claims) in self.claims.iter().enumerate() {
            for &(key, mode) in claims {
                sites.entry(key).or_default().push((vertex, mode));
            }
        }

        for accesses in sites.values() {
            for (i, &(earlier, earlier_mode)) in accesses.iter().enumerate() {
                for &(later, later_mode) in &accesses[i + 1..] {
                    if earlier_mode == AccessMode::Write || later_mode == AccessMode::Write {
                        matrix.add_edge(earlier, later);
                    }
                }
            }
        }

        matrix
    }
}

impl Default for FlowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed acyclic graph over task vertices, stored as one bitset row
/// per vertex.
pub struct AdjacencyMatrix {
    /// `rows[a]` holds bit `b` iff the edge `a → b` exists.
    rows: Vec<FixedBitSet>,
    in_degrees: Vec<usize>,
}

impl AdjacencyMatrix {
    fn new(vertex_count: usize) -> Self {
        Self {
            rows: (0..vertex_count)
                .map(|_| FixedBitSet::with_capacity(vertex_count))
                .collect(),
            in_degrees: vec![0; vertex_count],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        debug_assert!(from < to, "edges must point from earlier to later binds");
        if !self.rows[from].contains(to) {
            self.rows[from].insert(to);
            self.in_degrees[to] += 1;
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the edge `from → to` exists.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.rows[from].contains(to)
    }

    /// Number of incoming edges of `vertex`.
    pub fn in_degree(&self, vertex: usize) -> usize {
        self.in_degrees[vertex]
    }

    /// Parents of `vertex`, in vertex order.
    pub fn in_edges(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, row)| row.contains(vertex))
            .map(|(parent, _)| parent)
    }

    /// Children of `vertex`, in vertex order.
    pub fn out_edges(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows[vertex].ones()
    }

    /// Vertices with no incoming edges.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_degrees
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(vertex, _)| vertex)
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones(..)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> TaskId {
        TaskId::new(raw)
    }

    #[test]
    fn read_then_write_produces_edge() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).ro(10);
        builder.bind(id(2)).rw(10);
        let graph = builder.graph();
        assert!(graph.has_edge(0, 1));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn two_reads_produce_no_edge() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).ro(10);
        builder.bind(id(2)).ro(10);
        let graph = builder.graph();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.roots().count(), 2);
    }

    #[test]
    fn write_write_produces_edge() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).rw(10);
        builder.bind(id(2)).rw(10);
        assert!(builder.graph().has_edge(0, 1));
    }

    #[test]
    fn disjoint_resources_stay_independent() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).rw(10);
        builder.bind(id(2)).rw(20);
        let graph = builder.graph();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn every_conflicting_pair_gets_an_edge() {
        // Three writers of one resource: all three pairs are ordered.
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).rw(10);
        builder.bind(id(2)).rw(10);
        builder.bind(id(3)).rw(10);
        let graph = builder.graph();
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(1, 2));
        assert!(graph.has_edge(0, 2));
    }

    #[test]
    fn duplicate_claims_merge_with_write_winning() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).ro(10).rw(10).ro(10);
        assert_eq!(builder.claim_count(0), 1);
        builder.bind(id(2)).ro(10);
        // The merged claim is a write, so the reader is ordered after it.
        assert!(builder.graph().has_edge(0, 1));
    }

    #[test]
    fn rebinding_returns_to_existing_vertex() {
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).ro(10);
        builder.bind(id(2)).rw(20);
        builder.bind(id(1)).ro(30);
        assert_eq!(builder.vertex_count(), 2);
        assert_eq!(builder.claim_count(0), 2);
        assert_eq!(builder.task_at(0), id(1));
    }

    #[test]
    #[should_panic(expected = "before any bind")]
    fn claim_without_bind_panics() {
        let mut builder = FlowBuilder::new();
        builder.ro(10);
    }

    #[test]
    fn roots_and_degrees() {
        // 0 → 2 ← 1, vertex 3 isolated.
        let mut builder = FlowBuilder::new();
        builder.bind(id(1)).rw(10);
        builder.bind(id(2)).rw(20);
        builder.bind(id(3)).ro(10).ro(20);
        builder.bind(id(4));
        let graph = builder.graph();
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.in_degree(2), 2);
        assert_eq!(graph.roots().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(graph.in_edges(2).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(graph.out_edges(0).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn empty_builder_builds_empty_graph() {
        let graph = FlowBuilder::new().graph();
        assert!(graph.is_empty());
        assert_eq!(graph.roots().count(), 0);
    }
}
