//! Identifier graph
//!
//! Lineage and catalog relationships are both stored as flat edge lists keyed
//! by string ids. [`IdGraph`] loads them into a petgraph `DiGraph` and walks
//! them breadth-first with an explicit visited set, so cycles terminate and
//! depth is bounded by the worklist rather than the call stack.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// A node reached by a walk
#[derive(Debug)]
pub struct Hop<'a, E> {
    pub id: &'a str,
    /// Edge through which the node was first reached
    pub via: &'a E,
    pub depth: usize,
}

/// Directed graph over string identifiers with edge payloads
#[derive(Debug)]
pub struct IdGraph<E> {
    graph: DiGraph<String, E>,
    indices: HashMap<String, NodeIndex>,
}

impl<E> Default for IdGraph<E> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            indices: HashMap::new(),
        }
    }
}

impl<E> IdGraph<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning the existing index for a known id
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge between known nodes; dangling edges are dropped
    pub fn add_edge(&mut self, source: &str, target: &str, weight: E) -> bool {
        match (self.indices.get(source), self.indices.get(target)) {
            (Some(&s), Some(&t)) => {
                self.graph.add_edge(s, t, weight);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indices.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Breadth-first walk from `start` along `directions`.
    ///
    /// Each node is reported once, at its shortest depth. The start node is
    /// never reported. `follow` filters which edges may be traversed.
    pub fn walk<F>(
        &self,
        start: &str,
        directions: &[Direction],
        max_depth: Option<usize>,
        follow: F,
    ) -> Vec<Hop<'_, E>>
    where
        F: Fn(&E) -> bool,
    {
        let Some(&start_idx) = self.indices.get(start) else {
            return Vec::new();
        };

        let mut hops = Vec::new();
        let mut visited = HashSet::from([start_idx]);
        let mut queue = VecDeque::from([(start_idx, 0usize)]);

        while let Some((idx, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for &direction in directions {
                for edge in self.graph.edges_directed(idx, direction) {
                    if !follow(edge.weight()) {
                        continue;
                    }
                    let next = match direction {
                        Direction::Outgoing => edge.target(),
                        Direction::Incoming => edge.source(),
                    };
                    if !visited.insert(next) {
                        continue;
                    }
                    hops.push(Hop {
                        id: self.graph[next].as_str(),
                        via: edge.weight(),
                        depth: depth + 1,
                    });
                    queue.push_back((next, depth + 1));
                }
            }
        }

        hops
    }
}
