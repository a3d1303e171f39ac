//! Data lineage nodes, edges and traversal

use std::collections::{BTreeMap, HashSet};

use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::graph::IdGraph;

/// A dataset, table, file or API in the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    pub node_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub system: String,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl LineageNode {
    pub fn new(
        node_id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
            node_type: node_type.into(),
            system: system.into(),
            schema_name: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Data flow from `source_node_id` to `target_node_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub edge_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    #[serde(default)]
    pub transformation: Option<String>,
    #[serde(default = "default_transformation_type")]
    pub transformation_type: String,
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_transformation_type() -> String {
    "unknown".to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl LineageEdge {
    pub fn new(
        edge_id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            edge_id: edge_id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            transformation: None,
            transformation_type: default_transformation_type(),
            confidence_score: default_confidence(),
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageDirection {
    Upstream,
    Downstream,
    #[default]
    Both,
}

impl LineageDirection {
    fn includes_upstream(&self) -> bool {
        matches!(self, LineageDirection::Upstream | LineageDirection::Both)
    }

    fn includes_downstream(&self) -> bool {
        matches!(self, LineageDirection::Downstream | LineageDirection::Both)
    }
}

/// A node reached from the target, with the edge it was reached through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageHop {
    pub node: LineageNode,
    pub relationship: LineageEdge,
    pub depth: usize,
}

/// Lineage around one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLineage {
    pub target_node: LineageNode,
    pub upstream: Vec<LineageHop>,
    pub downstream: Vec<LineageHop>,
    /// Every node touched, target included
    pub nodes: Vec<LineageNode>,
    /// Edges whose endpoints were both touched
    pub edges: Vec<LineageEdge>,
}

/// Compute lineage for `node_id`; `None` when the node is unknown.
///
/// Upstream and downstream walks keep separate visited sets so a node that is
/// both an ancestor and a descendant appears on both sides.
pub fn trace(
    nodes: &[LineageNode],
    edges: &[LineageEdge],
    node_id: &str,
    direction: LineageDirection,
) -> Option<DataLineage> {
    let target_node = nodes.iter().find(|n| n.node_id == node_id)?.clone();

    let mut graph: IdGraph<usize> = IdGraph::new();
    for node in nodes {
        graph.add_node(&node.node_id);
    }
    for (i, edge) in edges.iter().enumerate() {
        graph.add_edge(&edge.source_node_id, &edge.target_node_id, i);
    }

    let hops = |dir: Direction| -> Vec<LineageHop> {
        graph
            .walk(node_id, &[dir], None, |_| true)
            .into_iter()
            .filter_map(|hop| {
                let node = nodes.iter().find(|n| n.node_id == hop.id)?;
                Some(LineageHop {
                    node: node.clone(),
                    relationship: edges[*hop.via].clone(),
                    depth: hop.depth,
                })
            })
            .collect()
    };

    let upstream = if direction.includes_upstream() { hops(Direction::Incoming) } else { Vec::new() };
    let downstream = if direction.includes_downstream() { hops(Direction::Outgoing) } else { Vec::new() };

    let mut touched: HashSet<&str> = HashSet::from([node_id]);
    touched.extend(upstream.iter().map(|h| h.node.node_id.as_str()));
    touched.extend(downstream.iter().map(|h| h.node.node_id.as_str()));

    let graph_nodes = nodes
        .iter()
        .filter(|n| touched.contains(n.node_id.as_str()))
        .cloned()
        .collect();
    let graph_edges = edges
        .iter()
        .filter(|e| {
            touched.contains(e.source_node_id.as_str()) && touched.contains(e.target_node_id.as_str())
        })
        .cloned()
        .collect();

    Some(DataLineage {
        target_node,
        upstream,
        downstream,
        nodes: graph_nodes,
        edges: graph_edges,
    })
}
