//! BPMN diagram model
//!
//! Stores the lanes, flow nodes and sequence flows of a single process in
//! insertion order. Insertion order is the pipeline order the layout engine
//! places nodes in.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

use crate::core::{Database, DiagramError, DiagramWarning, Edge, Lane, Node, NodeKind};

use super::layout::DiagramLayout;

/// Canonical in-memory process diagram
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramModel {
    process_id: String,
    process_name: String,
    documentation: Option<String>,
    lanes: Vec<Lane>,
    nodes: Vec<Node>,
    /// Node id -> position in `nodes`
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// Every id in use by a lane, node or edge
    ids: HashSet<String>,
}

impl DiagramModel {
    /// Create an empty model for the given process
    pub fn new(process_id: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            process_name: process_name.into(),
            ..Default::default()
        }
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    pub fn set_documentation(&mut self, documentation: impl Into<String>) {
        let documentation = documentation.into();
        self.documentation = if documentation.trim().is_empty() {
            None
        } else {
            Some(documentation)
        };
    }

    /// Add a lane; duplicate ids are rejected
    pub fn add_lane(&mut self, lane: Lane) -> Result<()> {
        self.claim_id(&lane.id)?;
        trace!(lane_id = %lane.id, "Added lane");
        self.lanes.push(lane);
        Ok(())
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    /// Position of a lane in insertion order
    pub fn lane_index(&self, id: &str) -> Option<usize> {
        self.lanes.iter().position(|lane| lane.id == id)
    }

    /// True if any lane, node or edge uses `id`
    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Check if a node exists
    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Nodes that belong to the given lane, in insertion order
    pub fn nodes_in_lane<'a>(&'a self, lane_id: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |node| node.lane == lane_id)
    }

    /// Number of nodes of the given kind
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind == kind).count()
    }

    /// Get in-degree (number of incoming edges) for a node
    pub fn in_degree(&self, node_id: &str) -> usize {
        self.incoming(node_id).count()
    }

    /// Get out-degree (number of outgoing edges) for a node
    pub fn out_degree(&self, node_id: &str) -> usize {
        self.outgoing(node_id).count()
    }

    /// Edges leaving a node, in insertion order
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |edge| edge.source_ref == node_id)
    }

    /// Edges arriving at a node, in insertion order
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |edge| edge.target_ref == node_id)
    }

    /// Drop every edge whose source or target does not resolve
    ///
    /// Returns one `UnresolvedEdge` warning per dropped edge.
    pub fn prune_unresolved_edges(&mut self) -> Vec<DiagramWarning> {
        let mut warnings = Vec::new();
        let node_index = &self.node_index;
        let ids = &mut self.ids;
        self.edges.retain(|edge| {
            let missing = [&edge.source_ref, &edge.target_ref]
                .into_iter()
                .find(|r| !node_index.contains_key(r.as_str()));
            match missing {
                Some(missing_ref) => {
                    warn!(edge_id = %edge.id, missing_ref = %missing_ref, "Dropping unresolved flow");
                    warnings.push(DiagramWarning::UnresolvedEdge {
                        edge_id: edge.id.clone(),
                        missing_ref: missing_ref.clone(),
                    });
                    ids.remove(&edge.id);
                    false
                }
                None => true,
            }
        });
        warnings
    }

    /// Structural problems that do not prevent layout or encoding
    pub fn integrity_warnings(&self) -> Vec<DiagramWarning> {
        let mut warnings = Vec::new();
        for node in &self.nodes {
            if node.kind.is_gateway() && self.out_degree(&node.id) == 0 {
                warnings.push(DiagramWarning::DanglingGateway {
                    node_id: node.id.clone(),
                });
            }
            if self.lane(&node.lane).is_none() {
                warnings.push(DiagramWarning::UnknownLane {
                    node_id: node.id.clone(),
                    lane_id: node.lane.clone(),
                });
            }
        }
        debug!(warning_count = warnings.len(), "Integrity check completed");
        warnings
    }

    /// Copy of this model carrying the coordinates computed by a layout
    ///
    /// Nodes the layout did not position keep their current bounds.
    pub fn with_layout(&self, layout: &DiagramLayout) -> DiagramModel {
        let mut model = self.clone();
        for node in &mut model.nodes {
            if let Some(bounds) = layout.node_bounds(&node.id) {
                node.bounds = bounds;
            }
        }
        model
    }

    fn claim_id(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(DiagramError::database_error("empty id".to_string()).into());
        }
        if !self.ids.insert(id.to_string()) {
            return Err(DiagramError::duplicate_id(id).into());
        }
        Ok(())
    }
}

impl Database for DiagramModel {
    type Node = Node;
    type Edge = Edge;

    fn add_node(&mut self, node: Node) -> Result<()> {
        self.claim_id(&node.id)?;
        trace!(node_id = %node.id, kind = %node.kind, "Added node");
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    fn add_edge(&mut self, edge: Edge) -> Result<()> {
        self.claim_id(&edge.id)?;
        trace!(edge_id = %edge.id, from = %edge.source_ref, to = %edge.target_ref, "Added edge");
        self.edges.push(edge);
        Ok(())
    }

    fn get_node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    fn clear(&mut self) {
        self.documentation = None;
        self.lanes.clear();
        self.nodes.clear();
        self.node_index.clear();
        self.edges.clear();
        self.ids.clear();
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiagramModel {
        let mut model = DiagramModel::new("Process_1", "Sample");
        model.add_lane(Lane::new("L1", "Clerk", "Process_1")).unwrap();
        model
            .add_node(Node::new("S", "Start", NodeKind::StartEvent, "L1"))
            .unwrap();
        model
            .add_node(Node::new("T", "Work", NodeKind::UserTask, "L1"))
            .unwrap();
        model
            .add_node(Node::new("E", "End", NodeKind::EndEvent, "L1"))
            .unwrap();
        model.add_edge(Edge::new("F1", "S", "T")).unwrap();
        model.add_edge(Edge::new("F2", "T", "E")).unwrap();
        model
    }

    #[test]
    fn test_counts_and_lookup() {
        let model = sample();
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 2);
        assert_eq!(model.get_node("T").unwrap().name, "Work");
        assert!(model.get_node("missing").is_none());
        assert_eq!(model.count_kind(NodeKind::UserTask), 1);
    }

    #[test]
    fn test_degrees() {
        let model = sample();
        assert_eq!(model.in_degree("S"), 0);
        assert_eq!(model.out_degree("S"), 1);
        assert_eq!(model.in_degree("T"), 1);
        assert_eq!(model.out_degree("T"), 1);
        assert_eq!(model.in_degree("E"), 1);
        assert_eq!(model.out_degree("E"), 0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut model = sample();
        assert!(model
            .add_node(Node::new("T", "Again", NodeKind::UserTask, "L1"))
            .is_err());
        assert!(model.add_edge(Edge::new("F1", "S", "E")).is_err());
        // Ids are unique across element categories
        assert!(model.add_edge(Edge::new("S", "S", "E")).is_err());
        assert!(model.add_lane(Lane::new("L1", "Other", "Process_1")).is_err());
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 2);
    }

    #[test]
    fn test_prune_unresolved_edges() {
        let mut model = sample();
        model.add_edge(Edge::new("F3", "T", "Ghost")).unwrap();
        model.add_edge(Edge::new("F4", "Nobody", "E")).unwrap();
        let warnings = model.prune_unresolved_edges();
        assert_eq!(model.edge_count(), 2);
        assert_eq!(
            warnings,
            vec![
                DiagramWarning::UnresolvedEdge {
                    edge_id: "F3".to_string(),
                    missing_ref: "Ghost".to_string()
                },
                DiagramWarning::UnresolvedEdge {
                    edge_id: "F4".to_string(),
                    missing_ref: "Nobody".to_string()
                },
            ]
        );
        // Pruned ids can be reused
        assert!(model.add_edge(Edge::new("F3", "S", "E")).is_ok());
    }

    #[test]
    fn test_integrity_warnings() {
        let mut model = sample();
        model
            .add_node(Node::new("G", "Ok?", NodeKind::ExclusiveGateway, "L1"))
            .unwrap();
        model
            .add_node(Node::new("X", "Lost", NodeKind::UserTask, "Nowhere"))
            .unwrap();
        let warnings = model.integrity_warnings();
        assert!(warnings.contains(&DiagramWarning::DanglingGateway {
            node_id: "G".to_string()
        }));
        assert!(warnings.contains(&DiagramWarning::UnknownLane {
            node_id: "X".to_string(),
            lane_id: "Nowhere".to_string()
        }));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut model = sample();
        model.clear();
        assert_eq!(model.node_count(), 0);
        assert_eq!(model.edge_count(), 0);
        assert!(model.lanes().is_empty());
        assert!(model.add_node(Node::new("S", "Start", NodeKind::StartEvent, "L1")).is_ok());
    }

    #[test]
    fn test_outgoing_order() {
        let mut model = sample();
        model.add_edge(Edge::new("F9", "T", "S")).unwrap();
        let targets: Vec<_> = model.outgoing("T").map(|e| e.target_ref.as_str()).collect();
        assert_eq!(targets, vec!["E", "S"]);
    }

    #[test]
    fn test_blank_documentation_is_none() {
        let mut model = sample();
        model.set_documentation("   ");
        assert!(model.documentation().is_none());
        model.set_documentation("Handles requests");
        assert_eq!(model.documentation(), Some("Handles requests"));
    }
}
