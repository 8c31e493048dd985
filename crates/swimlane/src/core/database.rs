//! Storage trait for process diagrams
//!
//! Flow nodes and sequence flows share one id space, the way BPMN element
//! ids do, and keep the order they were added in.

use anyhow::Result;

/// Node and flow storage for a process diagram
///
/// Insertion order is meaningful: the layout engine reads node order as
/// pipeline order and fans gateway branches out in edge order. An id used
/// by a node cannot be reused by a flow and vice versa.
///
/// # Example
/// ```
/// use swimlane::core::{Database, Edge, Node, NodeKind};
/// use swimlane::DiagramModel;
///
/// let mut model = DiagramModel::new("P", "Orders");
/// model.add_node(Node::new("S", "Received", NodeKind::StartEvent, "L")).unwrap();
/// model.add_node(Node::new("E", "Shipped", NodeKind::EndEvent, "L")).unwrap();
/// model.add_edge(Edge::new("F", "S", "E")).unwrap();
///
/// // Flow and node ids collide
/// assert!(model.add_edge(Edge::new("S", "S", "E")).is_err());
/// assert_eq!(model.nodes().map(|n| n.id.as_str()).collect::<Vec<_>>(), ["S", "E"]);
/// ```
pub trait Database: Send + Sync {
    /// Flow node type
    type Node: Clone + Send + Sync;

    /// Sequence flow type
    type Edge: Clone + Send + Sync;

    /// Add a flow node; an id already taken by any element is rejected
    fn add_node(&mut self, node: Self::Node) -> Result<()>;

    /// Add a sequence flow; its refs are not checked here
    fn add_edge(&mut self, edge: Self::Edge) -> Result<()>;

    /// Look up a flow node by id
    fn get_node(&self, id: &str) -> Option<&Self::Node>;

    /// Flow nodes in insertion order
    fn nodes(&self) -> impl Iterator<Item = &Self::Node>;

    /// Sequence flows in insertion order
    fn edges(&self) -> impl Iterator<Item = &Self::Edge>;

    /// Drop every node, flow and lane
    fn clear(&mut self);

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
