//! Pipeline layout for BPMN diagrams
//!
//! Places nodes left to right in insertion order, one column per node, each
//! vertically centered on its lane's baseline. Flows are routed
//! orthogonally; flows leaving a gateway fan out symmetrically around the
//! gateway's vertical midpoint.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{Bounds, Database, DiagramWarning, LayoutAlgorithm, Node, Point};

use super::DiagramModel;

/// Layout constants, in logical units
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal gap between consecutive nodes
    pub node_spacing: f64,
    /// Vertical distance between adjacent branches leaving a gateway
    pub branch_spacing: f64,
    /// Left edge of the first node
    pub origin_x: f64,
    /// Top edge of the first lane band
    pub origin_y: f64,
    /// Height of one lane band
    pub lane_height: f64,
    /// Padding around the node extents in the bounding box
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 150.0,
            branch_spacing: 40.0,
            origin_x: 100.0,
            origin_y: 50.0,
            lane_height: 180.0,
            margin: 50.0,
        }
    }
}

/// A node's final box
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: String,
    pub bounds: Bounds,
}

/// A flow with its polyline
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEdge {
    pub id: String,
    pub source_ref: String,
    pub target_ref: String,
    /// Vertical offset applied to the source anchor
    pub fan_out_offset: f64,
    pub waypoints: Vec<Point>,
}

/// Horizontal band occupied by one lane
#[derive(Debug, Clone, PartialEq)]
pub struct LaneBand {
    pub lane_id: String,
    pub name: String,
    pub bounds: Bounds,
}

impl LaneBand {
    /// Vertical middle of the band, where its nodes are centered
    pub fn baseline(&self) -> f64 {
        self.bounds.center_y()
    }
}

/// Result of a layout pass; the model itself is never mutated
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiagramLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<RoutedEdge>,
    pub lanes: Vec<LaneBand>,
    /// Node extents padded by the margin; `None` for an empty model
    pub bounding_box: Option<Bounds>,
    pub warnings: Vec<DiagramWarning>,
}

impl DiagramLayout {
    pub fn node_bounds(&self, id: &str) -> Option<Bounds> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.bounds)
    }

    pub fn edge(&self, id: &str) -> Option<&RoutedEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn lane_band(&self, lane_id: &str) -> Option<&LaneBand> {
        self.lanes.iter().find(|l| l.lane_id == lane_id)
    }
}

/// Vertical anchor offsets for `count` branches leaving one gateway
///
/// Branch `i` gets `(i - (count - 1) / 2) * spacing`; the offsets are
/// symmetric around zero and a single branch gets exactly zero.
pub fn fan_out_offsets(count: usize, spacing: f64) -> Vec<f64> {
    let center = (count as f64 - 1.0) / 2.0;
    (0..count)
        .map(|i| (i as f64 - center) * spacing)
        .collect()
}

/// Left-to-right pipeline layout
#[derive(Debug, Clone, Default)]
pub struct PipelineLayout {
    config: LayoutConfig,
}

impl PipelineLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Position every node in insertion order and route all flows
    pub fn arrange(&self, model: &DiagramModel) -> DiagramLayout {
        let layout_span = span!(
            Level::INFO,
            "layout_pipeline",
            node_count = model.node_count(),
            edge_count = model.edge_count()
        );
        let _enter = layout_span.enter();

        let lanes = self.pipeline_bands(model);
        let fallback_baseline = self.config.origin_y + self.config.lane_height / 2.0;

        let mut positioned = Vec::with_capacity(model.node_count());
        let mut x = self.config.origin_x;
        for node in model.nodes() {
            let size = node.kind.default_size();
            let baseline = lanes
                .iter()
                .find(|band| band.lane_id == node.lane)
                .map(|band| band.baseline())
                .unwrap_or(fallback_baseline);
            let bounds = Bounds::new(x, baseline - size.height / 2.0, size.width, size.height);
            trace!(node_id = %node.id, x = bounds.x, y = bounds.y, "Placed node");
            positioned.push(PositionedNode {
                id: node.id.clone(),
                bounds,
            });
            x += size.width + self.config.node_spacing;
        }

        let layout = self.finish(model, positioned, lanes);
        info!(
            nodes = layout.nodes.len(),
            edges = layout.edges.len(),
            warnings = layout.warnings.len(),
            "Layout completed"
        );
        layout
    }

    /// Keep the coordinates already on the model's nodes and only route flows
    ///
    /// Used for decoded documents that carried usable coordinates, and by
    /// renderers handed an already laid-out model.
    pub fn route_existing(&self, model: &DiagramModel) -> DiagramLayout {
        let route_span = span!(Level::DEBUG, "layout_route_existing");
        let _enter = route_span.enter();

        let positioned: Vec<PositionedNode> = model
            .nodes()
            .map(|node| PositionedNode {
                id: node.id.clone(),
                bounds: node.bounds,
            })
            .collect();
        let lanes = self.derived_bands(model);
        self.finish(model, positioned, lanes)
    }

    fn finish(
        &self,
        model: &DiagramModel,
        nodes: Vec<PositionedNode>,
        lanes: Vec<LaneBand>,
    ) -> DiagramLayout {
        let bounding_box = nodes
            .iter()
            .map(|n| n.bounds)
            .reduce(|acc, b| acc.merge(&b))
            .map(|extent| extent.pad(self.config.margin));

        // Lane bands span the full content width
        let lanes = match bounding_box {
            Some(bbox) => lanes
                .into_iter()
                .map(|mut band| {
                    band.bounds.x = bbox.x;
                    band.bounds.width = bbox.width;
                    band
                })
                .collect(),
            None => lanes,
        };

        let positions: HashMap<&str, Bounds> =
            nodes.iter().map(|n| (n.id.as_str(), n.bounds)).collect();
        let (edges, mut warnings) = self.route_edges(model, &positions, &lanes);

        for node in model.nodes() {
            if node.kind.is_gateway()
                && !edges.iter().any(|edge| edge.source_ref == node.id)
            {
                warn!(node_id = %node.id, "Gateway has no outgoing flows");
                warnings.push(DiagramWarning::DanglingGateway {
                    node_id: node.id.clone(),
                });
            }
        }

        DiagramLayout {
            nodes,
            edges,
            lanes,
            bounding_box,
            warnings,
        }
    }

    /// Fixed bands stacked from `origin_y`, one per lane
    fn pipeline_bands(&self, model: &DiagramModel) -> Vec<LaneBand> {
        model
            .lanes()
            .iter()
            .enumerate()
            .map(|(i, lane)| LaneBand {
                lane_id: lane.id.clone(),
                name: lane.name.clone(),
                bounds: Bounds::new(
                    self.config.origin_x,
                    self.config.origin_y + i as f64 * self.config.lane_height,
                    0.0,
                    self.config.lane_height,
                ),
            })
            .collect()
    }

    /// Bands fitted around the nodes each lane already holds
    fn derived_bands(&self, model: &DiagramModel) -> Vec<LaneBand> {
        let mut bands: Vec<LaneBand> = Vec::with_capacity(model.lanes().len());
        for lane in model.lanes() {
            let extent = model
                .nodes_in_lane(&lane.id)
                .map(|node: &Node| node.bounds)
                .reduce(|acc, b| acc.merge(&b));
            let bounds = match extent {
                Some(extent) => {
                    let center = extent.center_y();
                    let height = (extent.height + 2.0 * self.config.margin)
                        .max(self.config.lane_height);
                    Bounds::new(extent.x, center - height / 2.0, 0.0, height)
                }
                None => {
                    let top = bands
                        .iter()
                        .map(|b| b.bounds.bottom())
                        .fold(self.config.origin_y, f64::max);
                    Bounds::new(self.config.origin_x, top, 0.0, self.config.lane_height)
                }
            };
            bands.push(LaneBand {
                lane_id: lane.id.clone(),
                name: lane.name.clone(),
                bounds,
            });
        }
        bands
    }

    fn route_edges(
        &self,
        model: &DiagramModel,
        positions: &HashMap<&str, Bounds>,
        lanes: &[LaneBand],
    ) -> (Vec<RoutedEdge>, Vec<DiagramWarning>) {
        let mut warnings = Vec::new();
        let mut routed = Vec::with_capacity(model.edge_count());

        // Fan-out is computed over the resolvable flows of each gateway
        let mut branch_count: HashMap<&str, usize> = HashMap::new();
        for edge in model.edges() {
            if positions.contains_key(edge.source_ref.as_str())
                && positions.contains_key(edge.target_ref.as_str())
            {
                *branch_count.entry(edge.source_ref.as_str()).or_insert(0) += 1;
            }
        }
        let mut branch_seen: HashMap<&str, usize> = HashMap::new();

        for edge in model.edges() {
            let (source, target) = match (
                positions.get(edge.source_ref.as_str()),
                positions.get(edge.target_ref.as_str()),
            ) {
                (Some(s), Some(t)) => (*s, *t),
                (s, _) => {
                    let missing_ref = if s.is_none() {
                        &edge.source_ref
                    } else {
                        &edge.target_ref
                    };
                    warn!(edge_id = %edge.id, missing_ref = %missing_ref, "Skipping unresolved flow");
                    warnings.push(DiagramWarning::UnresolvedEdge {
                        edge_id: edge.id.clone(),
                        missing_ref: missing_ref.clone(),
                    });
                    continue;
                }
            };

            let source_node = model.get_node(&edge.source_ref);
            let is_gateway = source_node.map(|n| n.kind.is_gateway()).unwrap_or(false);
            let fan_out_offset = if is_gateway {
                let count = branch_count
                    .get(edge.source_ref.as_str())
                    .copied()
                    .unwrap_or(1);
                let seen = branch_seen.entry(edge.source_ref.as_str()).or_insert(0);
                let offset = fan_out_offsets(count, self.config.branch_spacing)
                    .get(*seen)
                    .copied()
                    .unwrap_or(0.0);
                *seen += 1;
                offset
            } else {
                0.0
            };

            let start = source.right_middle().offset(0.0, fan_out_offset);
            let end = target.left_middle();
            let waypoints = if end.x < start.x {
                let baseline = source_node
                    .and_then(|n| lanes.iter().find(|band| band.lane_id == n.lane))
                    .map(|band| band.baseline())
                    .unwrap_or_else(|| source.center_y());
                let below = baseline
                    + (self.config.lane_height * 0.4)
                        .max(source.height / 2.0 + self.config.branch_spacing / 2.0);
                let step = self.config.branch_spacing / 2.0;
                vec![
                    start,
                    Point::new(start.x + step, start.y),
                    Point::new(start.x + step, below),
                    Point::new(end.x - step, below),
                    Point::new(end.x - step, end.y),
                    end,
                ]
            } else if start.y == end.y {
                vec![start, end]
            } else {
                let mid_x = (start.x + end.x) / 2.0;
                vec![
                    start,
                    Point::new(mid_x, start.y),
                    Point::new(mid_x, end.y),
                    end,
                ]
            };

            trace!(edge_id = %edge.id, points = waypoints.len(), fan_out_offset, "Routed flow");
            routed.push(RoutedEdge {
                id: edge.id.clone(),
                source_ref: edge.source_ref.clone(),
                target_ref: edge.target_ref.clone(),
                fan_out_offset,
                waypoints,
            });
        }

        debug!(routed = routed.len(), skipped = warnings.len(), "Flow routing completed");
        (routed, warnings)
    }
}

impl LayoutAlgorithm<DiagramModel> for PipelineLayout {
    type Output = DiagramLayout;

    fn layout(&self, database: &DiagramModel) -> Result<DiagramLayout> {
        Ok(self.arrange(database))
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn direction(&self) -> &'static str {
        "LR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Edge, Lane, NodeKind};

    fn linear(tasks: usize) -> DiagramModel {
        let mut model = DiagramModel::new("P", "Linear");
        model.add_lane(Lane::new("L", "Lane", "P")).unwrap();
        model
            .add_node(Node::new("S", "Start", NodeKind::StartEvent, "L"))
            .unwrap();
        let mut prev = "S".to_string();
        for i in 0..tasks {
            let id = format!("T{}", i);
            model
                .add_node(Node::new(&id, "Task", NodeKind::UserTask, "L"))
                .unwrap();
            model
                .add_edge(Edge::new(format!("F{}", i), &prev, &id))
                .unwrap();
            prev = id;
        }
        model
            .add_node(Node::new("E", "End", NodeKind::EndEvent, "L"))
            .unwrap();
        model.add_edge(Edge::new("FE", &prev, "E")).unwrap();
        model
    }

    #[test]
    fn test_layout_trait_metadata() {
        let layout = PipelineLayout::new();
        assert_eq!(layout.name(), "pipeline");
        assert_eq!(layout.version(), "0.1.0");
        assert_eq!(layout.direction(), "LR");
    }

    #[test]
    fn test_fixed_spacing() {
        let model = linear(2);
        let layout = PipelineLayout::new().arrange(&model);
        let s = layout.node_bounds("S").unwrap();
        let t0 = layout.node_bounds("T0").unwrap();
        let t1 = layout.node_bounds("T1").unwrap();
        let e = layout.node_bounds("E").unwrap();
        assert_eq!(s.x, 100.0);
        assert_eq!(t0.x, s.x + 36.0 + 150.0);
        assert_eq!(t1.x, t0.x + 100.0 + 150.0);
        assert_eq!(e.x, t1.x + 100.0 + 150.0);
    }

    #[test]
    fn test_nodes_centered_on_baseline() {
        let model = linear(1);
        let layout = PipelineLayout::new().arrange(&model);
        let s = layout.node_bounds("S").unwrap();
        let t = layout.node_bounds("T0").unwrap();
        assert_eq!(s.center_y(), t.center_y());
        assert_eq!(t.center_y(), 50.0 + 90.0);
        assert_eq!(s.width, 36.0);
        assert_eq!(t.height, 80.0);
    }

    #[test]
    fn test_straight_edges_have_two_points() {
        let model = linear(1);
        let layout = PipelineLayout::new().arrange(&model);
        for edge in &layout.edges {
            assert_eq!(edge.waypoints.len(), 2, "edge {}", edge.id);
        }
    }

    #[test]
    fn test_zero_tasks_yields_start_to_end() {
        let model = linear(0);
        let layout = PipelineLayout::new().arrange(&model);
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.edges.len(), 1);
        assert_eq!(layout.edges[0].source_ref, "S");
        assert_eq!(layout.edges[0].target_ref, "E");
    }

    #[test]
    fn test_bounding_box_padded_by_margin() {
        let model = linear(1);
        let layout = PipelineLayout::new().arrange(&model);
        let bbox = layout.bounding_box.unwrap();
        let e = layout.node_bounds("E").unwrap();
        let t = layout.node_bounds("T0").unwrap();
        assert_eq!(bbox.x, 100.0 - 50.0);
        assert_eq!(bbox.right(), e.right() + 50.0);
        assert_eq!(bbox.y, t.y - 50.0);
        assert_eq!(bbox.bottom(), t.bottom() + 50.0);
    }

    #[test]
    fn test_empty_model_has_no_bounding_box() {
        let model = DiagramModel::new("P", "Empty");
        let layout = PipelineLayout::new().arrange(&model);
        assert!(layout.bounding_box.is_none());
        assert!(layout.nodes.is_empty());
    }

    #[test]
    fn test_gateway_fan_out() {
        let mut model = linear(2);
        model
            .add_node(Node::new("G", "Ok?", NodeKind::ExclusiveGateway, "L"))
            .unwrap();
        model.add_edge(Edge::new("Y", "G", "T1")).unwrap();
        model.add_edge(Edge::new("N", "G", "E")).unwrap();
        let layout = PipelineLayout::new().arrange(&model);
        let yes = layout.edge("Y").unwrap();
        let no = layout.edge("N").unwrap();
        assert_eq!(yes.fan_out_offset, -20.0);
        assert_eq!(no.fan_out_offset, 20.0);
        let g = layout.node_bounds("G").unwrap();
        assert_eq!(yes.waypoints[0].y, g.center_y() - 20.0);
    }

    #[test]
    fn test_backward_edge_detours_below_lane() {
        let mut model = linear(2);
        model.add_edge(Edge::new("Back", "T1", "T0")).unwrap();
        let layout = PipelineLayout::new().arrange(&model);
        let back = layout.edge("Back").unwrap();
        assert_eq!(back.waypoints.len(), 6);
        let baseline = layout.lane_band("L").unwrap().baseline();
        assert!(back.waypoints[2].y > baseline);
        assert_eq!(back.waypoints[2].y, back.waypoints[3].y);
    }

    #[test]
    fn test_dangling_gateway_warns_without_aborting() {
        let mut model = linear(0);
        model
            .add_node(Node::new("G", "Stuck?", NodeKind::ParallelGateway, "L"))
            .unwrap();
        let layout = PipelineLayout::new().arrange(&model);
        assert_eq!(layout.nodes.len(), 3);
        assert!(layout.warnings.contains(&DiagramWarning::DanglingGateway {
            node_id: "G".to_string()
        }));
    }

    #[test]
    fn test_unresolved_edge_skipped() {
        let mut model = linear(0);
        model.add_edge(Edge::new("Bad", "S", "Ghost")).unwrap();
        let layout = PipelineLayout::new().arrange(&model);
        assert!(layout.edge("Bad").is_none());
        assert_eq!(
            layout.warnings,
            vec![DiagramWarning::UnresolvedEdge {
                edge_id: "Bad".to_string(),
                missing_ref: "Ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_lanes_stack_vertically() {
        let mut model = DiagramModel::new("P", "Two lanes");
        model.add_lane(Lane::new("A", "Alice", "P")).unwrap();
        model.add_lane(Lane::new("B", "Bob", "P")).unwrap();
        model
            .add_node(Node::new("S", "Start", NodeKind::StartEvent, "A"))
            .unwrap();
        model
            .add_node(Node::new("T", "Task", NodeKind::UserTask, "B"))
            .unwrap();
        model.add_edge(Edge::new("F", "S", "T")).unwrap();
        let layout = PipelineLayout::new().arrange(&model);
        let a = layout.lane_band("A").unwrap();
        let b = layout.lane_band("B").unwrap();
        assert_eq!(b.bounds.y, a.bounds.bottom());
        assert_eq!(layout.node_bounds("T").unwrap().center_y(), b.baseline());
        assert_eq!(layout.edge("F").unwrap().waypoints.len(), 4);
    }

    #[test]
    fn test_route_existing_keeps_coordinates() {
        let model = linear(1);
        let laid_out = model.with_layout(&PipelineLayout::new().arrange(&model));
        let rerouted = PipelineLayout::new().route_existing(&laid_out);
        for node in laid_out.nodes() {
            assert_eq!(rerouted.node_bounds(&node.id), Some(node.bounds));
        }
        assert_eq!(rerouted.edges.len(), 2);
    }

    #[test]
    fn test_fan_out_offsets() {
        assert_eq!(fan_out_offsets(1, 40.0), vec![0.0]);
        assert_eq!(fan_out_offsets(2, 40.0), vec![-20.0, 20.0]);
        assert_eq!(fan_out_offsets(3, 40.0), vec![-40.0, 0.0, 40.0]);
        assert!(fan_out_offsets(0, 40.0).is_empty());
    }
}
