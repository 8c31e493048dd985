//! SVG renderer for laid-out process diagrams
//!
//! Draws lane bands, flow nodes and sequence flows with the `svg` crate.
//! Content is shifted so its bounding box starts at the origin, then the
//! viewport transform is applied on the root group.

use anyhow::Result;
use svg::node::element::{
    Circle, Definitions, Group, Line, Marker, Path, Polygon, Polyline, Rectangle, Text,
};
use svg::Document;
use tracing::{debug, info, span, Level};

use crate::core::{fit_label, truncate_label, Bounds, Database, Node, NodeKind, Renderer, Size};
use crate::viewer::ViewportState;

use super::layout::{DiagramLayout, PipelineLayout, RoutedEdge};
use super::DiagramModel;

const ARROW_MARKER_ID: &str = "sequence-flow-arrow";

/// Colors, fonts and label widths
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub font_family: String,
    pub font_size: f64,
    /// Columns per line inside a task box
    pub task_label_width: usize,
    pub task_label_lines: usize,
    /// Columns for labels under events and gateways
    pub caption_width: usize,
    pub lane_label_width: usize,
    pub flow_label_width: usize,
    pub stroke: String,
    pub task_fill: String,
    pub event_fill: String,
    pub gateway_fill: String,
    pub lane_fill: String,
    pub lane_stroke: String,
    pub flow_stroke: String,
    pub background: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_size: 12.0,
            task_label_width: 14,
            task_label_lines: 3,
            caption_width: 18,
            lane_label_width: 20,
            flow_label_width: 16,
            stroke: "#22242a".to_string(),
            task_fill: "#ffffff".to_string(),
            event_fill: "#ffffff".to_string(),
            gateway_fill: "#ffffff".to_string(),
            lane_fill: "#f7f9fb".to_string(),
            lane_stroke: "#9aa5b1".to_string(),
            flow_stroke: "#22242a".to_string(),
            background: None,
        }
    }
}

/// SVG renderer
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    config: RenderConfig,
    layout: PipelineLayout,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            config,
            layout: PipelineLayout::default(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `model` under `viewport` onto a canvas of `canvas` size
    ///
    /// Without a canvas size the document is as large as the content's
    /// bounding box at the viewport's scale.
    pub fn render_view(
        &self,
        model: &DiagramModel,
        layout: &DiagramLayout,
        viewport: &ViewportState,
        canvas: Option<Size>,
    ) -> Document {
        let render_span = span!(
            Level::INFO,
            "render_svg",
            node_count = model.node_count(),
            edge_count = model.edge_count(),
            scale = viewport.scale
        );
        let _enter = render_span.enter();

        let bbox = layout
            .bounding_box
            .unwrap_or_else(|| Bounds::new(0.0, 0.0, 0.0, 0.0));
        let canvas = canvas.unwrap_or_else(|| {
            Size::new(
                (bbox.width * viewport.scale).max(1.0),
                (bbox.height * viewport.scale).max(1.0),
            )
        });
        debug!(width = canvas.width, height = canvas.height, "Canvas size");

        let mut document = Document::new()
            .set("viewBox", format!("0 0 {} {}", canvas.width, canvas.height))
            .set("width", canvas.width)
            .set("height", canvas.height)
            .set("font-family", self.config.font_family.as_str())
            .set("font-size", self.config.font_size)
            .add(self.marker_definitions());

        if let Some(background) = &self.config.background {
            document = document.add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", background.as_str()),
            );
        }

        let mut content = Group::new()
            .set("class", "diagram-content")
            .set("transform", format!("translate({} {})", -bbox.x, -bbox.y));

        for band in &layout.lanes {
            content = content.add(self.lane(band.lane_id.as_str(), &band.name, &band.bounds));
        }
        for edge in &layout.edges {
            let name = model
                .edges()
                .find(|e| e.id == edge.id)
                .and_then(|e| e.name.as_deref());
            content = content.add(self.flow(edge, name));
        }
        for node in model.nodes() {
            let bounds = layout.node_bounds(&node.id).unwrap_or(node.bounds);
            content = content.add(self.node(node, &bounds));
        }

        let root = Group::new()
            .set("class", "viewport")
            .set("transform", viewport.transform())
            .add(content);
        info!(
            lanes = layout.lanes.len(),
            nodes = model.node_count(),
            flows = layout.edges.len(),
            "SVG rendered"
        );
        document.add(root)
    }

    /// Render with the model's own coordinates at scale 1
    pub fn render_model(&self, model: &DiagramModel) -> String {
        let layout = self.layout.route_existing(model);
        self.render_view(model, &layout, &ViewportState::default(), None)
            .to_string()
    }

    fn marker_definitions(&self) -> Definitions {
        let arrow = Marker::new()
            .set("id", ARROW_MARKER_ID)
            .set("viewBox", "0 0 10 10")
            .set("refX", 9)
            .set("refY", 5)
            .set("markerWidth", 8)
            .set("markerHeight", 8)
            .set("orient", "auto")
            .add(
                Path::new()
                    .set("d", "M 0 0 L 10 5 L 0 10 z")
                    .set("fill", self.config.flow_stroke.as_str()),
            );
        Definitions::new().add(arrow)
    }

    fn text(&self, content: String, x: f64, y: f64) -> Text {
        Text::new(content)
            .set("x", x)
            .set("y", y)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
    }

    fn lane(&self, lane_id: &str, name: &str, bounds: &Bounds) -> Group {
        let header = 30.0_f64.min(bounds.width);
        let label_x = bounds.x + header / 2.0;
        let label_y = bounds.center_y();
        Group::new()
            .set("class", "lane")
            .set("data-element-id", lane_id)
            .add(
                Rectangle::new()
                    .set("x", bounds.x)
                    .set("y", bounds.y)
                    .set("width", bounds.width)
                    .set("height", bounds.height)
                    .set("fill", self.config.lane_fill.as_str())
                    .set("stroke", self.config.lane_stroke.as_str()),
            )
            .add(
                Line::new()
                    .set("x1", bounds.x + header)
                    .set("y1", bounds.y)
                    .set("x2", bounds.x + header)
                    .set("y2", bounds.bottom())
                    .set("stroke", self.config.lane_stroke.as_str()),
            )
            .add(
                self.text(
                    truncate_label(name, self.config.lane_label_width),
                    label_x,
                    label_y,
                )
                .set("transform", format!("rotate(-90 {} {})", label_x, label_y)),
            )
    }

    fn caption(&self, node: &Node, bounds: &Bounds) -> Option<Text> {
        let name = node.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(self.text(
            truncate_label(name, self.config.caption_width),
            bounds.center().x,
            bounds.bottom() + self.config.font_size,
        ))
    }

    fn diamond(&self, bounds: &Bounds) -> Polygon {
        let c = bounds.center();
        let points = format!(
            "{},{} {},{} {},{} {},{}",
            c.x,
            bounds.y,
            bounds.right(),
            c.y,
            c.x,
            bounds.bottom(),
            bounds.x,
            c.y
        );
        Polygon::new()
            .set("points", points)
            .set("fill", self.config.gateway_fill.as_str())
            .set("stroke", self.config.stroke.as_str())
            .set("stroke-width", 2)
    }

    fn node(&self, node: &Node, bounds: &Bounds) -> Group {
        let center = bounds.center();
        let group = Group::new()
            .set("class", format!("node {}", node.kind.element_name()))
            .set("data-element-id", node.id.as_str());

        let group = match node.kind {
            NodeKind::StartEvent | NodeKind::EndEvent => {
                let stroke_width = if node.kind == NodeKind::EndEvent { 4 } else { 2 };
                group.add(
                    Circle::new()
                        .set("cx", center.x)
                        .set("cy", center.y)
                        .set("r", bounds.width.min(bounds.height) / 2.0)
                        .set("fill", self.config.event_fill.as_str())
                        .set("stroke", self.config.stroke.as_str())
                        .set("stroke-width", stroke_width),
                )
            }
            NodeKind::UserTask => {
                let mut group = group.add(
                    Rectangle::new()
                        .set("x", bounds.x)
                        .set("y", bounds.y)
                        .set("width", bounds.width)
                        .set("height", bounds.height)
                        .set("rx", 10)
                        .set("fill", self.config.task_fill.as_str())
                        .set("stroke", self.config.stroke.as_str())
                        .set("stroke-width", 2),
                );
                let lines = fit_label(
                    node.name.trim(),
                    self.config.task_label_width,
                    self.config.task_label_lines,
                );
                let line_height = self.config.font_size * 1.2;
                let first_y = center.y - line_height * (lines.len() as f64 - 1.0) / 2.0;
                for (i, line) in lines.into_iter().enumerate() {
                    group = group.add(self.text(line, center.x, first_y + line_height * i as f64));
                }
                return group;
            }
            NodeKind::ExclusiveGateway => group.add(self.diamond(bounds)),
            NodeKind::ParallelGateway => {
                let arm = bounds.width.min(bounds.height) / 4.0;
                group.add(self.diamond(bounds)).add(
                    Path::new()
                        .set(
                            "d",
                            format!(
                                "M {} {} L {} {} M {} {} L {} {}",
                                center.x - arm,
                                center.y,
                                center.x + arm,
                                center.y,
                                center.x,
                                center.y - arm,
                                center.x,
                                center.y + arm
                            ),
                        )
                        .set("stroke", self.config.stroke.as_str())
                        .set("stroke-width", 3)
                        .set("class", "parallel-marker"),
                )
            }
        };

        match self.caption(node, bounds) {
            Some(caption) => group.add(caption),
            None => group,
        }
    }

    fn flow(&self, edge: &RoutedEdge, name: Option<&str>) -> Group {
        let points: Vec<String> = edge
            .waypoints
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect();
        let mut group = Group::new()
            .set("class", "sequence-flow")
            .set("data-element-id", edge.id.as_str())
            .add(
                Polyline::new()
                    .set("points", points.join(" "))
                    .set("fill", "none")
                    .set("stroke", self.config.flow_stroke.as_str())
                    .set("stroke-width", 1.5)
                    .set("marker-end", format!("url(#{})", ARROW_MARKER_ID)),
            );

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            // Label the middle segment
            let mid = edge.waypoints.len() / 2;
            if let (Some(a), Some(b)) = (
                edge.waypoints.get(mid.saturating_sub(1)),
                edge.waypoints.get(mid),
            ) {
                group = group.add(
                    self.text(
                        truncate_label(name, self.config.flow_label_width),
                        (a.x + b.x) / 2.0,
                        (a.y + b.y) / 2.0 - self.config.font_size * 0.8,
                    )
                    .set("class", "flow-label"),
                );
            }
        }
        group
    }
}

impl Renderer<DiagramModel> for SvgRenderer {
    type Output = String;

    fn render(&self, database: &DiagramModel) -> Result<Self::Output> {
        Ok(self.render_model(database))
    }

    fn name(&self) -> &'static str {
        "svg"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn format(&self) -> &'static str {
        "svg"
    }
}
