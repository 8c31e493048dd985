//! BPMN 2.0 XML encoder
//!
//! Serializes a [`DiagramModel`] and its [`DiagramLayout`] into a
//! namespace-qualified BPMN 2.0 document with a collaboration, one process
//! and a DI plane.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, span, warn, Level};

use crate::core::{Bounds, Database, DiagramError, IdAllocator, IdKind, Node, Renderer, RunToken};

use super::layout::{DiagramLayout, PipelineLayout};
use super::DiagramModel;

/// XML prolog every encoded document starts with
pub const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// `targetNamespace` written on the root element
pub const TARGET_NAMESPACE: &str = "http://bpmn.io/schema/bpmn";

/// Namespace prefixes and URIs every document declares
pub const BPMN_NAMESPACES: [(&str, &str); 5] = [
    ("bpmn2", "http://www.omg.org/spec/BPMN/20100524/MODEL"),
    ("bpmndi", "http://www.omg.org/spec/BPMN/20100524/DI"),
    ("dc", "http://www.omg.org/spec/DD/20100524/DC"),
    ("di", "http://www.omg.org/spec/DD/20100524/DI"),
    ("xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

/// Indenting writer for the handful of element shapes the encoder emits
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_PROLOG);
        out.push('\n');
        Self { out, depth: 0 }
    }

    fn tag(&mut self, name: &str, attrs: &[(&str, &str)], close: &str) {
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&htmlize::escape_attribute(*value));
            self.out.push('"');
        }
        self.out.push_str(close);
        self.out.push('\n');
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.tag(name, attrs, ">");
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.tag(name, attrs, " />");
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.tag(name, attrs, ">");
        // Put the text on the same line as the start tag
        self.out.pop();
        self.out.push_str(&htmlize::escape_text(text));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    fn bounds(&mut self, bounds: &Bounds) {
        let (x, y, w, h) = (
            bounds.x.to_string(),
            bounds.y.to_string(),
            bounds.width.to_string(),
            bounds.height.to_string(),
        );
        self.empty(
            "dc:Bounds",
            &[
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("width", w.as_str()),
                ("height", h.as_str()),
            ],
        );
    }

    fn finish(self) -> String {
        self.out
    }
}

/// BPMN 2.0 XML encoder
#[derive(Debug, Clone)]
pub struct BpmnEncoder {
    token: RunToken,
    layout: PipelineLayout,
}

impl Default for BpmnEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BpmnEncoder {
    pub fn new() -> Self {
        Self {
            token: RunToken::from(0),
            layout: PipelineLayout::new(),
        }
    }

    /// Mint document-level ids (definitions, collaboration, diagram, plane)
    /// with the token of the run that built the model
    pub fn with_token(token: RunToken) -> Self {
        Self {
            token,
            ..Self::new()
        }
    }

    /// Encode a model with the given layout
    pub fn encode(&self, model: &DiagramModel, layout: &DiagramLayout) -> Result<String> {
        let encode_span = span!(
            Level::INFO,
            "encode_bpmn",
            node_count = model.node_count(),
            edge_count = model.edge_count()
        );
        let _enter = encode_span.enter();

        if model.process_id().is_empty() {
            return Err(DiagramError::encode_error("model has no process id".to_string()).into());
        }

        let mut ids = IdAllocator::new(self.token);
        let mut fresh = |kind: IdKind| loop {
            let id = ids.allocate(kind);
            if !model.contains_id(&id) && id != model.process_id() {
                break id;
            }
        };
        let definitions_id = fresh(IdKind::Definitions);
        let collaboration_id = fresh(IdKind::Collaboration);
        let diagram_id = fresh(IdKind::Diagram);
        let plane_id = fresh(IdKind::Plane);

        // A document without participants still needs one for its pool
        let participants: Vec<(String, String)> = if model.lanes().is_empty() {
            vec![(fresh(IdKind::Participant), model.process_name().to_string())]
        } else {
            model
                .lanes()
                .iter()
                .map(|lane| (lane.id.clone(), lane.name.clone()))
                .collect()
        };

        let resolvable: Vec<_> = model
            .edges()
            .filter(|edge| {
                let ok = model.has_node(&edge.source_ref) && model.has_node(&edge.target_ref);
                if !ok {
                    warn!(edge_id = %edge.id, "Not encoding unresolved flow");
                }
                ok
            })
            .collect();
        let encoded_flows: HashSet<&str> = resolvable.iter().map(|e| e.id.as_str()).collect();

        let mut xml = XmlWriter::new();
        let mut root_attrs: Vec<(String, &str)> = BPMN_NAMESPACES
            .iter()
            .map(|(prefix, uri)| (format!("xmlns:{}", prefix), *uri))
            .collect();
        root_attrs.push(("id".to_string(), definitions_id.as_str()));
        root_attrs.push(("targetNamespace".to_string(), TARGET_NAMESPACE));
        let root_attrs: Vec<(&str, &str)> =
            root_attrs.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        xml.open("bpmn2:definitions", &root_attrs);

        xml.open("bpmn2:collaboration", &[("id", collaboration_id.as_str())]);
        for (id, name) in &participants {
            xml.empty(
                "bpmn2:participant",
                &[
                    ("id", id.as_str()),
                    ("name", name.as_str()),
                    ("processRef", model.process_id()),
                ],
            );
        }
        xml.close("bpmn2:collaboration");

        xml.open(
            "bpmn2:process",
            &[
                ("id", model.process_id()),
                ("name", model.process_name()),
                ("isExecutable", "true"),
            ],
        );
        if let Some(documentation) = model.documentation() {
            xml.text_element("bpmn2:documentation", &[], documentation);
        }

        if !model.lanes().is_empty() {
            let lane_set_id = format!("{}_laneSet", model.process_id());
            xml.open("bpmn2:laneSet", &[("id", lane_set_id.as_str())]);
            for lane in model.lanes() {
                let lane_id = format!("{}_lane", lane.id);
                xml.open(
                    "bpmn2:lane",
                    &[("id", lane_id.as_str()), ("name", lane.name.as_str())],
                );
                for node in model.nodes_in_lane(&lane.id) {
                    xml.text_element("bpmn2:flowNodeRef", &[], &node.id);
                }
                xml.close("bpmn2:lane");
            }
            xml.close("bpmn2:laneSet");
        }

        for node in model.nodes() {
            let element = format!("bpmn2:{}", node.kind.element_name());
            let incoming: Vec<&str> = model
                .incoming(&node.id)
                .filter(|e| encoded_flows.contains(e.id.as_str()))
                .map(|e| e.id.as_str())
                .collect();
            let outgoing: Vec<&str> = model
                .outgoing(&node.id)
                .filter(|e| encoded_flows.contains(e.id.as_str()))
                .map(|e| e.id.as_str())
                .collect();
            let attrs = [("id", node.id.as_str()), ("name", node.name.as_str())];
            if incoming.is_empty() && outgoing.is_empty() {
                xml.empty(&element, &attrs);
                continue;
            }
            xml.open(&element, &attrs);
            for flow in incoming {
                xml.text_element("bpmn2:incoming", &[], flow);
            }
            for flow in outgoing {
                xml.text_element("bpmn2:outgoing", &[], flow);
            }
            xml.close(&element);
        }

        for edge in &resolvable {
            let mut attrs = vec![("id", edge.id.as_str())];
            if let Some(name) = &edge.name {
                attrs.push(("name", name.as_str()));
            }
            attrs.push(("sourceRef", edge.source_ref.as_str()));
            attrs.push(("targetRef", edge.target_ref.as_str()));
            match &edge.condition {
                Some(condition) => {
                    xml.open("bpmn2:sequenceFlow", &attrs);
                    xml.text_element(
                        "bpmn2:conditionExpression",
                        &[("xsi:type", "bpmn2:tFormalExpression")],
                        condition,
                    );
                    xml.close("bpmn2:sequenceFlow");
                }
                None => xml.empty("bpmn2:sequenceFlow", &attrs),
            }
        }
        xml.close("bpmn2:process");

        xml.open("bpmndi:BPMNDiagram", &[("id", diagram_id.as_str())]);
        xml.open(
            "bpmndi:BPMNPlane",
            &[
                ("id", plane_id.as_str()),
                ("bpmnElement", collaboration_id.as_str()),
            ],
        );

        let content = layout.bounding_box.unwrap_or_default();
        for (i, (id, _)) in participants.iter().enumerate() {
            let shape_id = format!("{}_di", id);
            xml.open(
                "bpmndi:BPMNShape",
                &[
                    ("id", shape_id.as_str()),
                    ("bpmnElement", id.as_str()),
                    ("isHorizontal", "true"),
                ],
            );
            let band = layout
                .lane_band(id)
                .map(|band| band.bounds)
                .unwrap_or_else(|| {
                    Bounds::new(
                        content.x,
                        content.y + i as f64 * content.height,
                        content.width,
                        content.height,
                    )
                });
            xml.bounds(&band);
            xml.close("bpmndi:BPMNShape");
        }

        for node in model.nodes() {
            let bounds = node_bounds(node, layout);
            let shape_id = format!("{}_di", node.id);
            xml.open(
                "bpmndi:BPMNShape",
                &[("id", shape_id.as_str()), ("bpmnElement", node.id.as_str())],
            );
            xml.bounds(&bounds);
            xml.close("bpmndi:BPMNShape");
        }

        for edge in &resolvable {
            let Some(routed) = layout.edge(&edge.id) else {
                warn!(edge_id = %edge.id, "Flow has no route, omitting its edge shape");
                continue;
            };
            let edge_di_id = format!("{}_di", edge.id);
            xml.open(
                "bpmndi:BPMNEdge",
                &[("id", edge_di_id.as_str()), ("bpmnElement", edge.id.as_str())],
            );
            for point in &routed.waypoints {
                let (x, y) = (point.x.to_string(), point.y.to_string());
                xml.empty("di:waypoint", &[("x", x.as_str()), ("y", y.as_str())]);
            }
            xml.close("bpmndi:BPMNEdge");
        }

        xml.close("bpmndi:BPMNPlane");
        xml.close("bpmndi:BPMNDiagram");
        xml.close("bpmn2:definitions");

        let output = xml.finish();
        debug!(
            participants = participants.len(),
            flows = resolvable.len(),
            "Document assembled"
        );
        info!(output_len = output.len(), "Encoding completed");
        Ok(output)
    }
}

fn node_bounds(node: &Node, layout: &DiagramLayout) -> Bounds {
    layout.node_bounds(&node.id).unwrap_or(node.bounds)
}

impl Renderer<DiagramModel> for BpmnEncoder {
    type Output = String;

    /// Encode a model that already carries coordinates
    fn render(&self, database: &DiagramModel) -> Result<String> {
        let layout = self.layout.route_existing(database);
        self.encode(database, &layout)
    }

    fn name(&self) -> &'static str {
        "bpmn-xml"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn format(&self) -> &'static str {
        "bpmn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Edge, Lane, NodeKind};

    fn model() -> DiagramModel {
        let mut model = DiagramModel::new("Process_1", "Orders & <Returns>");
        model.set_documentation("Ship \"fast\"");
        model.add_lane(Lane::new("Lane_A", "Sales", "Process_1")).unwrap();
        model
            .add_node(Node::new("S", "Order in", NodeKind::StartEvent, "Lane_A"))
            .unwrap();
        model
            .add_node(Node::new("G", "In stock?", NodeKind::ExclusiveGateway, "Lane_A"))
            .unwrap();
        model
            .add_node(Node::new("E", "Done", NodeKind::EndEvent, "Lane_A"))
            .unwrap();
        model.add_edge(Edge::new("F1", "S", "G")).unwrap();
        model
            .add_edge(
                Edge::new("F2", "G", "E")
                    .with_name("YES")
                    .with_condition("${stock > 0}"),
            )
            .unwrap();
        model
    }

    fn encode(model: &DiagramModel) -> String {
        let layout = PipelineLayout::new().arrange(model);
        BpmnEncoder::with_token(RunToken::from(5))
            .encode(model, &layout)
            .unwrap()
    }

    #[test]
    fn test_prolog_and_namespaces() {
        let xml = encode(&model());
        assert!(xml.starts_with(XML_PROLOG));
        for (prefix, uri) in BPMN_NAMESPACES {
            assert!(xml.contains(&format!("xmlns:{}=\"{}\"", prefix, uri)));
        }
        assert!(xml.contains("targetNamespace=\"http://bpmn.io/schema/bpmn\""));
        assert!(xml.contains("id=\"Definitions_1_5\""));
    }

    #[test]
    fn test_structure() {
        let xml = encode(&model());
        assert!(xml.contains("<bpmn2:collaboration id=\"Collaboration_1_5\">"));
        assert!(xml.contains("processRef=\"Process_1\""));
        assert!(xml.contains("isExecutable=\"true\""));
        assert!(xml.contains("<bpmn2:lane id=\"Lane_A_lane\" name=\"Sales\">"));
        assert!(xml.contains("<bpmn2:flowNodeRef>G</bpmn2:flowNodeRef>"));
        assert!(xml.contains("<bpmn2:exclusiveGateway id=\"G\" name=\"In stock?\">"));
        assert!(xml.contains("<bpmn2:incoming>F1</bpmn2:incoming>"));
        assert!(xml.contains("<bpmn2:outgoing>F2</bpmn2:outgoing>"));
        assert!(xml.contains("bpmnElement=\"Collaboration_1_5\""));
        assert!(xml.contains("<bpmndi:BPMNShape id=\"S_di\" bpmnElement=\"S\">"));
        assert!(xml.contains("<bpmndi:BPMNEdge id=\"F2_di\" bpmnElement=\"F2\">"));
        assert!(xml.contains("isHorizontal=\"true\""));
    }

    #[test]
    fn test_condition_expression() {
        let xml = encode(&model());
        assert!(xml.contains(
            "<bpmn2:conditionExpression xsi:type=\"bpmn2:tFormalExpression\">${stock &gt; 0}</bpmn2:conditionExpression>"
        ));
        assert!(xml.contains("<bpmn2:sequenceFlow id=\"F1\" sourceRef=\"S\" targetRef=\"G\" />"));
    }

    #[test]
    fn test_escaping() {
        let xml = encode(&model());
        assert!(xml.contains("name=\"Orders &amp; &lt;Returns&gt;\""));
        assert!(xml.contains("Ship \"fast\"</bpmn2:documentation>"));
        assert!(!xml.contains("Orders & <Returns>"));
    }

    #[test]
    fn test_well_formed() {
        let xml = encode(&model());
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "definitions");
    }

    #[test]
    fn test_waypoints_written() {
        let m = model();
        let layout = PipelineLayout::new().arrange(&m);
        let xml = BpmnEncoder::new().encode(&m, &layout).unwrap();
        let routed = layout.edge("F1").unwrap();
        let first = routed.waypoints[0];
        assert!(xml.contains(&format!("<di:waypoint x=\"{}\" y=\"{}\" />", first.x, first.y)));
    }

    #[test]
    fn test_unresolved_flow_not_encoded() {
        let mut m = model();
        m.add_edge(Edge::new("Ghost", "S", "Nowhere")).unwrap();
        let xml = encode(&m);
        assert!(!xml.contains("Ghost"));
    }

    #[test]
    fn test_model_without_lanes_gets_participant() {
        let mut m = DiagramModel::new("P", "Solo");
        m.add_node(Node::new("S", "Go", NodeKind::StartEvent, "none"))
            .unwrap();
        let xml = encode(&m);
        assert!(xml.contains("<bpmn2:participant id=\"Participant_1_5\" name=\"Solo\" processRef=\"P\" />"));
        assert!(!xml.contains("laneSet"));
    }

    #[test]
    fn test_generated_ids_avoid_collisions() {
        let mut m = model();
        m.add_node(Node::new("Definitions_1_5", "Odd", NodeKind::UserTask, "Lane_A"))
            .unwrap();
        let xml = encode(&m);
        assert!(xml.contains("id=\"Definitions_2_5\""));
    }

    #[test]
    fn test_renderer_trait() {
        let m = model();
        let laid_out = m.with_layout(&PipelineLayout::new().arrange(&m));
        let encoder = BpmnEncoder::new();
        assert_eq!(encoder.name(), "bpmn-xml");
        assert_eq!(encoder.format(), "bpmn");
        let xml = encoder.render(&laid_out).unwrap();
        assert!(xml.contains("<dc:Bounds x=\"100\" y=\"122\" width=\"36\" height=\"36\" />"));
    }

    #[test]
    fn test_empty_process_id_rejected() {
        let m = DiagramModel::default();
        assert!(BpmnEncoder::new().encode(&m, &DiagramLayout::default()).is_err());
    }
}
