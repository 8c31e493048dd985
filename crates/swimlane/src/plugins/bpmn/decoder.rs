//! Tolerant BPMN 2.0 XML decoder
//!
//! Reads arbitrary text claiming to be BPMN 2.0 into a [`DiagramModel`]
//! without a schema-validating XML toolchain. The [`TagScanner`] produces
//! tokens, and an element builder collects the elements it recognizes by
//! local name, so `bpmn2:`, `bpmn:` and unprefixed documents all decode.
//!
//! Decoding runs in two passes: the first collects every element, the
//! second resolves flows, assigns lanes and decides between the embedded
//! coordinates and synthesized ones.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{
    Bounds, Database, Detector, DiagramError, DiagramWarning, Edge, Lane, Node, NodeKind, Parser,
};

use super::layout::{LayoutConfig, PipelineLayout};
use super::scanner::{local_name, TagScanner, Token};
use super::{BpmnDetector, DiagramModel};

/// Outcome of decoding a document
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// At least one flow node was recognized
    Diagram {
        model: DiagramModel,
        warnings: Vec<DiagramWarning>,
    },
    /// Nothing recognizable; distinct from an empty but valid diagram
    Unrecognized,
}

impl Decoded {
    pub fn model(&self) -> Option<&DiagramModel> {
        match self {
            Decoded::Diagram { model, .. } => Some(model),
            Decoded::Unrecognized => None,
        }
    }

    pub fn warnings(&self) -> &[DiagramWarning] {
        match self {
            Decoded::Diagram { warnings, .. } => warnings,
            Decoded::Unrecognized => &[],
        }
    }

    pub fn into_model(self) -> Option<DiagramModel> {
        match self {
            Decoded::Diagram { model, .. } => Some(model),
            Decoded::Unrecognized => None,
        }
    }
}

#[derive(Debug)]
struct RawNode {
    id: String,
    name: String,
    kind: NodeKind,
    process: Option<String>,
}

#[derive(Debug)]
struct RawFlow {
    id: String,
    name: Option<String>,
    source: String,
    target: String,
    condition: Option<String>,
}

#[derive(Debug)]
struct RawLane {
    id: String,
    name: String,
    process: Option<String>,
    refs: Vec<String>,
}

#[derive(Debug)]
struct RawParticipant {
    id: String,
    name: String,
    process_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Condition,
    FlowNodeRef,
    Documentation,
}

/// Everything the first pass found
#[derive(Debug, Default)]
struct Collected {
    process_id: Option<String>,
    process_name: Option<String>,
    documentation: Option<String>,
    nodes: Vec<RawNode>,
    flows: Vec<RawFlow>,
    lanes: Vec<RawLane>,
    participants: Vec<RawParticipant>,
    shapes: HashMap<String, Bounds>,
    seen_ids: HashSet<String>,
    warnings: Vec<DiagramWarning>,
}

impl Collected {
    /// Register an element id, warning on reuse
    fn claim(&mut self, id: &str) -> bool {
        if self.seen_ids.insert(id.to_string()) {
            true
        } else {
            warn!(id, "Duplicate element id, keeping the first");
            self.warnings
                .push(DiagramWarning::DuplicateElement { id: id.to_string() });
            false
        }
    }

    fn malformed(&mut self, offset: usize) {
        warn!(offset, "Skipping malformed or incomplete element");
        self.warnings.push(DiagramWarning::MalformedTag { offset });
    }
}

fn required<'t>(token: &'t Token<'_>, key: &str) -> Option<&'t str> {
    token.attr(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bounds(token: &Token<'_>) -> Bounds {
    let read = |key: &str| {
        token
            .attr(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    };
    Bounds::new(read("x"), read("y"), read("width"), read("height"))
}

fn current_lane(lanes: &[Option<usize>]) -> Option<usize> {
    lanes.last().copied().flatten()
}

/// Element builder over the token stream
fn collect(input: &str) -> Collected {
    let mut out = Collected::default();
    let mut stack: Vec<&str> = Vec::new();
    let mut current_process: Option<String> = None;
    let mut current_flow: Option<usize> = None;
    let mut lanes: Vec<Option<usize>> = Vec::new();
    let mut current_shape: Option<String> = None;
    let mut capture: Option<Capture> = None;
    let mut text = String::new();

    for token in TagScanner::new(input) {
        match &token {
            Token::Start {
                name,
                self_closing,
                offset,
                ..
            } => {
                let local = local_name(*name);
                let offset = *offset;
                match local {
                    "process" => match required(&token, "id") {
                        Some(id) => {
                            if out.process_id.is_none() {
                                out.process_id = Some(id.to_string());
                                out.process_name = token.attr("name").map(str::to_string);
                            }
                            current_process = Some(id.to_string());
                        }
                        None => out.malformed(offset),
                    },
                    "sequenceFlow" => {
                        match (
                            required(&token, "id"),
                            required(&token, "sourceRef"),
                            required(&token, "targetRef"),
                        ) {
                            (Some(id), Some(source), Some(target)) => {
                                if out.claim(id) {
                                    out.flows.push(RawFlow {
                                        id: id.to_string(),
                                        name: token
                                            .attr("name")
                                            .map(str::trim)
                                            .filter(|n| !n.is_empty())
                                            .map(str::to_string),
                                        source: source.to_string(),
                                        target: target.to_string(),
                                        condition: None,
                                    });
                                    if !self_closing {
                                        current_flow = Some(out.flows.len() - 1);
                                    }
                                }
                            }
                            _ => out.malformed(offset),
                        }
                    }
                    "conditionExpression" if current_flow.is_some() => {
                        capture = Some(Capture::Condition);
                        text.clear();
                    }
                    "participant" => match required(&token, "id") {
                        Some(id) => {
                            if out.claim(id) {
                                out.participants.push(RawParticipant {
                                    id: id.to_string(),
                                    name: token.attr("name").unwrap_or_default().to_string(),
                                    process_ref: required(&token, "processRef")
                                        .map(str::to_string),
                                });
                            }
                        }
                        None => out.malformed(offset),
                    },
                    "lane" => {
                        let index = match required(&token, "id") {
                            Some(id) if out.claim(id) => {
                                out.lanes.push(RawLane {
                                    id: id.to_string(),
                                    name: token.attr("name").unwrap_or_default().to_string(),
                                    process: current_process.clone(),
                                    refs: Vec::new(),
                                });
                                Some(out.lanes.len() - 1)
                            }
                            Some(_) => None,
                            None => {
                                out.malformed(offset);
                                None
                            }
                        };
                        // Child lane sets nest; refs belong to the innermost open lane
                        if !self_closing {
                            lanes.push(index);
                        }
                    }
                    "flowNodeRef" if current_lane(&lanes).is_some() => {
                        capture = Some(Capture::FlowNodeRef);
                        text.clear();
                    }
                    "documentation"
                        if stack.last() == Some(&"process") && out.documentation.is_none() =>
                    {
                        capture = Some(Capture::Documentation);
                        text.clear();
                    }
                    "BPMNShape" => {
                        current_shape = required(&token, "bpmnElement").map(str::to_string);
                    }
                    "Bounds" => {
                        if let Some(element) = &current_shape {
                            out.shapes
                                .entry(element.clone())
                                .or_insert_with(|| parse_bounds(&token));
                        }
                    }
                    other => {
                        if let Some(kind) = NodeKind::from_element_name(other) {
                            match required(&token, "id") {
                                Some(id) => {
                                    if out.claim(id) {
                                        trace!(id, %kind, "Collected node");
                                        out.nodes.push(RawNode {
                                            id: id.to_string(),
                                            name: token
                                                .attr("name")
                                                .unwrap_or_default()
                                                .trim()
                                                .to_string(),
                                            kind,
                                            process: current_process.clone(),
                                        });
                                    }
                                }
                                None => out.malformed(offset),
                            }
                        }
                    }
                }
                if !self_closing {
                    stack.push(local);
                }
            }
            Token::End { name } => {
                let local = local_name(*name);
                if let Some(pos) = stack.iter().rposition(|open| *open == local) {
                    stack.truncate(pos);
                }
                match local {
                    "process" => current_process = None,
                    "sequenceFlow" => current_flow = None,
                    "lane" => {
                        lanes.pop();
                    }
                    "BPMNShape" => current_shape = None,
                    "conditionExpression" | "flowNodeRef" | "documentation" => {
                        let value = text.trim().to_string();
                        match capture.take() {
                            Some(Capture::Condition) if !value.is_empty() => {
                                if let Some(flow) = current_flow.and_then(|i| out.flows.get_mut(i))
                                {
                                    flow.condition = Some(value);
                                }
                            }
                            Some(Capture::FlowNodeRef) if !value.is_empty() => {
                                if let Some(lane) =
                                    current_lane(&lanes).and_then(|i| out.lanes.get_mut(i))
                                {
                                    lane.refs.push(value);
                                }
                            }
                            Some(Capture::Documentation) if !value.is_empty() => {
                                out.documentation = Some(value);
                            }
                            _ => {}
                        }
                        text.clear();
                    }
                    _ => {}
                }
            }
            Token::Text(content) => {
                if capture.is_some() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(content);
                }
            }
            Token::Prolog => {}
            Token::Malformed { offset } => out.malformed(*offset),
        }
    }

    debug!(
        nodes = out.nodes.len(),
        flows = out.flows.len(),
        lanes = out.lanes.len(),
        participants = out.participants.len(),
        shapes = out.shapes.len(),
        "Collection pass completed"
    );
    out
}

/// Pipeline order: start events, then tasks and gateways as first seen,
/// then end events
fn pipeline_rank(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::StartEvent => 0,
        NodeKind::UserTask | NodeKind::ExclusiveGateway | NodeKind::ParallelGateway => 1,
        NodeKind::EndEvent => 2,
    }
}

/// Tolerant BPMN 2.0 XML decoder
#[derive(Debug, Clone, Default)]
pub struct BpmnDecoder {
    layout: PipelineLayout,
}

impl BpmnDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` when coordinates have to be synthesized
    pub fn with_layout_config(config: LayoutConfig) -> Self {
        Self {
            layout: PipelineLayout::with_config(config),
        }
    }

    /// Decode `input` into a positioned model
    pub fn decode(&self, input: &str) -> Decoded {
        let decode_span = span!(Level::INFO, "decode_bpmn", input_len = input.len());
        let _enter = decode_span.enter();

        let mut collected = collect(input);
        if collected.nodes.is_empty() {
            info!("No recognizable flow elements");
            return Decoded::Unrecognized;
        }
        let mut warnings = std::mem::take(&mut collected.warnings);

        let process_id = collected
            .process_id
            .clone()
            .or_else(|| {
                collected
                    .participants
                    .iter()
                    .find_map(|p| p.process_ref.clone())
            })
            .unwrap_or_else(|| "Process_1".to_string());
        let process_name = collected
            .process_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| {
                collected
                    .participants
                    .first()
                    .map(|p| p.name.clone())
                    .filter(|n| !n.trim().is_empty())
            })
            .unwrap_or_else(|| "Process".to_string());

        let mut model = DiagramModel::new(&process_id, &process_name);
        if let Some(documentation) = &collected.documentation {
            model.set_documentation(documentation.as_str());
        }

        let node_lanes = self.assign_lanes(&collected, &process_id, &mut model);

        let mut ordered: Vec<&RawNode> = collected.nodes.iter().collect();
        ordered.sort_by_key(|node| pipeline_rank(node.kind));

        for raw in &ordered {
            let lane = node_lanes.get(raw.id.as_str()).cloned().unwrap_or_default();
            let mut node = Node::new(&raw.id, &raw.name, raw.kind, lane);
            if let Some(bounds) = collected.shapes.get(&raw.id) {
                node.bounds = *bounds;
            }
            // Lane ids are claimed by the model too; a node reusing one is dropped
            if let Err(err) = model.add_node(node) {
                warn!(node_id = %raw.id, error = %err, "Dropping node");
                warnings.push(DiagramWarning::DuplicateElement { id: raw.id.clone() });
            }
        }

        for raw in &collected.flows {
            let mut edge = Edge::new(&raw.id, &raw.source, &raw.target);
            edge.name = raw.name.clone();
            edge.condition = raw.condition.clone();
            if let Err(err) = model.add_edge(edge) {
                warn!(edge_id = %raw.id, error = %err, "Dropping flow");
                warnings.push(DiagramWarning::DuplicateElement { id: raw.id.clone() });
            }
        }
        warnings.extend(model.prune_unresolved_edges());

        let usable = ordered
            .iter()
            .filter(|raw| {
                collected
                    .shapes
                    .get(&raw.id)
                    .map(|b| b.is_usable())
                    .unwrap_or(false)
            })
            .count();
        let model = if usable == model.node_count() {
            debug!("Using embedded coordinates");
            let layout = self.layout.route_existing(&model);
            warnings.extend(layout.warnings.iter().cloned());
            model
        } else {
            if collected.shapes.keys().any(|id| model.has_node(id)) {
                let reason = format!(
                    "{} of {} nodes carry usable bounds",
                    usable,
                    model.node_count()
                );
                warn!(%reason, "Synthesizing coordinates");
                warnings.push(DiagramWarning::IgnoredCoordinates { reason });
            }
            let layout = self.layout.arrange(&model);
            warnings.extend(layout.warnings.iter().cloned());
            model.with_layout(&layout)
        };

        info!(
            node_count = model.node_count(),
            edge_count = model.edge_count(),
            lane_count = model.lanes().len(),
            warning_count = warnings.len(),
            "Decoding completed"
        );
        Decoded::Diagram { model, warnings }
    }

    /// Add lanes to `model` and map every node id to its lane id
    ///
    /// Lane sets win over participants; with neither, one default lane
    /// holds everything.
    fn assign_lanes(
        &self,
        collected: &Collected,
        process_id: &str,
        model: &mut DiagramModel,
    ) -> HashMap<String, String> {
        let mut node_lanes: HashMap<String, String> = HashMap::new();
        let participant_ids: HashSet<&str> =
            collected.participants.iter().map(|p| p.id.as_str()).collect();

        let mut added: Vec<(String, Option<String>)> = Vec::new();
        if !collected.lanes.is_empty() {
            for raw in &collected.lanes {
                // Lanes written as `{participant}_lane` fold back onto the participant id
                let id = raw
                    .id
                    .strip_suffix("_lane")
                    .filter(|base| participant_ids.contains(base))
                    .unwrap_or(raw.id.as_str())
                    .to_string();
                let process = raw.process.clone().unwrap_or_else(|| process_id.to_string());
                if model.add_lane(Lane::new(&id, &raw.name, &process)).is_ok() {
                    for node_id in &raw.refs {
                        node_lanes.entry(node_id.clone()).or_insert_with(|| id.clone());
                    }
                    added.push((id, raw.process.clone()));
                }
            }
        } else if !collected.participants.is_empty() {
            for raw in &collected.participants {
                let process = raw
                    .process_ref
                    .clone()
                    .unwrap_or_else(|| process_id.to_string());
                if model.add_lane(Lane::new(&raw.id, &raw.name, &process)).is_ok() {
                    added.push((raw.id.clone(), raw.process_ref.clone()));
                }
            }
        }

        if added.is_empty() {
            let mut id = format!("{}_participant", process_id);
            while collected.seen_ids.contains(&id) {
                id.push('_');
            }
            let name = model.process_name().to_string();
            if model.add_lane(Lane::new(&id, &name, process_id)).is_ok() {
                added.push((id, None));
            }
        }

        // Unlisted nodes go to the first lane of their own process
        for node in &collected.nodes {
            if node_lanes.contains_key(&node.id) {
                continue;
            }
            let lane = added
                .iter()
                .find(|(_, process)| process.is_some() && *process == node.process)
                .or_else(|| added.first())
                .map(|(id, _)| id.clone());
            if let Some(lane) = lane {
                node_lanes.insert(node.id.clone(), lane);
            }
        }
        node_lanes
    }
}

impl Parser<DiagramModel> for BpmnDecoder {
    fn parse(&self, input: &str, database: &mut DiagramModel) -> Result<()> {
        match self.decode(input) {
            Decoded::Diagram { model, .. } => {
                *database = model;
                Ok(())
            }
            Decoded::Unrecognized => Err(DiagramError::Unrecognized.into()),
        }
    }

    fn name(&self) -> &'static str {
        "bpmn-xml"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn can_parse(&self, input: &str) -> bool {
        BpmnDetector::new().detect(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> (DiagramModel, Vec<DiagramWarning>) {
        match BpmnDecoder::new().decode(input) {
            Decoded::Diagram { model, warnings } => (model, warnings),
            Decoded::Unrecognized => panic!("expected a diagram"),
        }
    }

    const PLAIN: &str = r#"<?xml version="1.0"?>
<definitions>
  <process id="P1" name="Plain">
    <startEvent id="S" name="Go"/>
    <endEvent id="E" name="Stop"></endEvent>
    <userTask id="T" name="Work &amp; rest"/>
    <sequenceFlow id="F1" sourceRef="S" targetRef="T"/>
    <sequenceFlow id="F2" sourceRef="T" targetRef="E"/>
  </process>
</definitions>"#;

    #[test]
    fn test_unprefixed_document() {
        let (model, warnings) = decode(PLAIN);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(model.process_id(), "P1");
        assert_eq!(model.process_name(), "Plain");
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.edge_count(), 2);
        assert_eq!(model.get_node("T").unwrap().name, "Work & rest");
    }

    #[test]
    fn test_pipeline_order_end_events_last() {
        let (model, _) = decode(PLAIN);
        let ids: Vec<&str> = model.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["S", "T", "E"]);
        let s = model.get_node("S").unwrap().bounds;
        let t = model.get_node("T").unwrap().bounds;
        let e = model.get_node("E").unwrap().bounds;
        assert!(s.x < t.x && t.x < e.x);
    }

    #[test]
    fn test_default_lane_when_no_participants() {
        let (model, _) = decode(PLAIN);
        assert_eq!(model.lanes().len(), 1);
        assert_eq!(model.lanes()[0].name, "Plain");
        assert!(model.nodes().all(|n| n.lane == model.lanes()[0].id));
    }

    #[test]
    fn test_prefixed_with_condition_and_lanes() {
        let xml = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL">
  <bpmn:collaboration id="C"><bpmn:participant id="Pa" name="Pool" processRef="P"/></bpmn:collaboration>
  <bpmn:process id="P">
    <bpmn:laneSet id="LS">
      <bpmn:lane id="L1" name="Alice"><bpmn:flowNodeRef>S</bpmn:flowNodeRef></bpmn:lane>
      <bpmn:lane id="L2" name="Bob"><bpmn:flowNodeRef>G</bpmn:flowNodeRef></bpmn:lane>
    </bpmn:laneSet>
    <bpmn:startEvent id="S"/>
    <bpmn:parallelGateway id="G"/>
    <bpmn:sequenceFlow id="F" name="go" sourceRef="S" targetRef="G">
      <bpmn:conditionExpression xsi:type="bpmn:tFormalExpression"><![CDATA[${x > 1}]]></bpmn:conditionExpression>
    </bpmn:sequenceFlow>
  </bpmn:process>
</bpmn:definitions>"#;
        let (model, _) = decode(xml);
        assert_eq!(model.lanes().len(), 2);
        assert_eq!(model.get_node("S").unwrap().lane, "L1");
        assert_eq!(model.get_node("G").unwrap().lane, "L2");
        assert_eq!(model.get_node("G").unwrap().kind, NodeKind::ParallelGateway);
        let flow = model.edges().next().unwrap();
        assert_eq!(flow.name.as_deref(), Some("go"));
        assert_eq!(flow.condition.as_deref(), Some("${x > 1}"));
    }

    #[test]
    fn test_participants_used_without_lane_set() {
        let xml = r#"<definitions>
  <collaboration id="C">
    <participant id="A" name="Alpha" processRef="P"/>
    <participant id="B" name="Beta" processRef="Q"/>
  </collaboration>
  <process id="P"><startEvent id="S"/></process>
  <process id="Q"><endEvent id="E"/></process>
</definitions>"#;
        let (model, _) = decode(xml);
        assert_eq!(model.lanes().len(), 2);
        assert_eq!(model.get_node("S").unwrap().lane, "A");
        assert_eq!(model.get_node("E").unwrap().lane, "B");
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(BpmnDecoder::new().decode("hello world"), Decoded::Unrecognized);
        assert_eq!(
            BpmnDecoder::new().decode("<definitions><process id=\"P\"/></definitions>"),
            Decoded::Unrecognized
        );
        assert_eq!(BpmnDecoder::new().decode(""), Decoded::Unrecognized);
    }

    #[test]
    fn test_unresolved_flows_dropped_with_warning() {
        let xml = r#"<process id="P">
  <startEvent id="S"/>
  <sequenceFlow id="F" sourceRef="S" targetRef="Ghost"/>
</process>"#;
        let (model, warnings) = decode(xml);
        assert_eq!(model.edge_count(), 0);
        assert!(warnings.contains(&DiagramWarning::UnresolvedEdge {
            edge_id: "F".to_string(),
            missing_ref: "Ghost".to_string()
        }));
    }

    #[test]
    fn test_missing_id_and_duplicates_warn() {
        let xml = r#"<process id="P">
  <startEvent name="no id"/>
  <userTask id="T" name="first"/>
  <userTask id="T" name="second"/>
</process>"#;
        let (model, warnings) = decode(xml);
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.get_node("T").unwrap().name, "first");
        assert!(warnings
            .iter()
            .any(|w| matches!(w, DiagramWarning::MalformedTag { .. })));
        assert!(warnings.contains(&DiagramWarning::DuplicateElement {
            id: "T".to_string()
        }));
    }

    #[test]
    fn test_embedded_coordinates_used_when_complete() {
        let xml = r#"<definitions>
  <process id="P"><startEvent id="S"/><userTask id="T"/></process>
  <BPMNDiagram><BPMNPlane>
    <BPMNShape id="S_di" bpmnElement="S"><Bounds x="10" y="20" width="36" height="36"/></BPMNShape>
    <BPMNShape id="T_di" bpmnElement="T"><Bounds x="500" y="5" width="100" height="80"/></BPMNShape>
  </BPMNPlane></BPMNDiagram>
</definitions>"#;
        let (model, warnings) = decode(xml);
        assert!(warnings.is_empty(), "{:?}", warnings);
        assert_eq!(
            model.get_node("T").unwrap().bounds,
            Bounds::new(500.0, 5.0, 100.0, 80.0)
        );
    }

    #[test]
    fn test_partial_coordinates_ignored() {
        let xml = r#"<definitions>
  <process id="P"><startEvent id="S"/><userTask id="T"/></process>
  <BPMNShape bpmnElement="S"><Bounds x="-10" y="20" width="36" height="36"/></BPMNShape>
  <BPMNShape bpmnElement="T"><Bounds x="500" y="5" width="100" height="80"/></BPMNShape>
</definitions>"#;
        let (model, warnings) = decode(xml);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, DiagramWarning::IgnoredCoordinates { .. })));
        assert_eq!(model.get_node("S").unwrap().bounds.x, 100.0);
    }

    #[test]
    fn test_malformed_markup_does_not_abort() {
        let xml = r#"<process id="P"><startEvent id="S"/><userTask id=T/><endEvent id="E"/></process>"#;
        let (model, warnings) = decode(xml);
        assert_eq!(model.node_count(), 2);
        assert!(warnings.contains(&DiagramWarning::MalformedTag { offset: 36 }));
    }

    #[test]
    fn test_documentation_only_from_process() {
        let xml = r#"<process id="P">
  <userTask id="T"><documentation>Task-level note</documentation></userTask>
  <startEvent id="S"/>
</process>"#;
        let (model, _) = decode(xml);
        assert_eq!(model.documentation(), None);

        let xml = r#"<process id="P">
  <userTask id="T"><documentation>Task-level note</documentation></userTask>
  <documentation>Handles requests</documentation>
  <startEvent id="S"/>
</process>"#;
        let (model, _) = decode(xml);
        assert_eq!(model.documentation(), Some("Handles requests"));
    }

    #[test]
    fn test_nested_child_lane_set() {
        let xml = r#"<process id="P">
  <laneSet id="LS">
    <lane id="Outer" name="Outer">
      <flowNodeRef>S</flowNodeRef>
      <childLaneSet id="CLS">
        <lane id="Inner" name="Inner"><flowNodeRef>T</flowNodeRef></lane>
      </childLaneSet>
      <flowNodeRef>E</flowNodeRef>
    </lane>
    <lane id="Other" name="Other"/>
  </laneSet>
  <startEvent id="S"/>
  <userTask id="T"/>
  <endEvent id="E"/>
</process>"#;
        let (model, _) = decode(xml);
        assert_eq!(model.get_node("S").unwrap().lane, "Outer");
        assert_eq!(model.get_node("T").unwrap().lane, "Inner");
        assert_eq!(model.get_node("E").unwrap().lane, "Outer");
    }

    #[test]
    fn test_parser_trait() {
        let decoder = BpmnDecoder::new();
        let mut model = DiagramModel::default();
        decoder.parse(PLAIN, &mut model).unwrap();
        assert_eq!(model.node_count(), 3);
        assert!(decoder.parse("nothing here", &mut model).is_err());
        assert_eq!(decoder.name(), "bpmn-xml");
    }
}
