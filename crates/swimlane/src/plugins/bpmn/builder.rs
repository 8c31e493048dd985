//! Process builder
//!
//! Turns a structured process description into a [`DiagramModel`] with a
//! fixed topology: start event, user tasks, decision gateways, end event.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, Level};

use crate::core::{Database, Edge, IdAllocator, IdKind, Lane, Node, NodeKind};

use super::DiagramModel;

/// Default start event name when no trigger is given
pub const DEFAULT_TRIGGER: &str = "Process starts";
/// Default end event name when none is given
pub const DEFAULT_END_EVENT: &str = "Process completes";
/// Name used for the process and its lane when the input names neither
pub const DEFAULT_PROCESS_NAME: &str = "Process";

/// Guard on the branch taken when a decision holds
pub const YES_CONDITION: &str = "${condition == true}";
/// Guard on the branch taken when a decision fails
pub const NO_CONDITION: &str = "${condition == false}";

/// Structured process description, as JSON (`camelCase`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessInput {
    pub process_name: String,
    pub process_description: String,
    pub participants: Vec<String>,
    pub trigger: String,
    pub activities: Vec<String>,
    pub decision_points: Vec<String>,
    pub end_event: String,
}

fn non_blank(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    match value.trim() {
        "" => default,
        trimmed => trimmed,
    }
}

/// Builds the process topology; positions are left to the layout engine
#[derive(Debug, Clone, Default)]
pub struct ProcessBuilder;

impl ProcessBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a model from `input`, minting every id from `ids`
    pub fn build(&self, input: &ProcessInput, ids: &mut IdAllocator) -> Result<DiagramModel> {
        let build_span = span!(
            Level::INFO,
            "build_process",
            activities = input.activities.len(),
            decisions = input.decision_points.len(),
            participants = input.participants.len()
        );
        let _enter = build_span.enter();

        let process_name = or_default(&input.process_name, DEFAULT_PROCESS_NAME);
        let mut model = DiagramModel::new(ids.allocate(IdKind::Process), process_name);
        model.set_documentation(input.process_description.trim());

        let participants = non_blank(&input.participants);
        let lane_names = if participants.is_empty() {
            vec![process_name]
        } else {
            participants
        };
        let process_id = model.process_id().to_string();
        let mut lane_ids = Vec::with_capacity(lane_names.len());
        for name in lane_names {
            let id = ids.allocate(IdKind::Participant);
            model.add_lane(Lane::new(&id, name, &process_id))?;
            lane_ids.push(id);
        }
        let first_lane = lane_ids[0].clone();
        let last_lane = lane_ids[lane_ids.len() - 1].clone();

        let start_id = ids.allocate(IdKind::StartEvent);
        model.add_node(Node::new(
            &start_id,
            or_default(&input.trigger, DEFAULT_TRIGGER),
            NodeKind::StartEvent,
            &first_lane,
        ))?;

        // Pipeline: activities first, then decision points
        let mut pipeline: Vec<(String, NodeKind)> = Vec::new();
        let activities = non_blank(&input.activities);
        let decisions = non_blank(&input.decision_points);
        let elements = activities
            .iter()
            .map(|name| (*name, NodeKind::UserTask))
            .chain(decisions.iter().map(|name| (*name, NodeKind::ExclusiveGateway)));
        for (k, (name, kind)) in elements.enumerate() {
            let id_kind = if kind.is_gateway() {
                IdKind::Gateway
            } else {
                IdKind::Task
            };
            let id = ids.allocate(id_kind);
            let lane = &lane_ids[k % lane_ids.len()];
            model.add_node(Node::new(&id, name, kind, lane))?;
            pipeline.push((id, kind));
        }

        let end_id = ids.allocate(IdKind::EndEvent);
        model.add_node(Node::new(
            &end_id,
            or_default(&input.end_event, DEFAULT_END_EVENT),
            NodeKind::EndEvent,
            &last_lane,
        ))?;

        let target_ids: Vec<&str> = pipeline.iter().map(|(id, _)| id.as_str()).collect();
        let target_at = |k: usize| target_ids.get(k).copied().unwrap_or(end_id.as_str());
        model.add_edge(Edge::new(ids.allocate(IdKind::Flow), &start_id, target_at(0)))?;

        let mut flows = Vec::new();
        for (k, (id, kind)) in pipeline.iter().enumerate() {
            if kind.is_gateway() {
                let yes = target_at(k + 1);
                let mut no = target_at(k + 2);
                if yes == no && k > 0 {
                    // Rework loop back to the preceding element
                    no = target_ids[k - 1];
                }
                flows.push(
                    Edge::new(ids.allocate(IdKind::Flow), id, yes)
                        .with_name("YES")
                        .with_condition(YES_CONDITION),
                );
                flows.push(
                    Edge::new(ids.allocate(IdKind::Flow), id, no)
                        .with_name("NO")
                        .with_condition(NO_CONDITION),
                );
            } else {
                flows.push(Edge::new(ids.allocate(IdKind::Flow), id, target_at(k + 1)));
            }
        }
        for flow in flows {
            model.add_edge(flow)?;
        }

        debug!(
            lanes = model.lanes().len(),
            pipeline = pipeline.len(),
            "Topology built"
        );
        info!(
            node_count = model.node_count(),
            edge_count = model.edge_count(),
            "Process model built"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunToken;

    fn build(input: &ProcessInput) -> DiagramModel {
        let mut ids = IdAllocator::new(RunToken::from(1));
        ProcessBuilder::new().build(input, &mut ids).unwrap()
    }

    fn targets(model: &DiagramModel, id: &str) -> Vec<String> {
        model.outgoing(id).map(|e| e.target_ref.clone()).collect()
    }

    fn review_request() -> ProcessInput {
        ProcessInput {
            process_name: "Request Review".to_string(),
            participants: vec!["Manager".to_string()],
            trigger: "Request Submitted".to_string(),
            activities: vec!["Review Request".to_string(), "Approve".to_string()],
            decision_points: vec!["Is Valid?".to_string()],
            end_event: "Request Closed".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_review_request_topology() {
        let model = build(&review_request());
        assert_eq!(model.count_kind(NodeKind::StartEvent), 1);
        assert_eq!(model.count_kind(NodeKind::UserTask), 2);
        assert_eq!(model.count_kind(NodeKind::ExclusiveGateway), 1);
        assert_eq!(model.count_kind(NodeKind::EndEvent), 1);
        assert!(model.edge_count() >= 4);
        assert_eq!(model.out_degree("Gateway_1_1"), 2);
        assert_eq!(targets(&model, "StartEvent_1_1"), vec!["Task_1_1"]);
        assert_eq!(targets(&model, "Task_1_1"), vec!["Task_2_1"]);
        assert_eq!(targets(&model, "Task_2_1"), vec!["Gateway_1_1"]);
        // Both branches would reach the end, so NO loops back for rework
        assert_eq!(
            targets(&model, "Gateway_1_1"),
            vec!["EndEvent_1_1", "Task_2_1"]
        );
    }

    #[test]
    fn test_gateway_branches_labeled() {
        let model = build(&review_request());
        let branches: Vec<_> = model.outgoing("Gateway_1_1").collect();
        assert_eq!(branches[0].name.as_deref(), Some("YES"));
        assert_eq!(branches[0].condition.as_deref(), Some(YES_CONDITION));
        assert_eq!(branches[1].name.as_deref(), Some("NO"));
        assert_eq!(branches[1].condition.as_deref(), Some(NO_CONDITION));
    }

    #[test]
    fn test_no_branch_skips_next_element() {
        let input = ProcessInput {
            activities: vec!["A".to_string()],
            decision_points: vec!["First?".to_string(), "Second?".to_string()],
            ..Default::default()
        };
        let model = build(&input);
        // Pipeline: Task_1, Gateway_1, Gateway_2
        assert_eq!(
            targets(&model, "Gateway_1_1"),
            vec!["Gateway_2_1", "EndEvent_1_1"]
        );
        assert_eq!(
            targets(&model, "Gateway_2_1"),
            vec!["EndEvent_1_1", "Gateway_1_1"]
        );
    }

    #[test]
    fn test_zero_elements_connects_start_to_end() {
        let model = build(&ProcessInput::default());
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.edge_count(), 1);
        assert_eq!(targets(&model, "StartEvent_1_1"), vec!["EndEvent_1_1"]);
    }

    #[test]
    fn test_defaults_for_blank_fields() {
        let model = build(&ProcessInput {
            trigger: "  ".to_string(),
            ..Default::default()
        });
        assert_eq!(model.process_name(), DEFAULT_PROCESS_NAME);
        assert_eq!(model.get_node("StartEvent_1_1").unwrap().name, DEFAULT_TRIGGER);
        assert_eq!(model.get_node("EndEvent_1_1").unwrap().name, DEFAULT_END_EVENT);
        assert_eq!(model.lanes().len(), 1);
        assert_eq!(model.lanes()[0].name, DEFAULT_PROCESS_NAME);
    }

    #[test]
    fn test_default_lane_named_after_process() {
        let model = build(&ProcessInput {
            process_name: "Onboarding".to_string(),
            ..Default::default()
        });
        assert_eq!(model.lanes()[0].name, "Onboarding");
    }

    #[test]
    fn test_blank_entries_ignored() {
        let model = build(&ProcessInput {
            activities: vec!["Work".to_string(), " ".to_string(), String::new()],
            participants: vec![String::new()],
            ..Default::default()
        });
        assert_eq!(model.count_kind(NodeKind::UserTask), 1);
        assert_eq!(model.lanes().len(), 1);
    }

    #[test]
    fn test_round_robin_lanes() {
        let model = build(&ProcessInput {
            participants: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            activities: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            decision_points: vec!["4?".to_string()],
            ..Default::default()
        });
        let lane_of = |id: &str| model.get_node(id).unwrap().lane.clone();
        let lanes: Vec<String> = model.lanes().iter().map(|l| l.id.clone()).collect();
        assert_eq!(lane_of("StartEvent_1_1"), lanes[0]);
        assert_eq!(lane_of("Task_1_1"), lanes[0]);
        assert_eq!(lane_of("Task_2_1"), lanes[1]);
        assert_eq!(lane_of("Task_3_1"), lanes[2]);
        assert_eq!(lane_of("Gateway_1_1"), lanes[0]);
        assert_eq!(lane_of("EndEvent_1_1"), lanes[2]);
    }

    #[test]
    fn test_pipeline_insertion_order() {
        let model = build(&review_request());
        let kinds: Vec<NodeKind> = model.nodes().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::StartEvent,
                NodeKind::UserTask,
                NodeKind::UserTask,
                NodeKind::ExclusiveGateway,
                NodeKind::EndEvent,
            ]
        );
    }

    #[test]
    fn test_input_deserializes_camel_case() {
        let json = r#"{
            "processName": "Hiring",
            "processDescription": "Hire people",
            "participants": ["HR"],
            "trigger": "Opening",
            "activities": ["Interview"],
            "decisionPoints": ["Good fit?"],
            "endEvent": "Hired",
            "additionalElements": ["ignored"]
        }"#;
        let input: ProcessInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.process_name, "Hiring");
        assert_eq!(input.decision_points, vec!["Good fit?"]);
        assert_eq!(input.end_event, "Hired");
    }

    #[test]
    fn test_missing_fields_default() {
        let input: ProcessInput = serde_json::from_str(r#"{"activities": ["Only"]}"#).unwrap();
        assert!(input.participants.is_empty());
        assert_eq!(input.activities.len(), 1);
    }
}
