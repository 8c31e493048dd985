//! BPMN detector implementation
//!
//! Cheap textual check for BPMN 2.0 XML before committing to a decode.

use crate::core::Detector;
use tracing::{debug, trace};

/// BPMN 2.0 semantic model namespace
pub const BPMN_MODEL_NAMESPACE: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";

// Flow elements the decoder understands
const FLOW_ELEMENTS: [&str; 6] = [
    "startEvent",
    "endEvent",
    "userTask",
    "exclusiveGateway",
    "parallelGateway",
    "sequenceFlow",
];

const DETECTION_THRESHOLD: f64 = 0.2;

/// Count start tags with the given local name, prefixed or not
fn element_count(input: &str, local: &str) -> usize {
    let mut count = 0;
    for (idx, _) in input.match_indices(local) {
        let before = input[..idx].chars().next_back();
        let after = input[idx + local.len()..].chars().next();
        let head_ok = match before {
            Some('<') => true,
            // `<prefix:local`
            Some(':') => input[..idx - 1]
                .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '.'))
                .map(|start| input[start..].starts_with('<'))
                .unwrap_or(false),
            _ => false,
        };
        let tail_ok = matches!(after, Some(c) if c.is_whitespace() || c == '>' || c == '/');
        if head_ok && tail_ok {
            count += 1;
        }
    }
    count
}

/// BPMN detector implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct BpmnDetector;

impl BpmnDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for BpmnDetector {
    fn detect(&self, input: &str) -> bool {
        trace!(input_len = input.len(), "BpmnDetector::detect called");
        if !input.contains('<') {
            debug!("No markup, detection failed");
            return false;
        }
        let confidence = self.confidence(input);
        debug!(confidence, "BPMN detection scored");
        confidence >= DETECTION_THRESHOLD
    }

    fn confidence(&self, input: &str) -> f64 {
        let input = input.trim();
        if input.is_empty() || !input.contains('<') {
            return 0.0;
        }

        let mut score: f64 = 0.0;
        if input.contains(BPMN_MODEL_NAMESPACE) {
            score += 0.4;
        }
        if element_count(input, "definitions") > 0 {
            score += 0.3;
        }
        if element_count(input, "process") > 0 {
            score += 0.2;
        }
        let flow_count: usize = FLOW_ELEMENTS
            .iter()
            .map(|name| element_count(input, name))
            .sum();
        score += 0.05 * (flow_count as f64).min(4.0);

        score.min(1.0)
    }

    fn diagram_type(&self) -> &'static str {
        "bpmn"
    }

    fn patterns(&self) -> Vec<&'static str> {
        let mut patterns = vec![BPMN_MODEL_NAMESPACE, "definitions", "process"];
        patterns.extend(FLOW_ELEMENTS);
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_prefixed_and_plain_documents() {
        let detector = BpmnDetector::new();
        assert!(detector.detect(
            r#"<bpmn2:definitions xmlns:bpmn2="http://www.omg.org/spec/BPMN/20100524/MODEL"><bpmn2:process id="P"/></bpmn2:definitions>"#
        ));
        assert!(detector.detect("<definitions><process id=\"P\"><startEvent id=\"S\"/></process></definitions>"));
        assert!(detector.detect("<process id=\"P\"><userTask id=\"T\"/></process>"));
    }

    #[test]
    fn test_rejects_unrelated_content() {
        let detector = BpmnDetector::new();
        assert!(!detector.detect(""));
        assert!(!detector.detect("graph LR; A-->B"));
        assert!(!detector.detect("the process definitions were lost"));
        assert!(!detector.detect("<html><body><p>process</p></body></html>"));
        assert_eq!(detector.confidence("no markup at all"), 0.0);
    }

    #[test]
    fn test_confidence_grows_with_indicators() {
        let detector = BpmnDetector::new();
        let bare = "<process id=\"P\"/>";
        let full = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL">
  <bpmn:process id="P">
    <bpmn:startEvent id="S"/><bpmn:userTask id="T"/><bpmn:endEvent id="E"/>
    <bpmn:sequenceFlow id="F" sourceRef="S" targetRef="T"/>
  </bpmn:process>
</bpmn:definitions>"#;
        assert!(detector.confidence(full) > detector.confidence(bare));
        assert!(detector.confidence(full) > 0.9);
        assert!(detector.confidence(full) <= 1.0);
    }

    #[test]
    fn test_element_count_needs_tag_boundaries() {
        assert_eq!(element_count("<process>", "process"), 1);
        assert_eq!(element_count("<a:process id=\"x\">", "process"), 1);
        assert_eq!(element_count("<processing/>", "process"), 0);
        assert_eq!(element_count("processRef=\"process\"", "process"), 0);
        assert_eq!(element_count("x:process ", "process"), 0);
    }

    #[test]
    fn test_diagram_type() {
        assert_eq!(BpmnDetector::new().diagram_type(), "bpmn");
        assert!(BpmnDetector::new().patterns().contains(&"sequenceFlow"));
    }
}
