//! Core detector trait for document type identification
//!
//! This trait defines the interface for cheaply recognizing a document
//! format before committing to a full decode.

/// Core trait for document type detectors
///
/// # Example
/// ```
/// use swimlane::core::Detector;
/// use swimlane::plugins::bpmn::BpmnDetector;
///
/// let detector = BpmnDetector::new();
/// assert!(detector.detect(r#"<bpmn:definitions><bpmn:process id="P"/></bpmn:definitions>"#));
/// ```
pub trait Detector: Send + Sync {
    /// Detect if the input matches this document type
    fn detect(&self, input: &str) -> bool;

    /// Get the confidence level of the detection (0.0 to 1.0)
    fn confidence(&self, input: &str) -> f64;

    /// Get the document type name
    fn diagram_type(&self) -> &'static str;

    /// Get key patterns that this detector looks for
    fn patterns(&self) -> Vec<&'static str>;
}
