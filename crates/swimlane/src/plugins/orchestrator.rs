//! Plugin orchestrator for coordinating the diagram processing pipelines
//!
//! Generation: Builder → Layout → Encoder → Validator (regenerate on fatal).
//! Import: Validator → Repair or Regenerate → Decoder → Viewer Session.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{
    Detector, DiagramError, DiagramWarning, IdAllocator, LayoutAlgorithm, RunToken,
};
use crate::plugins::bpmn::{
    repair, validate, BpmnDecoder, BpmnDetector, BpmnEncoder, Decoded, DiagramLayout,
    DiagramModel, PipelineLayout, ProcessBuilder, ProcessInput, ValidationIssue,
};
use crate::viewer::ViewerSession;

/// Output of [`Orchestrator::generate`]
#[derive(Debug, Clone)]
pub struct Generated {
    pub xml: String,
    /// The built model carrying its layout coordinates
    pub model: DiagramModel,
    pub layout: DiagramLayout,
    pub warnings: Vec<DiagramWarning>,
    /// True when the first document failed validation and was rebuilt
    pub regenerated: bool,
}

/// What happened to an externally generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptDecision {
    AsIs,
    Repaired,
    Regenerated,
}

impl fmt::Display for AcceptDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptDecision::AsIs => write!(f, "as-is"),
            AcceptDecision::Repaired => write!(f, "repaired"),
            AcceptDecision::Regenerated => write!(f, "regenerated"),
        }
    }
}

/// Output of [`Orchestrator::accept_candidate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub xml: String,
    pub decision: AcceptDecision,
    /// Issues still present in `xml`
    pub residual: Vec<ValidationIssue>,
}

/// Plugin orchestrator that coordinates the entire pipeline
pub struct Orchestrator {
    detectors: HashMap<String, Box<dyn Detector>>,
    builder: ProcessBuilder,
    layout: PipelineLayout,
    decoder: BpmnDecoder,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::with_bpmn_plugins()
    }
}

impl Orchestrator {
    /// Create an orchestrator with no detectors registered
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
            builder: ProcessBuilder::new(),
            layout: PipelineLayout::new(),
            decoder: BpmnDecoder::new(),
        }
    }

    /// Create an orchestrator with the BPMN detector registered
    pub fn with_bpmn_plugins() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register_detector("bpmn".to_string(), Box::new(BpmnDetector::new()));
        orchestrator
    }

    /// Use a custom layout for generation and for decoded documents
    /// without usable coordinates
    pub fn with_layout(mut self, layout: PipelineLayout) -> Self {
        self.decoder = BpmnDecoder::with_layout_config(layout.config().clone());
        self.layout = layout;
        self
    }

    /// Register a detector plugin
    pub fn register_detector(&mut self, name: String, detector: Box<dyn Detector>) {
        self.detectors.insert(name, detector);
    }

    /// Get available detector names
    pub fn get_detectors(&self) -> Vec<String> {
        self.detectors.keys().cloned().collect()
    }

    /// Detect the document type of `input`
    pub fn detect_diagram_type(&self, input: &str) -> Result<String> {
        let detect_span = span!(Level::INFO, "detect_diagram_type", input_len = input.len());
        let _enter = detect_span.enter();

        for (name, detector) in &self.detectors {
            let confidence = detector.confidence(input);
            trace!(detector = name, confidence, "Checking detector");
            if detector.detect(input) {
                info!(detector = name, confidence, "Detected diagram type");
                return Ok(name.clone());
            }
        }

        warn!("No suitable detector found for input");
        Err(DiagramError::detection_error("no suitable detector found for input".to_string()).into())
    }

    fn build_once(&self, input: &ProcessInput, token: RunToken) -> Result<Generated> {
        let mut ids = IdAllocator::new(token);
        let model = self.builder.build(input, &mut ids)?;
        let layout = self.layout.layout(&model)?;

        let mut warnings = model.integrity_warnings();
        for warning in &layout.warnings {
            if !warnings.contains(warning) {
                warnings.push(warning.clone());
            }
        }

        let positioned = model.with_layout(&layout);
        let xml = BpmnEncoder::with_token(token).encode(&positioned, &layout)?;
        Ok(Generated {
            xml,
            model: positioned,
            layout,
            warnings,
            regenerated: false,
        })
    }

    /// Build, lay out, encode and validate a process
    ///
    /// A document that fails validation fatally is rebuilt once with a
    /// fresh allocator; a second failure is an error.
    pub fn generate(&self, input: &ProcessInput, token: RunToken) -> Result<Generated> {
        let generate_span = span!(Level::INFO, "generate_process", token = token.value());
        let _enter = generate_span.enter();

        let generated = self.build_once(input, token)?;
        let report = validate(&generated.xml);
        if !report.is_fatal() {
            for issue in &report.issues {
                warn!(%issue, "Generated document has a validation issue");
            }
            info!(
                output_len = generated.xml.len(),
                warning_count = generated.warnings.len(),
                "Generation completed"
            );
            return Ok(generated);
        }

        warn!(%report, "Generated document failed validation, regenerating");
        let retry_token = RunToken::from(token.value().wrapping_add(1));
        let mut regenerated = self.build_once(input, retry_token)?;
        let retry_report = validate(&regenerated.xml);
        if retry_report.is_fatal() {
            return Err(DiagramError::encode_error(format!(
                "regenerated document is still invalid: {}",
                retry_report
            ))
            .into());
        }
        regenerated.regenerated = true;
        Ok(regenerated)
    }

    /// Decide what to do with a document produced by an external generator
    ///
    /// Fatal issues regenerate from `input`, other issues are repaired in
    /// place, a clean document passes through untouched.
    pub fn accept_candidate(
        &self,
        candidate: &str,
        input: &ProcessInput,
        token: RunToken,
    ) -> Result<Accepted> {
        let accept_span = span!(Level::INFO, "accept_candidate", input_len = candidate.len());
        let _enter = accept_span.enter();

        let report = validate(candidate);
        if report.ok() {
            debug!("Candidate accepted as-is");
            return Ok(Accepted {
                xml: candidate.to_string(),
                decision: AcceptDecision::AsIs,
                residual: Vec::new(),
            });
        }

        if report.is_fatal() {
            warn!(%report, "Candidate has fatal issues, regenerating");
            let generated = self.generate(input, token)?;
            let residual = validate(&generated.xml).issues;
            return Ok(Accepted {
                xml: generated.xml,
                decision: AcceptDecision::Regenerated,
                residual,
            });
        }

        let repaired = repair(candidate);
        info!(
            patch_count = repaired.patches.len(),
            residual_count = repaired.residual.len(),
            "Candidate repaired"
        );
        Ok(Accepted {
            xml: repaired.xml,
            decision: AcceptDecision::Repaired,
            residual: repaired.residual,
        })
    }

    /// Decode a document
    pub fn import(&self, xml: &str) -> Decoded {
        let import_span = span!(Level::INFO, "import_document", input_len = xml.len());
        let _enter = import_span.enter();

        let report = validate(xml);
        for issue in &report.issues {
            debug!(%issue, "Imported document validation issue");
        }
        self.decoder.decode(xml)
    }

    /// Decode a document and show it in `session`
    ///
    /// Returns the decode warnings. A document with nothing recognizable
    /// leaves the session untouched and is an error.
    pub fn import_for_viewing(
        &self,
        xml: &str,
        session: &mut ViewerSession,
    ) -> Result<Vec<DiagramWarning>> {
        match self.import(xml) {
            Decoded::Diagram { model, warnings } => {
                for warning in &warnings {
                    warn!(%warning, "Import warning");
                }
                session.load(model);
                Ok(warnings)
            }
            Decoded::Unrecognized => {
                warn!("Nothing recognizable to view");
                Err(DiagramError::Unrecognized.into())
            }
        }
    }
}
