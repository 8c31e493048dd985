//! Swimlane - Build, encode, decode and view BPMN 2.0 process diagrams
//!
//! Turns a structured process description into a laid-out BPMN 2.0 XML
//! document, validates and repairs documents produced elsewhere, decodes
//! them back into a diagram model and renders that model as SVG behind an
//! interactive viewport.
//!
//! # Quick Start
//!
//! ```rust
//! use swimlane::{generate, ProcessInput, RunToken};
//!
//! let input = ProcessInput {
//!     process_name: "Request Review".to_string(),
//!     participants: vec!["Manager".to_string()],
//!     activities: vec!["Review Request".to_string()],
//!     ..Default::default()
//! };
//! let generated = generate(&input, RunToken::from(1)).unwrap();
//! assert!(generated.xml.starts_with("<?xml"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual components:
//!
//! ```rust
//! use swimlane::prelude::*;
//!
//! let input = ProcessInput {
//!     activities: vec!["Pack".to_string(), "Ship".to_string()],
//!     ..Default::default()
//! };
//!
//! // Build the topology
//! let mut ids = IdAllocator::new(RunToken::from(9));
//! let model = ProcessBuilder::new().build(&input, &mut ids).unwrap();
//! assert_eq!(model.node_count(), 4);
//!
//! // Lay it out and encode
//! let layout = PipelineLayout::new().layout(&model).unwrap();
//! let xml = BpmnEncoder::with_token(RunToken::from(9))
//!     .encode(&model, &layout)
//!     .unwrap();
//! assert!(validate(&xml).ok());
//!
//! // Decode and view
//! let decoded = BpmnDecoder::new().decode(&xml);
//! let mut session = ViewerSession::new(800.0, 600.0);
//! session.load(decoded.into_model().unwrap());
//! let svg = session.render_svg();
//! assert!(svg.contains("Pack"));
//! ```

pub mod core;
pub mod plugins;
pub mod viewer;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use core::*;
pub use plugins::bpmn::{Decoded, DiagramModel, ProcessInput, ValidationReport};
pub use plugins::{AcceptDecision, Accepted, Generated};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        Bounds, Database, Detector, DiagramError, DiagramWarning, Edge, IdAllocator,
        LayoutAlgorithm, Lane, Node, NodeKind, Parser, Point, Renderer, RunToken, Size,
    };
    pub use crate::plugins::bpmn::{
        repair, validate, BpmnDecoder, BpmnDetector, BpmnEncoder, Decoded, DiagramLayout,
        DiagramModel, LayoutConfig, PipelineLayout, ProcessBuilder, ProcessInput,
        RenderConfig, SvgRenderer,
    };
    pub use crate::plugins::Orchestrator;
    pub use crate::viewer::{ViewerEvent, ViewerSession, ViewportConfig, ViewportState};
}

/// Generate a validated BPMN document from a process description
///
/// Ids carry `token`, so two runs with different tokens never share an id.
///
/// # Example
/// ```rust
/// use swimlane::{generate, ProcessInput, RunToken};
///
/// let input = ProcessInput {
///     decision_points: vec!["Approved?".to_string()],
///     ..Default::default()
/// };
/// let generated = generate(&input, RunToken::from(5)).unwrap();
/// assert!(generated.xml.contains("exclusiveGateway"));
/// assert!(!generated.regenerated);
/// ```
pub fn generate(input: &ProcessInput, token: RunToken) -> anyhow::Result<Generated> {
    plugins::Orchestrator::with_bpmn_plugins().generate(input, token)
}

/// Decode a BPMN document tolerantly
///
/// # Example
/// ```rust
/// use swimlane::decode;
///
/// assert!(decode("not xml").model().is_none());
/// ```
pub fn decode(xml: &str) -> Decoded {
    plugins::Orchestrator::with_bpmn_plugins().import(xml)
}

/// Check a BPMN document's structure without decoding it
pub fn validate(xml: &str) -> ValidationReport {
    plugins::bpmn::validate(xml)
}

/// Decode a BPMN document and render it as SVG fitted into a canvas
///
/// # Example
/// ```rust
/// use swimlane::{generate, render_svg, ProcessInput, RunToken};
///
/// let generated = generate(&ProcessInput::default(), RunToken::from(2)).unwrap();
/// let svg = render_svg(&generated.xml, 640.0, 480.0).unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
pub fn render_svg(xml: &str, width: f64, height: f64) -> anyhow::Result<String> {
    let mut session = viewer::ViewerSession::new(width, height);
    plugins::Orchestrator::with_bpmn_plugins().import_for_viewing(xml, &mut session)?;
    Ok(session.render_svg())
}
