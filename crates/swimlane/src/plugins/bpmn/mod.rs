//! BPMN 2.0 process diagram plugin
//!
//! Builds process diagrams from structured input, lays them out as a
//! left-to-right pipeline, encodes and decodes BPMN 2.0 XML, validates and
//! repairs documents, and renders SVG.

use crate::core::{Detector, Diagram};
use std::sync::Arc;

mod builder;
mod decoder;
mod detector;
mod encoder;
mod layout;
mod model;
mod renderer;
mod scanner;
mod validator;

pub use builder::*;
pub use decoder::*;
pub use detector::*;
pub use encoder::*;
pub use layout::*;
pub use model::*;
pub use renderer::*;
pub use scanner::{local_name, TagScanner, Token};
pub use validator::*;

/// BPMN diagram implementation
pub struct BpmnDiagram;

impl Diagram for BpmnDiagram {
    type Database = DiagramModel;
    type Parser = BpmnDecoder;
    type Renderer = BpmnEncoder;

    fn detector() -> Arc<dyn Detector> {
        Arc::new(BpmnDetector::new())
    }

    fn create_parser() -> Self::Parser {
        BpmnDecoder::new()
    }

    fn create_database() -> Self::Database {
        DiagramModel::default()
    }

    fn create_renderer() -> Self::Renderer {
        BpmnEncoder::new()
    }

    fn name() -> &'static str {
        "bpmn"
    }

    fn version() -> &'static str {
        "0.1.0"
    }
}
