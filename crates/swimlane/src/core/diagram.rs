//! Core diagram trait tying one diagram type's components together

use super::{Database, Detector, Parser, Renderer};
use std::sync::Arc;

/// Core trait for diagram types
///
/// # Example
/// ```
/// use swimlane::core::Diagram;
/// use swimlane::plugins::bpmn::BpmnDiagram;
///
/// assert_eq!(BpmnDiagram::name(), "bpmn");
/// ```
pub trait Diagram: Send + Sync {
    /// The specific database type for this diagram
    type Database: Database + Send + Sync;

    /// The parser type for this diagram
    type Parser: Parser<Self::Database> + Send + Sync;

    /// The renderer type for this diagram
    type Renderer: Renderer<Self::Database> + Send + Sync;

    /// Get the detector for this diagram type
    fn detector() -> Arc<dyn Detector>;

    /// Create a new parser instance
    fn create_parser() -> Self::Parser;

    /// Create a new database instance
    fn create_database() -> Self::Database;

    /// Create a new renderer instance
    fn create_renderer() -> Self::Renderer;

    /// Get the name of this diagram type
    fn name() -> &'static str;

    /// Get the version of this diagram type
    fn version() -> &'static str;
}
