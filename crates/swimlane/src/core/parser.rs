//! Core parser trait for diagram markup
//!
//! This trait defines the interface for reading diagram markup into a
//! database.

use anyhow::Result;

use super::Database;

/// Core trait for diagram parsers
///
/// # Example
/// ```
/// use swimlane::core::{Database, Parser};
/// use swimlane::plugins::bpmn::{BpmnDecoder, DiagramModel};
///
/// let xml = r#"<definitions><process id="P"><startEvent id="S"/></process></definitions>"#;
/// let mut model = DiagramModel::default();
/// BpmnDecoder::new().parse(xml, &mut model).unwrap();
/// assert_eq!(model.node_count(), 1);
/// ```
pub trait Parser<D: Database>: Send + Sync {
    /// Parse diagram markup into the provided database
    fn parse(&self, input: &str, database: &mut D) -> Result<()>;

    /// Get the name of this parser
    fn name(&self) -> &'static str;

    /// Get the version of this parser
    fn version(&self) -> &'static str;

    /// Check if the input can be parsed by this parser
    fn can_parse(&self, input: &str) -> bool;
}
