//! Core renderer trait for diagram output
//!
//! This trait defines the interface for rendering diagram data into an
//! output format (BPMN XML, SVG).

use anyhow::Result;

use super::Database;

/// Core trait for diagram renderers
///
/// Renderers are pure: the same database always yields the same output.
pub trait Renderer<D: Database>: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render the diagram database into the output format
    fn render(&self, database: &D) -> Result<Self::Output>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the version of this renderer
    fn version(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
