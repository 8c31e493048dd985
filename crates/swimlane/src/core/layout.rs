//! Core layout trait for diagram positioning
//!
//! A layout algorithm reads a database and returns positions as a separate
//! value; it never mutates the database it was given.

use anyhow::Result;

use super::Database;

/// Core trait for layout algorithms
///
/// # Example
/// ```
/// use swimlane::core::LayoutAlgorithm;
/// use swimlane::plugins::bpmn::{DiagramModel, PipelineLayout};
///
/// let model = DiagramModel::new("Process_1", "Empty");
/// let layout = PipelineLayout::new().layout(&model).unwrap();
/// assert!(layout.bounding_box.is_none());
/// ```
pub trait LayoutAlgorithm<D: Database>: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Compute positions for the elements in the database
    fn layout(&self, database: &D) -> Result<Self::Output>;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;

    /// Get the layout direction (LR, TB, etc.)
    fn direction(&self) -> &'static str;
}
