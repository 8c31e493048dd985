//! Plugin implementations for the supported diagram types
//!
//! Each plugin implements the core traits for its diagram type. The
//! orchestrator wires plugins into the generation and import pipelines.

pub mod bpmn;
pub mod orchestrator;

pub use orchestrator::*;
