//! Core error types for diagram processing
//!
//! This module defines the error type for operations that genuinely fail,
//! and the typed warnings that structural recovery reports instead of failing.

use std::fmt;

use thiserror::Error;

/// Core error types for diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Parse error: {message} at offset {offset}")]
    ParseError { message: String, offset: usize },

    #[error("Layout error: {message}")]
    LayoutError { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Encode error: {message}")]
    EncodeError { message: String },

    #[error("Detection error: {message}")]
    DetectionError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Unrecognized document: no BPMN flow elements found")]
    Unrecognized,
}

impl DiagramError {
    /// Create a new parse error
    pub fn parse_error(message: String, offset: usize) -> Self {
        Self::ParseError { message, offset }
    }

    /// Create a new layout error
    pub fn layout_error(message: String) -> Self {
        Self::LayoutError { message }
    }

    /// Create a new render error
    pub fn render_error(message: String) -> Self {
        Self::RenderError { message }
    }

    /// Create a new database error
    pub fn database_error(message: String) -> Self {
        Self::DatabaseError { message }
    }

    /// Create a new encode error
    pub fn encode_error(message: String) -> Self {
        Self::EncodeError { message }
    }

    /// Create a new detection error
    pub fn detection_error(message: String) -> Self {
        Self::DetectionError { message }
    }

    /// Error for an id that is already present in a model
    pub fn duplicate_id(id: &str) -> Self {
        Self::database_error(format!("duplicate id '{}'", id))
    }
}

/// Structural problems recovered locally instead of failing the operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramWarning {
    /// A flow references a node that does not exist; the flow was dropped
    UnresolvedEdge { edge_id: String, missing_ref: String },
    /// A gateway has no outgoing flows
    DanglingGateway { node_id: String },
    /// A node names a lane the diagram does not contain
    UnknownLane { node_id: String, lane_id: String },
    /// A second element reused an id; the first one was kept
    DuplicateElement { id: String },
    /// A tag could not be read or lacked a required attribute
    MalformedTag { offset: usize },
    /// Embedded coordinates were present but not usable for every node
    IgnoredCoordinates { reason: String },
}

impl fmt::Display for DiagramWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramWarning::UnresolvedEdge {
                edge_id,
                missing_ref,
            } => write!(
                f,
                "flow '{}' references unknown node '{}'",
                edge_id, missing_ref
            ),
            DiagramWarning::DanglingGateway { node_id } => {
                write!(f, "gateway '{}' has no outgoing flows", node_id)
            }
            DiagramWarning::UnknownLane { node_id, lane_id } => {
                write!(f, "node '{}' is in unknown lane '{}'", node_id, lane_id)
            }
            DiagramWarning::DuplicateElement { id } => {
                write!(f, "duplicate element id '{}'", id)
            }
            DiagramWarning::MalformedTag { offset } => {
                write!(f, "malformed tag at offset {}", offset)
            }
            DiagramWarning::IgnoredCoordinates { reason } => {
                write!(f, "embedded coordinates ignored: {}", reason)
            }
        }
    }
}
