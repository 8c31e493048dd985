//! Core type definitions for diagram processing
//!
//! This module contains the fundamental types used throughout Swimlane:
//! node kinds, geometry primitives, and the node/edge/lane data structures
//! that make up a process diagram.

use std::fmt;

/// The closed set of BPMN flow elements Swimlane understands
///
/// Every stage of the pipeline (layout, encoding, decoding, rendering)
/// matches on this enum exhaustively, so adding a kind is a compile error
/// everywhere it has to be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `startEvent`: the trigger of the process
    StartEvent,
    /// `endEvent`: the terminal state
    EndEvent,
    /// `userTask`: an activity performed by a participant
    UserTask,
    /// `exclusiveGateway`: exactly one outgoing path is taken
    ExclusiveGateway,
    /// `parallelGateway`: all outgoing paths are taken
    ParallelGateway,
}

impl NodeKind {
    /// All kinds, in pipeline order
    pub const ALL: [NodeKind; 5] = [
        NodeKind::StartEvent,
        NodeKind::UserTask,
        NodeKind::ExclusiveGateway,
        NodeKind::ParallelGateway,
        NodeKind::EndEvent,
    ];

    /// Local XML element name (without namespace prefix)
    pub fn element_name(&self) -> &'static str {
        match self {
            NodeKind::StartEvent => "startEvent",
            NodeKind::EndEvent => "endEvent",
            NodeKind::UserTask => "userTask",
            NodeKind::ExclusiveGateway => "exclusiveGateway",
            NodeKind::ParallelGateway => "parallelGateway",
        }
    }

    /// Resolve a local element name back to a kind
    pub fn from_element_name(name: &str) -> Option<Self> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.element_name() == name)
    }

    /// Default bounds for this kind, in logical units
    pub fn default_size(&self) -> Size {
        match self {
            NodeKind::StartEvent | NodeKind::EndEvent => Size::new(36.0, 36.0),
            NodeKind::UserTask => Size::new(100.0, 80.0),
            NodeKind::ExclusiveGateway | NodeKind::ParallelGateway => Size::new(50.0, 50.0),
        }
    }

    /// Returns true for start and end events
    pub fn is_event(&self) -> bool {
        matches!(self, NodeKind::StartEvent | NodeKind::EndEvent)
    }

    /// Returns true for exclusive and parallel gateways
    pub fn is_gateway(&self) -> bool {
        matches!(self, NodeKind::ExclusiveGateway | NodeKind::ParallelGateway)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element_name())
    }
}

/// A point in diagram space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with its origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.center_y())
    }

    /// Right-middle point, where outgoing flows leave
    pub fn right_middle(&self) -> Point {
        Point::new(self.right(), self.center_y())
    }

    /// Left-middle point, where incoming flows arrive
    pub fn left_middle(&self) -> Point {
        Point::new(self.x, self.center_y())
    }

    /// Smallest rectangle containing both
    pub fn merge(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow by `margin` on every side
    pub fn pad(&self, margin: f64) -> Bounds {
        Bounds::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// True when every component is finite, the origin is non-negative and
    /// the box has a positive area
    pub fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// A flow node in the diagram with all its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for the node
    pub id: String,
    /// Display name
    pub name: String,
    /// BPMN element kind
    pub kind: NodeKind,
    /// Id of the lane that owns this node
    pub lane: String,
    /// Position and size, zeroed until laid out
    pub bounds: Bounds,
}

impl Node {
    /// Create an unpositioned node with the default size for its kind
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        lane: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            lane: lane.into(),
            bounds: Bounds::from_size(Point::default(), kind.default_size()),
        }
    }

    /// Builder-style override of the bounds
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }
}

/// A sequence flow connecting two nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: String,
    /// Optional label shown on the flow (e.g. `YES`)
    pub name: Option<String>,
    pub source_ref: String,
    pub target_ref: String,
    /// Guard expression for flows leaving a gateway
    pub condition: Option<String>,
}

impl Edge {
    /// Create an unlabeled, unconditional flow
    pub fn new(
        id: impl Into<String>,
        source_ref: impl Into<String>,
        target_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            condition: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A participant / swimlane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    pub id: String,
    pub name: String,
    /// Id of the process this participant executes
    pub process_ref: String,
}

impl Lane {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        process_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            process_ref: process_ref.into(),
        }
    }
}
