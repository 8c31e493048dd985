//! Pan, zoom, fit and drag state machine
//!
//! The controller is the only thing that mutates a [`ViewportState`]. Every
//! input is handled to completion; inputs that make no sense in the current
//! state are no-ops rather than errors.

use tracing::{debug, trace, warn};

use crate::core::{Point, Size};

/// What the pointer is doing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// `anchor` is the pointer position minus the pan at pointer-down
    Dragging { anchor: Point },
}

/// Current view transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub pan: Point,
    pub interaction: Interaction,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: Point::default(),
            interaction: Interaction::Idle,
        }
    }
}

impl ViewportState {
    pub fn is_dragging(&self) -> bool {
        matches!(self.interaction, Interaction::Dragging { .. })
    }

    /// SVG transform for the root group
    pub fn transform(&self) -> String {
        format!(
            "translate({} {}) scale({})",
            self.pan.x, self.pan.y, self.scale
        )
    }
}

/// Zoom limits and step factors
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Applied for a wheel event scrolling down
    pub wheel_zoom_out: f64,
    /// Applied for a wheel event scrolling up
    pub wheel_zoom_in: f64,
    /// Zoom button step; zoom out divides by it
    pub button_factor: f64,
    /// Space kept free around fitted content, in container pixels
    pub fit_margin: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 3.0,
            wheel_zoom_out: 0.9,
            wheel_zoom_in: 1.1,
            button_factor: 1.2,
            // The layout bounding box already carries its own margin
            fit_margin: 0.0,
        }
    }
}

impl ViewportConfig {
    /// Replace unusable values with the defaults and order the scale limits
    ///
    /// Scales and factors must be finite and positive; the fit margin must
    /// be finite and non-negative.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let min_scale = positive(self.min_scale, defaults.min_scale);
        let max_scale = positive(self.max_scale, defaults.max_scale);
        Self {
            min_scale: min_scale.min(max_scale),
            max_scale: min_scale.max(max_scale),
            wheel_zoom_out: positive(self.wheel_zoom_out, defaults.wheel_zoom_out),
            wheel_zoom_in: positive(self.wheel_zoom_in, defaults.wheel_zoom_in),
            button_factor: positive(self.button_factor, defaults.button_factor),
            fit_margin: if self.fit_margin.is_finite() && self.fit_margin >= 0.0 {
                self.fit_margin
            } else {
                defaults.fit_margin
            },
        }
    }
}

/// Input events a viewer forwards to its session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    Wheel { delta_y: f64 },
    ZoomIn,
    ZoomOut,
    /// Needs the container and content sizes, so sessions handle it
    Fit,
    Reset,
}

/// Drives a [`ViewportState`] from input events
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    config: ViewportConfig,
    state: ViewportState,
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ViewportConfig) -> Self {
        let normalized = config.clone().normalized();
        if normalized != config {
            warn!(?config, ?normalized, "Viewport config adjusted");
        }
        Self {
            config: normalized,
            state: ViewportState::default(),
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.config.min_scale, self.config.max_scale)
    }

    fn set_scale(&mut self, scale: f64) -> bool {
        let scale = self.clamp(scale);
        let changed = scale != self.state.scale;
        self.state.scale = scale;
        trace!(scale, changed, "Scale updated");
        changed
    }

    /// Start dragging from `pointer`
    pub fn pointer_down(&mut self, pointer: Point) -> bool {
        if !(pointer.x.is_finite() && pointer.y.is_finite()) {
            return false;
        }
        self.state.interaction = Interaction::Dragging {
            anchor: pointer - self.state.pan,
        };
        trace!(%pointer, "Drag started");
        true
    }

    /// Pan while dragging; no-op while idle
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        if !(pointer.x.is_finite() && pointer.y.is_finite()) {
            return false;
        }
        match self.state.interaction {
            Interaction::Dragging { anchor } => {
                self.state.pan = pointer - anchor;
                true
            }
            Interaction::Idle => false,
        }
    }

    /// Stop dragging; no-op while idle
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.state.is_dragging();
        self.state.interaction = Interaction::Idle;
        was_dragging
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.pointer_up()
    }

    /// Wheel zoom; positive `delta_y` zooms out, zero is ignored
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let factor = if delta_y > 0.0 {
            self.config.wheel_zoom_out
        } else {
            self.config.wheel_zoom_in
        };
        self.set_scale(self.state.scale * factor)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.state.scale * self.config.button_factor)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.state.scale / self.config.button_factor)
    }

    /// Scale `content` to fit inside `container` without enlarging it
    ///
    /// Pan resets to the origin. Returns `false` and leaves the state alone
    /// when either size is not positive.
    pub fn fit(&mut self, container: Size, content: Size) -> bool {
        let usable = |size: Size| {
            size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
        };
        if !usable(container) || !usable(content) {
            debug!(?container, ?content, "Fit skipped");
            return false;
        }
        let margin = self.config.fit_margin;
        let scale = ((container.width - margin) / content.width)
            .min((container.height - margin) / content.height)
            .min(1.0);
        self.state.scale = self.clamp(scale);
        self.state.pan = Point::default();
        debug!(scale = self.state.scale, "Fitted content to container");
        true
    }

    /// Back to scale 1, no pan, idle
    pub fn reset(&mut self) {
        self.state = ViewportState::default();
    }

    /// Dispatch one event; returns whether the state changed
    ///
    /// [`ViewerEvent::Fit`] needs sizes the controller does not know and is
    /// ignored here.
    pub fn handle(&mut self, event: ViewerEvent) -> bool {
        match event {
            ViewerEvent::PointerDown { x, y } => self.pointer_down(Point::new(x, y)),
            ViewerEvent::PointerMove { x, y } => self.pointer_move(Point::new(x, y)),
            ViewerEvent::PointerUp => self.pointer_up(),
            ViewerEvent::PointerLeave => self.pointer_leave(),
            ViewerEvent::Wheel { delta_y } => self.wheel(delta_y),
            ViewerEvent::ZoomIn => self.zoom_in(),
            ViewerEvent::ZoomOut => self.zoom_out(),
            ViewerEvent::Fit => false,
            ViewerEvent::Reset => {
                let changed = self.state != ViewportState::default();
                self.reset();
                changed
            }
        }
    }
}
