//! Caller-owned viewer session
//!
//! Holds the diagram on screen, the container size and the viewport. Every
//! change of diagram or container re-fits the view.

use tracing::{debug, info, span, Level};

use crate::core::{Bounds, Database, Size};
use crate::plugins::bpmn::{DiagramLayout, DiagramModel, PipelineLayout, RenderConfig, SvgRenderer};

use super::viewport::{ViewerEvent, ViewportConfig, ViewportController, ViewportState};

/// One interactive view of one diagram
#[derive(Debug, Clone)]
pub struct ViewerSession {
    model: Option<DiagramModel>,
    layout: Option<DiagramLayout>,
    container: Size,
    controller: ViewportController,
    layout_engine: PipelineLayout,
    renderer: SvgRenderer,
}

impl ViewerSession {
    /// Empty session for a container of the given size
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(width, height, ViewportConfig::default(), RenderConfig::default())
    }

    pub fn with_config(
        width: f64,
        height: f64,
        viewport: ViewportConfig,
        render: RenderConfig,
    ) -> Self {
        Self {
            model: None,
            layout: None,
            container: Size::new(width, height),
            controller: ViewportController::with_config(viewport),
            layout_engine: PipelineLayout::new(),
            renderer: SvgRenderer::with_config(render),
        }
    }

    /// Show `model`, laying it out first when it carries no usable coordinates
    ///
    /// Returns whether the view could be fitted.
    pub fn load(&mut self, model: DiagramModel) -> bool {
        let load_span = span!(Level::INFO, "viewer_load", node_count = model.node_count());
        let _enter = load_span.enter();

        let positioned = model.nodes().all(|node| node.bounds.is_usable());
        let (model, layout) = if positioned {
            let layout = self.layout_engine.route_existing(&model);
            (model, layout)
        } else {
            debug!("Model has no usable coordinates, arranging");
            let layout = self.layout_engine.arrange(&model);
            (model.with_layout(&layout), layout)
        };
        self.model = Some(model);
        self.layout = Some(layout);
        self.controller.reset();
        let fitted = self.fit();
        info!(fitted, scale = self.controller.state().scale, "Diagram loaded");
        fitted
    }

    /// Drop the current diagram and reset the view
    pub fn clear(&mut self) -> bool {
        self.model = None;
        self.layout = None;
        self.controller.reset();
        self.fit()
    }

    /// Resize the container and re-fit
    pub fn set_container(&mut self, width: f64, height: f64) -> bool {
        self.container = Size::new(width, height);
        debug!(width, height, "Container resized");
        self.fit()
    }

    /// Fit the current diagram into the container
    pub fn fit(&mut self) -> bool {
        match self.bounding_box() {
            Some(bbox) => self
                .controller
                .fit(self.container, Size::new(bbox.width, bbox.height)),
            None => false,
        }
    }

    /// Dispatch one input event; returns whether the view changed
    pub fn handle(&mut self, event: ViewerEvent) -> bool {
        match event {
            ViewerEvent::Fit => self.fit(),
            other => self.controller.handle(other),
        }
    }

    pub fn state(&self) -> &ViewportState {
        self.controller.state()
    }

    pub fn model(&self) -> Option<&DiagramModel> {
        self.model.as_ref()
    }

    pub fn layout(&self) -> Option<&DiagramLayout> {
        self.layout.as_ref()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn bounding_box(&self) -> Option<Bounds> {
        self.layout.as_ref().and_then(|layout| layout.bounding_box)
    }

    /// Render the current view, or an empty canvas without a diagram
    pub fn render_svg(&self) -> String {
        let canvas = (self.container.width > 0.0 && self.container.height > 0.0)
            .then_some(self.container);
        match (&self.model, &self.layout) {
            (Some(model), Some(layout)) => self
                .renderer
                .render_view(model, layout, self.state(), canvas)
                .to_string(),
            _ => self
                .renderer
                .render_view(
                    &DiagramModel::default(),
                    &DiagramLayout::default(),
                    self.state(),
                    canvas,
                )
                .to_string(),
        }
    }
}
