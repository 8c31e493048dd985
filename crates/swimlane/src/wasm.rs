//! WebAssembly bindings for Swimlane
//!
//! Browser-facing wrappers around generation, validation and the viewer
//! session. Errors cross the boundary as JavaScript strings.

use wasm_bindgen::prelude::*;

use crate::core::RunToken;
use crate::plugins::bpmn::{repair, validate, ProcessInput};
use crate::plugins::Orchestrator;
use crate::viewer::{ViewerEvent, ViewerSession};

fn js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Initialize WASM module
///
/// Sets up panic hooks and logging for better error messages in the browser.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    use crate::core::logging::init_logging;
    let _ = init_logging(Some("info"), None);
}

/// Generate BPMN XML from a JSON process description
///
/// # Arguments
/// * `input_json` - `ProcessInput` as camelCase JSON
/// * `token` - Run token embedded in every id, such as `Date.now()`
#[wasm_bindgen]
pub fn generate_bpmn(input_json: &str, token: f64) -> Result<String, JsValue> {
    let input: ProcessInput = serde_json::from_str(input_json).map_err(js_error)?;
    // The system clock is unavailable here, so the caller supplies the token
    Orchestrator::with_bpmn_plugins()
        .generate(&input, RunToken::from(token.max(0.0) as u64))
        .map(|generated| generated.xml)
        .map_err(js_error)
}

/// Validate BPMN XML and return JSON with `ok`, `fatal` and `issues`
#[wasm_bindgen]
pub fn validate_bpmn(xml: &str) -> String {
    let report = validate(xml);
    serde_json::json!({
        "ok": report.ok(),
        "fatal": report.is_fatal(),
        "issues": report.issues.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
    })
    .to_string()
}

/// Repair BPMN XML and return JSON with `xml`, `patches` and `residual`
#[wasm_bindgen]
pub fn repair_bpmn(xml: &str) -> String {
    let repaired = repair(xml);
    serde_json::json!({
        "xml": repaired.xml,
        "patches": repaired.patches.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "residual": repaired.residual.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
    })
    .to_string()
}

/// Interactive viewer bound to one container element
///
/// Every event method returns whether the view changed, so the caller
/// knows when to re-render.
#[wasm_bindgen]
pub struct WasmViewer {
    session: ViewerSession,
    orchestrator: Orchestrator,
}

#[wasm_bindgen]
impl WasmViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> WasmViewer {
        WasmViewer {
            session: ViewerSession::new(width, height),
            orchestrator: Orchestrator::with_bpmn_plugins(),
        }
    }

    /// Load BPMN XML; returns the decode warnings as a JSON array
    pub fn load(&mut self, xml: &str) -> Result<String, JsValue> {
        let warnings = self
            .orchestrator
            .import_for_viewing(xml, &mut self.session)
            .map_err(js_error)?;
        let warnings: Vec<String> = warnings.iter().map(|w| w.to_string()).collect();
        serde_json::to_string(&warnings).map_err(js_error)
    }

    pub fn clear(&mut self) -> bool {
        self.session.clear()
    }

    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        self.session.set_container(width, height)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.session.handle(ViewerEvent::PointerDown { x, y })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.handle(ViewerEvent::PointerMove { x, y })
    }

    pub fn pointer_up(&mut self) -> bool {
        self.session.handle(ViewerEvent::PointerUp)
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.session.handle(ViewerEvent::PointerLeave)
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.session.handle(ViewerEvent::Wheel { delta_y })
    }

    pub fn zoom_in(&mut self) -> bool {
        self.session.handle(ViewerEvent::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.session.handle(ViewerEvent::ZoomOut)
    }

    pub fn fit(&mut self) -> bool {
        self.session.handle(ViewerEvent::Fit)
    }

    pub fn reset(&mut self) -> bool {
        self.session.handle(ViewerEvent::Reset)
    }

    pub fn render_svg(&self) -> String {
        self.session.render_svg()
    }

    /// Current scale, pan and drag state as JSON
    pub fn state_json(&self) -> String {
        let state = self.session.state();
        serde_json::json!({
            "scale": state.scale,
            "panX": state.pan.x,
            "panY": state.pan.y,
            "dragging": state.is_dragging(),
            "transform": state.transform(),
        })
        .to_string()
    }
}
