//! WASM bridge for the plotter panel
//!
//! Exposes the `PlotterPanel` object the page scripts against: canvas click
//! handling, absolute and incremental moves, endpoint reconfiguration, the
//! zero/unlock commands, and control over the preview polling loop.

use std::rc::Rc;

use plotter_types::{MoveType, Vec2};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub mod context;
pub mod dispatch;
pub mod fetch;
pub mod preview;

use context::{csrf_token_from_document, PanelContext};
use dispatch::MoveDispatcher;
use preview::PreviewLoop;

fn init_diagnostics() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Info);
    });
}

/// Browser-facing control panel for one plotter device.
#[wasm_bindgen]
pub struct PlotterPanel {
    ctx: Rc<PanelContext>,
    dispatcher: MoveDispatcher,
    preview: PreviewLoop,
}

#[wasm_bindgen]
impl PlotterPanel {
    /// `canvas_id` names the visible canvas element; `base_url`, when given,
    /// overrides the default endpoint root and must be a well-formed
    /// http(s) URL.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, base_url: Option<String>) -> Result<PlotterPanel, JsValue> {
        init_diagnostics();

        let ctx = Rc::new(PanelContext::new(canvas_id));
        if let Some(url) = base_url {
            ctx.endpoints
                .borrow_mut()
                .set_base(&url)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
        }
        ctx.endpoints
            .borrow_mut()
            .set_csrf_token(csrf_token_from_document());

        Ok(PlotterPanel {
            dispatcher: MoveDispatcher::new(ctx.clone()),
            preview: PreviewLoop::new(ctx.clone()),
            ctx,
        })
    }

    /// Fetch the initial device geometry and start the preview loop.
    pub fn start(&self) {
        let ctx = self.ctx.clone();
        spawn_local(async move {
            if let Err(e) = ctx.refresh_metadata().await {
                log::warn!("Initial metadata fetch failed: {e}");
            }
        });
        self.preview.start();
    }

    /// Stop the preview loop. Safe to call repeatedly.
    pub fn stop(&self) {
        self.preview.stop();
    }

    /// Canvas click at canvas-local pixel coordinates.
    pub fn click(&self, x: f64, y: f64) {
        self.dispatcher.click(Vec2::new(x, y));
    }

    /// Absolute goto entry, in millimeters.
    pub fn goto_absolute(&self, x: f64, y: f64) {
        self.dispatcher.request_move(Vec2::new(x, y), MoveType::Absolute);
    }

    /// Incremental move entry, in millimeters relative to the current target.
    pub fn move_incremental(&self, x: f64, y: f64) {
        self.dispatcher
            .request_move(Vec2::new(x, y), MoveType::Incremental);
    }

    /// Reconfigure the endpoint root. Invalid input leaves the previous root
    /// in place and reports the reason in the status line.
    pub fn set_endpoint(&self, url: &str) {
        match self.ctx.endpoints.borrow_mut().set_base(url) {
            Ok(()) => {
                self.ctx.set_status("API updated.");
                let ctx = self.ctx.clone();
                spawn_local(async move {
                    if let Err(e) = ctx.refresh_metadata().await {
                        log::warn!("Metadata fetch after endpoint change failed: {e}");
                    }
                });
            }
            Err(e) => self.ctx.set_status(e.to_string()),
        }
    }

    pub fn set_boundary_check(&self, enabled: bool) {
        self.ctx.boundary_check.set(enabled);
    }

    /// Opt in to attaching the anti-forgery token to outgoing commands.
    pub fn set_attach_csrf(&self, attach: bool) {
        self.ctx.endpoints.borrow_mut().set_attach_csrf(attach);
    }

    pub fn unlock(&self) {
        self.dispatcher.unlock();
    }

    pub fn set_zero(&self, x_flag: bool, y_flag: bool, z_flag: bool) {
        self.dispatcher.set_zero(x_flag, y_flag, z_flag);
    }

    /// Last validation or network outcome, for the status text element.
    pub fn status_message(&self) -> String {
        self.ctx.status_line.borrow().clone()
    }

    /// Machine state string from the most recent successful poll.
    pub fn plotter_state(&self) -> String {
        self.ctx.plotter_status.borrow().state.clone()
    }

    /// Machine position `{x, y, z}` from the most recent successful poll.
    pub fn plotter_position(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.ctx.plotter_status.borrow().position)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current commanded target `{x, y}` in millimeters.
    pub fn target_mm(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.ctx.target.borrow().position_mm())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn preview_running(&self) -> bool {
        self.preview.is_running()
    }
}
