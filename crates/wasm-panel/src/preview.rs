//! Self-rescheduling preview loop: fetch a device snapshot, composite it with
//! the target marker, and arm the next attempt.
//!
//! The loop has two states, polling (request in flight) and idle-waiting
//! (timer armed). The reschedule always happens strictly after the fetch
//! settles, so at most one preview fetch is in flight at a time. A
//! cancellation flag is checked before every reschedule so teardown actually
//! stops the chain.

use std::cell::Cell;
use std::rc::Rc;

use plotter_control::{Endpoint, LoopEpoch, PollOutcome, PollSchedule};
use plotter_types::{PanelError, PanelResult, Vec2};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::context::{CommandOutcome, PanelContext};

const MARKER_COLOR: &str = "#033dfc";
const MARKER_RADIUS_PX: f64 = 3.0;
// Half-pixel offset keeps the marker crisp on the pixel grid.
const MARKER_BIAS_PX: f64 = 0.5;

#[derive(Clone)]
pub struct PreviewLoop {
    ctx: Rc<PanelContext>,
    schedule: PollSchedule,
    running: Rc<Cell<bool>>,
    epoch: Rc<LoopEpoch>,
    timer_id: Rc<Cell<Option<i32>>>,
}

impl PreviewLoop {
    pub fn new(ctx: Rc<PanelContext>) -> Self {
        Self {
            ctx,
            schedule: PollSchedule::default(),
            running: Rc::new(Cell::new(false)),
            epoch: Rc::new(LoopEpoch::new()),
            timer_id: Rc::new(Cell::new(None)),
        }
    }

    /// Start polling. A second call while the chain is alive is a no-op.
    /// Every start opens a new epoch, so a tick left in flight by an earlier
    /// stop/start cycle holds a stale token and cannot arm a second chain.
    pub fn start(&self) {
        if self.running.replace(true) {
            return;
        }
        let token = self.epoch.begin();
        log::info!("Preview loop started");
        self.spawn_tick(token);
    }

    /// Stop polling: close the current epoch and disarm any pending timer.
    /// An in-flight fetch completes but will not reschedule.
    pub fn stop(&self) {
        self.epoch.invalidate();
        if let Some(id) = self.timer_id.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(id);
            }
        }
        self.running.set(false);
        log::info!("Preview loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    fn spawn_tick(&self, token: u64) {
        let this = self.clone();
        spawn_local(async move {
            if !this.epoch.is_current(token) {
                return;
            }

            let outcome = match this.poll_once().await {
                Ok(()) => PollOutcome::Success,
                Err(e) => {
                    log::warn!("Preview poll failed: {e}");
                    PollOutcome::Failure
                }
            };

            this.schedule_next(token, outcome);
        });
    }

    fn schedule_next(&self, token: u64, outcome: PollOutcome) {
        // A stale token means a newer start or stop owns the loop now; this
        // chain ends here without touching shared loop state.
        if !self.epoch.is_current(token) {
            return;
        }

        let window = match web_sys::window() {
            Some(window) => window,
            None => {
                log::error!("No window object; preview loop halting");
                self.running.set(false);
                return;
            }
        };

        let delay = self.schedule.next_delay_ms(outcome);
        let this = self.clone();
        let callback = Closure::once_into_js(move || {
            this.timer_id.set(None);
            this.spawn_tick(token);
        });

        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay as i32,
        ) {
            Ok(id) => {
                self.timer_id.set(Some(id));
            }
            Err(e) => {
                log::error!("Failed to arm preview timer: {e:?}");
                self.running.set(false);
            }
        }
    }

    /// One polling cycle: fetch, decode, composite, and surface any pending
    /// command outcome. Any error skips the render entirely.
    async fn poll_once(&self) -> PanelResult<()> {
        let url = self.ctx.endpoints.borrow().url_for(Endpoint::Image);
        let snapshot = self.ctx.client.get_snapshot(&url).await?;

        *self.ctx.plotter_status.borrow_mut() = snapshot.status;

        let image = decode_image(&snapshot.image_bytes, &snapshot.content_type).await?;
        let target_px = self.ctx.target.borrow().point_px();
        render_snapshot(&self.ctx.canvas_id, &image, target_px)?;

        self.surface_command_outcome();
        Ok(())
    }

    /// A failed fire-and-forget move becomes visible here, once the device
    /// state it did not change has been re-read.
    fn surface_command_outcome(&self) {
        if let Some(CommandOutcome::Failed(message)) = self.ctx.last_command.borrow_mut().take() {
            self.ctx.set_status(format!("Move submission failed: {message}"));
        }
    }
}

/// Decode raw image bytes through an `HtmlImageElement` backed by a temporary
/// object URL. The URL is revoked as soon as the decode settles.
async fn decode_image(bytes: &[u8], mime: &str) -> PanelResult<HtmlImageElement> {
    let object_url = create_object_url(bytes, mime)?;

    let image = HtmlImageElement::new()?;
    let img = image.clone();
    let loaded = js_sys::Promise::new(&mut move |resolve, reject| {
        img.set_onload(Some(&resolve));
        img.set_onerror(Some(&reject));
    });
    image.set_src(&object_url);

    let result = JsFuture::from(loaded).await;
    let _ = web_sys::Url::revoke_object_url(&object_url);

    result.map_err(|_| PanelError::transport("Image decode failed"))?;
    Ok(image)
}

fn create_object_url(bytes: &[u8], mime: &str) -> PanelResult<String> {
    let parts = js_sys::Array::new();
    let u8_array = js_sys::Uint8Array::from(bytes);
    parts.push(&u8_array.buffer());

    let options = BlobPropertyBag::new();
    if !mime.trim().is_empty() {
        options.set_type(mime);
    }
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Ok(web_sys::Url::create_object_url_with_blob(&blob)?)
}

/// Composite one frame: draw the snapshot and the target marker onto an
/// off-screen buffer, then blit the buffer to the visible canvas in a single
/// paint. Both canvases are resized to the image's native dimensions, which
/// may change between frames.
fn render_snapshot(canvas_id: &str, image: &HtmlImageElement, target_px: Vec2) -> PanelResult<()> {
    let document = document()?;
    let canvas = visible_canvas(&document, canvas_id)?;

    let width = image.natural_width();
    let height = image.natural_height();
    canvas.set_width(width);
    canvas.set_height(height);

    let buffer: HtmlCanvasElement = document
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| PanelError::transport("Failed to create buffer canvas"))?;
    buffer.set_width(width);
    buffer.set_height(height);

    let buffer_ctx = context_2d(&buffer)?;
    buffer_ctx.draw_image_with_html_image_element(image, 0.0, 0.0)?;
    draw_target_marker(&buffer_ctx, target_px)?;

    context_2d(&canvas)?.draw_image_with_html_canvas_element(&buffer, 0.0, 0.0)?;
    Ok(())
}

/// Paint the marker straight onto the visible canvas, without waiting for
/// the next preview frame. Used for the optimistic draw right after a target
/// commit; the next frame repaints it on top of fresh imagery anyway.
pub fn paint_target_marker(canvas_id: &str, target_px: Vec2) -> PanelResult<()> {
    let document = document()?;
    let canvas = visible_canvas(&document, canvas_id)?;
    draw_target_marker(&context_2d(&canvas)?, target_px)
}

fn document() -> PanelResult<web_sys::Document> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| PanelError::transport("No document available"))
}

fn visible_canvas(document: &web_sys::Document, canvas_id: &str) -> PanelResult<HtmlCanvasElement> {
    document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| PanelError::transport(format!("Canvas #{canvas_id} not found")))?
        .dyn_into()
        .map_err(|_| PanelError::transport(format!("#{canvas_id} is not a canvas")))
}

fn draw_target_marker(ctx: &CanvasRenderingContext2d, target_px: Vec2) -> PanelResult<()> {
    ctx.set_fill_style_str(MARKER_COLOR);
    ctx.begin_path();
    ctx.arc(
        target_px.x + MARKER_BIAS_PX,
        target_px.y + MARKER_BIAS_PX,
        MARKER_RADIUS_PX,
        0.0,
        std::f64::consts::PI * 2.0,
    )?;
    ctx.fill();
    Ok(())
}

fn context_2d(canvas: &HtmlCanvasElement) -> PanelResult<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| PanelError::transport("2D context unavailable"))?
        .dyn_into()
        .map_err(|_| PanelError::transport("Unexpected 2D context type"))
}
