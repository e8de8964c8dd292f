//! Translates user gestures into validated move requests.

use std::rc::Rc;

use plotter_control::{BoundaryValidator, Endpoint};
use plotter_types::{MoveRequest, MoveType, PanelError, PanelResult, Vec2, ZeroRequest};
use wasm_bindgen_futures::spawn_local;

use crate::context::{CommandOutcome, PanelContext};

/// Fixed feed rate accompanying every move request, in mm/min.
pub const FEED_RATE: f64 = 1000.0;

pub struct MoveDispatcher {
    ctx: Rc<PanelContext>,
}

impl MoveDispatcher {
    pub fn new(ctx: Rc<PanelContext>) -> Self {
        Self { ctx }
    }

    /// Canvas click: refresh metadata first so a parameter change on the
    /// device is not acted on with stale geometry, then derive the millimeter
    /// target from the clicked pixel.
    pub fn click(&self, px: Vec2) {
        let ctx = self.ctx.clone();
        spawn_local(async move {
            if let Err(e) = ctx.refresh_metadata().await {
                // Fall through: a click may still be valid under the cached
                // generation, and the stale-metadata guard below catches the
                // never-fetched case.
                log::warn!("Metadata refresh on click failed: {e}");
            }

            let committed = Self::commit_from_pixels(&ctx, px);
            Self::finish(ctx, committed).await;
        });
    }

    /// Absolute-entry or incremental-entry gesture. The target commit happens
    /// synchronously, before this function returns, so overlapping gestures
    /// apply in issue order; only the network submission is deferred.
    pub fn request_move(&self, delta: Vec2, mode: MoveType) {
        let committed = Self::commit(&self.ctx, mode, delta);
        let ctx = self.ctx.clone();
        spawn_local(async move {
            Self::finish(ctx, committed).await;
        });
    }

    /// Ask the device to re-zero the given axes. No local target or boundary
    /// semantics.
    pub fn set_zero(&self, x_flag: bool, y_flag: bool, z_flag: bool) {
        let ctx = self.ctx.clone();
        spawn_local(async move {
            let (url, csrf) = {
                let endpoints = ctx.endpoints.borrow();
                (
                    endpoints.url_for(Endpoint::Zero),
                    endpoints.csrf_header().map(str::to_string),
                )
            };
            let body = ZeroRequest {
                x_flag,
                y_flag,
                z_flag,
            };
            if let Err(e) = ctx.client.post_json(&url, &body, csrf.as_deref()).await {
                log::error!("Zero-set submission failed: {e}");
            }
        });
    }

    /// Bare unlock notification, fire-and-forget.
    pub fn unlock(&self) {
        let ctx = self.ctx.clone();
        spawn_local(async move {
            let url = ctx.endpoints.borrow().url_for(Endpoint::Unlock);
            if let Err(e) = ctx.client.notify(&url).await {
                log::error!("Unlock notification failed: {e}");
            }
        });
    }

    /// Commit a new target computed from a millimeter delta. The target pair
    /// is updated even when validation then rejects the move; only the
    /// network call is gated.
    fn commit(ctx: &PanelContext, mode: MoveType, delta: Vec2) -> PanelResult<Vec2> {
        let mapper = ctx.metadata.borrow().mapper()?;
        let mm = ctx.target.borrow_mut().apply(mode, delta, &mapper);
        Self::validate(ctx, mm)?;
        Ok(mm)
    }

    /// Commit a new target from a clicked canvas pixel.
    fn commit_from_pixels(ctx: &PanelContext, px: Vec2) -> PanelResult<Vec2> {
        let mapper = ctx.metadata.borrow().mapper()?;
        let mm = ctx.target.borrow_mut().set_from_pixels(px, &mapper);
        Self::validate(ctx, mm)?;
        Ok(mm)
    }

    fn validate(ctx: &PanelContext, mm: Vec2) -> PanelResult<()> {
        let workspace = ctx
            .metadata
            .borrow()
            .get()
            .map(|meta| meta.workspace_size_mm)
            .ok_or(PanelError::StaleMetadata)?;
        BoundaryValidator::new(workspace, ctx.boundary_check.get()).validate(mm)?;
        Ok(())
    }

    /// Surface a local rejection, or submit the accepted target.
    async fn finish(ctx: Rc<PanelContext>, committed: PanelResult<Vec2>) {
        match committed {
            Ok(mm) => {
                ctx.set_status("Normal");
                // Optimistic draw: show the marker now rather than on the
                // next preview frame.
                let point_px = ctx.target.borrow().point_px();
                if let Err(e) = crate::preview::paint_target_marker(&ctx.canvas_id, point_px) {
                    log::debug!("Immediate marker paint skipped: {e}");
                }
                Self::submit_move(ctx, mm).await;
            }
            Err(e) => {
                log::info!("Move rejected locally: {e}");
                ctx.set_status(e.to_string());
            }
        }
    }

    /// Fire-and-forget submission. The marker stays where the user put it
    /// regardless of the outcome; the device's own state, surfaced by the
    /// next preview poll, is authoritative. The outcome lands in the shared
    /// slot so the preview loop can surface a failure.
    async fn submit_move(ctx: Rc<PanelContext>, mm: Vec2) {
        let (url, csrf) = {
            let endpoints = ctx.endpoints.borrow();
            (
                endpoints.url_for(Endpoint::Move),
                endpoints.csrf_header().map(str::to_string),
            )
        };
        let body = MoveRequest::absolute(mm, FEED_RATE);

        match ctx.client.post_json(&url, &body, csrf.as_deref()).await {
            Ok(()) => {
                *ctx.last_command.borrow_mut() = Some(CommandOutcome::Submitted);
            }
            Err(e) => {
                log::error!("Move submission failed: {e}");
                *ctx.last_command.borrow_mut() = Some(CommandOutcome::Failed(e.to_string()));
            }
        }
    }
}
