//! The engine facade.

use crate::blob::{Blob, BlobPatch};
use crate::config::{blur_to_px, clamp_unit, EngineOptions};
use crate::registry::{BlobRegistry, UpdateOutcome};
use crate::renderer::{render_frame, FrameParams};
use crate::scheduler::{FrameCallback, FrameHost, FrameScheduler};
use crate::viewport::{Viewport, ViewportTracker};
use common::error::{FluidError, FluidResult};
use common::geometry::Point;
use parking_lot::Mutex;
use render::Surface;
use std::sync::{Arc, Weak};

/// Engine state shared between the facade and the scheduled frame callback.
struct EngineInner<S> {
    surface: S,
    host: Arc<dyn FrameHost>,
    registry: BlobRegistry,
    viewport: ViewportTracker,
    scheduler: FrameScheduler,
    alpha: f64,
    blur_px: u32,
    parallax: f64,
    composite: String,
    background: Option<String>,
    parallax_vector: Point,
    /// Host timestamp of the first rendered frame.
    start_time: Option<f64>,
    frames_rendered: u64,
    destroyed: bool,
}

impl<S: Surface> EngineInner<S> {
    fn render(&mut self, timestamp_ms: f64) {
        let start = *self.start_time.get_or_insert(timestamp_ms);
        self.viewport.sync(&mut self.surface);

        let frame = FrameParams {
            viewport: self.viewport.current(),
            elapsed: (timestamp_ms - start) / 1000.0,
            alpha: self.alpha,
            blur_px: self.blur_px,
            composite: &self.composite,
            background: self.background.as_deref(),
            parallax: self.parallax,
            parallax_vector: self.parallax_vector,
        };

        let Some(ctx) = self.surface.context_2d() else {
            tracing::warn!("surface lost its 2D context, frame dropped");
            return;
        };
        render_frame(ctx, &self.registry, &frame);
        self.frames_rendered += 1;
    }

    fn stop(&mut self) -> bool {
        match self.scheduler.stop() {
            Some(handle) => {
                self.host.cancel_animation_frame(handle);
                true
            }
            None => false,
        }
    }
}

fn frame_callback<S: Surface + 'static>(weak: Weak<Mutex<EngineInner<S>>>, run: u64) -> FrameCallback {
    Box::new(move |timestamp_ms| on_frame(weak, run, timestamp_ms))
}

fn on_frame<S: Surface + 'static>(weak: Weak<Mutex<EngineInner<S>>>, run: u64, timestamp_ms: f64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut inner = inner.lock();
    // A callback from before a stop/start pair must not fork a second loop.
    if !inner.scheduler.is_current(run) {
        return;
    }

    // Reschedule before anything else so the loop stays cancellable
    // whether or not this frame renders.
    let handle = inner.host.request_animation_frame(frame_callback(weak, run));
    inner.scheduler.set_pending(handle);

    if inner.scheduler.admit(timestamp_ms).is_some() {
        inner.render(timestamp_ms);
    }
}

/// Animated fluid background bound to one drawing surface.
///
/// All state lives behind one lock shared with the scheduled frame
/// callback; setters take effect on the next rendered frame.
pub struct FluidEngine<S: Surface + 'static> {
    inner: Arc<Mutex<EngineInner<S>>>,
}

impl<S: Surface + 'static> FluidEngine<S> {
    /// Bind an engine to `surface`, driven by `host`'s frame clock.
    ///
    /// Fails with [`FluidError::ContextUnavailable`] if the surface has no
    /// 2D context.
    pub fn new(mut surface: S, host: Arc<dyn FrameHost>, options: EngineOptions) -> FluidResult<Self> {
        if surface.context_2d().is_none() {
            return Err(FluidError::ContextUnavailable);
        }

        let mut viewport = ViewportTracker::new();
        viewport.sync(&mut surface);

        let inner = EngineInner {
            surface,
            host,
            registry: BlobRegistry::new(),
            viewport,
            scheduler: FrameScheduler::new(options.fps_cap),
            alpha: clamp_unit(options.alpha),
            blur_px: blur_to_px(options.blur_px),
            parallax: if options.parallax_vmax.is_finite() { options.parallax_vmax } else { 0.0 },
            composite: options.composite,
            background: options.background,
            parallax_vector: Point::ZERO,
            start_time: None,
            frames_rendered: 0,
            destroyed: false,
        };
        let engine = Self {
            inner: Arc::new(Mutex::new(inner)),
        };

        {
            let inner = engine.inner.lock();
            let vp = inner.viewport.current();
            tracing::info!(
                width = vp.width,
                height = vp.height,
                dpr = vp.dpr,
                alpha = inner.alpha,
                blur_px = inner.blur_px,
                composite = %inner.composite,
                "fluid engine created"
            );
        }

        if options.auto_start {
            engine.start();
        }
        Ok(engine)
    }

    /// Start the frame loop. No-op while running or after destroy.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            tracing::warn!("start called on a destroyed engine");
            return;
        }
        if inner.scheduler.is_running() {
            return;
        }

        let run = inner.scheduler.start();
        let handle = inner
            .host
            .request_animation_frame(frame_callback(Arc::downgrade(&self.inner), run));
        inner.scheduler.set_pending(handle);
        tracing::info!("fluid engine started");
    }

    /// Stop the frame loop. No-op when already stopped.
    pub fn stop(&self) {
        if self.inner.lock().stop() {
            tracing::info!("fluid engine stopped");
        }
    }

    /// Stop, blank the surface and drop every blob. Safe to call twice.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        inner.stop();

        if let Some(ctx) = inner.surface.context_2d() {
            let (w, h) = (ctx.canvas_width() as f64, ctx.canvas_height() as f64);
            ctx.reset_transform();
            ctx.clear_rect(0.0, 0.0, w, h);
            ctx.set_filter(render::Filter::None);
        }
        inner.registry.clear();

        if !inner.destroyed {
            inner.destroyed = true;
            tracing::info!("fluid engine destroyed");
        }
    }

    /// Render one frame right now, outside the frame loop and its cap.
    pub fn render_now(&self, timestamp_ms: f64) {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return;
        }
        inner.render(timestamp_ms);
    }

    pub fn set_alpha(&self, alpha: f64) {
        self.inner.lock().alpha = clamp_unit(alpha);
    }

    /// Blur in device pixels; fractions truncate, negatives become 0.
    pub fn set_blur_px(&self, blur_px: f64) {
        self.inner.lock().blur_px = blur_to_px(blur_px);
    }

    /// Global parallax magnitude. Non-finite values are ignored.
    pub fn set_parallax(&self, parallax: f64) {
        if parallax.is_finite() {
            self.inner.lock().parallax = parallax;
        }
    }

    /// Displacement fed to every blob's parallax, in logical pixels.
    pub fn set_parallax_vector(&self, vector: Point) {
        if vector.x.is_finite() && vector.y.is_finite() {
            self.inner.lock().parallax_vector = vector;
        }
    }

    pub fn set_fps_cap(&self, fps_cap: u32) {
        self.inner.lock().scheduler.set_fps_cap(fps_cap);
    }

    /// Composite operation name, passed to the context as is.
    pub fn set_composite(&self, composite: impl Into<String>) {
        self.inner.lock().composite = composite.into();
    }

    /// Background color, or `None` for a transparent surface.
    pub fn set_background(&self, background: Option<&str>) {
        self.inner.lock().background = background.map(str::to_string);
    }

    /// Insert or replace a blob.
    pub fn add_blob(&self, blob: Blob) {
        let mut inner = self.inner.lock();
        let id = blob.id.clone();
        let replaced = inner.registry.add(blob);
        tracing::debug!(id = %id, replaced, "blob added");
    }

    pub fn update_blob(&self, id: &str, patch: &BlobPatch) -> UpdateOutcome {
        let outcome = self.inner.lock().registry.update(id, patch);
        tracing::debug!(id, ?outcome, "blob updated");
        outcome
    }

    /// Remove a blob; returns whether it existed.
    pub fn remove_blob(&self, id: &str) -> bool {
        let removed = self.inner.lock().registry.remove(id).is_some();
        if removed {
            tracing::debug!(id, "blob removed");
        }
        removed
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().scheduler.is_running()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    pub fn alpha(&self) -> f64 {
        self.inner.lock().alpha
    }

    pub fn blur_px(&self) -> u32 {
        self.inner.lock().blur_px
    }

    pub fn parallax(&self) -> f64 {
        self.inner.lock().parallax
    }

    pub fn parallax_vector(&self) -> Point {
        self.inner.lock().parallax_vector
    }

    pub fn fps_cap(&self) -> u32 {
        self.inner.lock().scheduler.fps_cap()
    }

    pub fn composite(&self) -> String {
        self.inner.lock().composite.clone()
    }

    pub fn background(&self) -> Option<String> {
        self.inner.lock().background.clone()
    }

    pub fn blob(&self, id: &str) -> Option<Blob> {
        self.inner.lock().registry.get(id).cloned()
    }

    /// Blob ids in paint order.
    pub fn blob_ids(&self) -> Vec<String> {
        self.inner.lock().registry.ids().map(str::to_string).collect()
    }

    pub fn blob_count(&self) -> usize {
        self.inner.lock().registry.len()
    }

    /// Viewport as of the last sync.
    pub fn viewport(&self) -> Viewport {
        self.inner.lock().viewport.current()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.inner.lock().frames_rendered
    }

    /// Run `f` against the surface, e.g. to read pixels back.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.lock().surface)
    }

    /// Run `f` against the surface mutably, e.g. to simulate a resize.
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.lock().surface)
    }
}

impl<S: Surface + 'static> Drop for FluidEngine<S> {
    fn drop(&mut self) {
        self.inner.lock().stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BreathSpec, CenterSpec, DriftSpec, Layer};
    use crate::scheduler::ManualFrameHost;
    use common::color::Color;
    use render::{CanvasSurface, ContextType};

    fn setup(options: EngineOptions) -> (FluidEngine<CanvasSurface>, Arc<ManualFrameHost>) {
        let host = Arc::new(ManualFrameHost::new());
        let engine = FluidEngine::new(CanvasSurface::new(100.0, 100.0), host.clone(), options).unwrap();
        (engine, host)
    }

    fn test_blob() -> Blob {
        Blob::new("a")
            .with_diameter("50%")
            .with_center(CenterSpec::symbolic("50%", "50%"))
            .with_layer(Layer::new(Color::rgb(255, 0, 0), 1.0, 0.5, 0.0))
    }

    #[test]
    fn test_context_unavailable() {
        let mut surface = CanvasSurface::new(10.0, 10.0);
        surface.request_context(ContextType::WebGL);
        let host = Arc::new(ManualFrameHost::new());
        let result = FluidEngine::new(surface, host, EngineOptions::default());
        assert!(matches!(result, Err(FluidError::ContextUnavailable)));
    }

    #[test]
    fn test_construction_sizes_backing_store() {
        let host = Arc::new(ManualFrameHost::new());
        let surface = CanvasSurface::new(50.0, 20.0).with_device_pixel_ratio(2.0);
        let engine = FluidEngine::new(surface, host, EngineOptions::manual()).unwrap();
        assert_eq!(engine.with_surface(|s| s.backing_size()), (100, 40));
        assert_eq!(engine.viewport().dpr, 2.0);
    }

    #[test]
    fn test_end_to_end_single_blob() {
        let (engine, host) = setup(EngineOptions::manual().with_alpha(1.0));
        engine.add_blob(test_blob());
        engine.start();
        assert_eq!(host.tick(0.0), 1);
        assert_eq!(engine.frames_rendered(), 1);

        let center = engine.with_surface(|s| s.pixel(50, 50));
        assert_eq!((center.r, center.g, center.b), (255, 0, 0));
        assert!(center.a >= 245);

        let inner = engine.with_surface(|s| s.pixel(60, 50));
        let outer = engine.with_surface(|s| s.pixel(72, 50));
        assert!(inner.a < center.a);
        assert!(outer.a < inner.a);
        assert_eq!(engine.with_surface(|s| s.pixel(90, 50)).a, 0);
        assert_eq!(engine.with_surface(|s| s.pixel(2, 2)).a, 0);
    }

    #[test]
    fn test_auto_start() {
        let (engine, host) = setup(EngineOptions::default());
        assert!(engine.is_running());
        assert_eq!(host.pending(), 1);

        let (manual, host) = setup(EngineOptions::manual());
        assert!(!manual.is_running());
        assert_eq!(host.pending(), 0);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (engine, host) = setup(EngineOptions::manual());
        engine.stop();
        engine.start();
        engine.start();
        assert_eq!(host.pending(), 1);

        host.tick(0.0);
        assert_eq!(host.pending(), 1);

        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
        assert_eq!(host.pending(), 0);
        assert_eq!(host.tick(16.0), 0);
        assert_eq!(engine.frames_rendered(), 1);
    }

    #[test]
    fn test_restart_inside_tick_keeps_one_loop() {
        let (engine, host) = setup(EngineOptions::manual());
        let engine = Arc::new(engine);

        let restart = Arc::downgrade(&engine);
        host.request_animation_frame(Box::new(move |_| {
            if let Some(e) = restart.upgrade() {
                e.stop();
                e.start();
            }
        }));
        engine.start();

        host.tick(0.0);
        assert_eq!(host.pending(), 1);
        assert!(engine.is_running());

        let before = engine.frames_rendered();
        assert_eq!(host.tick(16.0), 1);
        assert_eq!(engine.frames_rendered() - before, 1);
        assert_eq!(host.pending(), 1);
    }

    #[test]
    fn test_fps_cap_skips_but_keeps_schedule() {
        let (engine, host) = setup(EngineOptions::manual().with_fps_cap(30));
        engine.start();

        let mut accepted = Vec::new();
        for i in 0..60 {
            let ts = i as f64 * 10.0;
            let before = engine.frames_rendered();
            host.tick(ts);
            if engine.frames_rendered() > before {
                accepted.push(ts);
            }
            assert_eq!(host.pending(), 1);
        }
        assert!(accepted.len() > 1);
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= 1000.0 / 30.0);
        }
    }

    #[test]
    fn test_uncapped_renders_every_tick() {
        let (engine, host) = setup(EngineOptions::manual());
        engine.start();
        for i in 0..10 {
            host.tick(i as f64 * 16.7);
        }
        assert_eq!(engine.frames_rendered(), 10);
    }

    #[test]
    fn test_destroy_twice_leaves_blank_surface() {
        let (engine, host) = setup(EngineOptions::manual().with_alpha(1.0).with_background("#204080"));
        engine.add_blob(test_blob());
        engine.start();
        host.tick(0.0);
        assert!(!engine.with_surface(|s| s.canvas().buffer().is_transparent()));

        engine.destroy();
        engine.destroy();
        assert!(engine.is_destroyed());
        assert!(!engine.is_running());
        assert_eq!(engine.blob_count(), 0);
        assert!(engine.with_surface(|s| s.canvas().buffer().is_transparent()));

        engine.start();
        assert!(!engine.is_running());
        assert_eq!(host.tick(16.0), 0);
    }

    #[test]
    fn test_blob_crud_through_facade() {
        let (engine, _host) = setup(EngineOptions::manual());
        engine.add_blob(Blob::new("a"));
        engine.add_blob(Blob::new("b"));
        assert_eq!(engine.blob_ids(), vec!["a", "b"]);

        assert_eq!(engine.update_blob("a", &BlobPatch::new().with_opacity(0.3)), UpdateOutcome::Updated);
        assert_eq!(engine.blob("a").map(|b| b.opacity), Some(0.3));
        assert_eq!(engine.update_blob("zzz", &BlobPatch::new()), UpdateOutcome::Ignored);
        assert_eq!(engine.blob_count(), 2);

        assert!(engine.remove_blob("a"));
        assert!(!engine.remove_blob("a"));
        assert_eq!(engine.blob_ids(), vec!["b"]);
    }

    #[test]
    fn test_setters_clamp() {
        let (engine, _host) = setup(EngineOptions::manual());
        engine.set_alpha(3.0);
        assert_eq!(engine.alpha(), 1.0);
        engine.set_blur_px(7.8);
        assert_eq!(engine.blur_px(), 7);
        engine.set_blur_px(-1.0);
        assert_eq!(engine.blur_px(), 0);
        engine.set_parallax(f64::NAN);
        assert_eq!(engine.parallax(), 1.0);
        engine.set_fps_cap(48);
        assert_eq!(engine.fps_cap(), 48);
        engine.set_composite("screen");
        assert_eq!(engine.composite(), "screen");
        engine.set_background(Some("navy"));
        assert_eq!(engine.background().as_deref(), Some("navy"));
        engine.set_background(None);
        assert!(engine.background().is_none());
        engine.set_parallax_vector(Point::new(3.0, 4.0));
        assert_eq!(engine.parallax_vector(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_huge_blur_renders() {
        let host = Arc::new(ManualFrameHost::new());
        let engine = FluidEngine::new(
            CanvasSurface::new(10.0, 10.0),
            host,
            EngineOptions::manual().with_alpha(1.0),
        )
        .unwrap();
        engine.add_blob(test_blob());
        engine.set_blur_px(1e9);
        assert_eq!(engine.blur_px(), 1_000_000_000);

        engine.render_now(0.0);
        assert_eq!(engine.frames_rendered(), 1);
        assert!(engine.with_surface(|s| s.pixel(5, 5)).a > 0);
    }

    #[test]
    fn test_live_resize_tracked() {
        let (engine, _host) = setup(EngineOptions::manual());
        engine.with_surface_mut(|s| {
            s.set_client_size(40.0, 30.0);
            s.set_device_pixel_ratio(2.0);
        });
        engine.render_now(0.0);
        assert_eq!(engine.with_surface(|s| s.backing_size()), (80, 60));
        assert_eq!(engine.viewport().width, 40.0);
    }

    #[test]
    fn test_blob_added_mid_run_shares_phase() {
        let (engine, host) = setup(EngineOptions::manual().with_alpha(1.0));
        engine.start();
        host.tick(1000.0);

        let drifting = test_blob().with_drift(DriftSpec::new(20.0, 0.0, 0.0, 0.0, 0.25));
        engine.add_blob(drifting);
        // One second after the animation start the blob is a quarter cycle
        // in, i.e. shifted right by the full amplitude.
        host.tick(2000.0);
        let shifted = engine.with_surface(|s| s.pixel(70, 50));
        assert!(shifted.a >= 245);
        assert!(engine.with_surface(|s| s.pixel(50, 50)).a < shifted.a);
    }

    #[test]
    fn test_breathing_changes_output() {
        let (engine, _host) = setup(EngineOptions::manual().with_alpha(1.0));
        engine.add_blob(test_blob().with_breath(BreathSpec {
            scale: [1.0, 1.0],
            opacity: [0.0, 1.0],
            speed: 1.0,
            phase: 0.75,
        }));
        // Phase 0.75 starts at the trough: fully transparent.
        engine.render_now(0.0);
        assert_eq!(engine.with_surface(|s| s.pixel(50, 50)).a, 0);

        engine.render_now(500.0);
        assert!(engine.with_surface(|s| s.pixel(50, 50)).a >= 245);
    }

    #[test]
    fn test_dropped_engine_stops_rendering() {
        let (engine, host) = setup(EngineOptions::default());
        assert_eq!(host.pending(), 1);
        drop(engine);
        assert_eq!(host.pending(), 0);
        assert_eq!(host.tick(0.0), 0);
    }
}
