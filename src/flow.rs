//! Flow control and the application frame loop.
//!
//! This module ties a [`Surface`], a [`Renderer`] and a [`Scene`] together into
//! an explicitly owned [`App`]. There is no global instance: whoever drives the
//! frames (the native [`run`] loop or the browser's animation-frame callback)
//! holds the `App` and calls [`App::frame`].
//!
//! # Lifecycle
//!
//! 1. `App::new` lets the scene adjust the renderer config (`on_init`), sizes the
//!    viewport, registers the scene and schedules the first frame
//! 2. Each `App::frame` runs `stats.begin`, `on_update`, `render`, `stats.end`
//!    and schedules the next frame
//! 3. `App::dispose` cancels the pending frame and releases GPU resources; later
//!    frames are no-ops. Dropping an `App` disposes it
//!

use std::fmt::Debug;

use anyhow::Context as _;
use instant::{Duration, Instant};

use crate::{
    context::Surface,
    data_structures::scene_graph::SceneNode,
    renderer::{Renderer, RendererConfig},
};

/// The composition root: an application specific scene graph that animates
/// itself between frames.
pub trait Scene: SceneNode {
    /// Adjust the renderer settings before the scene is registered.
    fn on_init(&mut self, _config: &mut RendererConfig) {}

    /// Mutate node transforms or material values. `dt` is the time since the
    /// previous frame (zero on the first one).
    fn on_update(&mut self, dt: Duration);
}

/// Host facility running a callback before the next repaint.
pub trait FrameScheduler {
    type Handle: Copy + Debug + PartialEq;

    fn request_frame(&mut self) -> Self::Handle;

    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Optional telemetry bracketing every frame.
pub trait FrameStats {
    fn begin(&mut self);

    fn end(&mut self);
}

impl Debug for dyn FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FrameStats")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Native scheduler ticking at a fixed interval.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameHandle, Instant)>,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_id: 0,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending.map(|(handle, _)| handle)
    }

    /// Block until the frame `handle` is due.
    ///
    /// Returns `false` without waiting when `handle` is not the pending frame
    /// (it was cancelled or already ran).
    pub fn wait(&mut self, handle: FrameHandle) -> bool {
        match self.pending {
            Some((pending, deadline)) if pending == handle => {
                self.pending = None;
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
                true
            }
            _ => false,
        }
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1) / 60)
    }
}

impl FrameScheduler for IntervalScheduler {
    type Handle = FrameHandle;

    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some((handle, Instant::now() + self.interval));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending() == Some(handle) {
            self.pending = None;
        }
    }
}

/// Frame-time bookkeeping that logs the frame rate once per second.
#[derive(Debug)]
pub struct FrameTimer {
    frame_start: Option<Instant>,
    window_start: Instant,
    window_frames: u32,
    frames: u64,
    last_frame_time: Duration,
    fps: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            frame_start: None,
            window_start: Instant::now(),
            window_frames: 0,
            frames: 0,
            last_frame_time: Duration::ZERO,
            fps: 0.0,
        }
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the last full one-second window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats for FrameTimer {
    fn begin(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    fn end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            log::warn!("FrameTimer::end called without begin");
            return;
        };
        let now = Instant::now();
        self.last_frame_time = now - start;
        self.frames += 1;
        self.window_frames += 1;

        let window = now - self.window_start;
        if window >= Duration::from_secs(1) {
            self.fps = self.window_frames as f32 / window.as_secs_f32();
            log::info!(
                "{:.1} fps ({:.2} ms/frame)",
                self.fps,
                self.last_frame_time.as_secs_f64() * 1000.0
            );
            self.window_start = now;
            self.window_frames = 0;
        }
    }
}

/// The application context: owns everything one running scene needs.
pub struct App<Sf: Surface, S: Scene, F: FrameScheduler> {
    surface: Sf,
    renderer: Renderer<Sf::Context>,
    scene: S,
    scheduler: F,
    stats: Option<Box<dyn FrameStats>>,
    pending: Option<F::Handle>,
    last_frame: Option<Instant>,
    disposed: bool,
}

impl<Sf, S, F> App<Sf, S, F>
where
    Sf: Surface,
    S: Scene,
    F: FrameScheduler,
{
    /// Create the graphics context, register `scene` and schedule the first
    /// frame. Registration failures (shader compile or link errors) abort.
    pub fn new(surface: Sf, mut scene: S, mut scheduler: F) -> anyhow::Result<Self> {
        let ctx = surface
            .create_context()
            .context("Cannot create the graphics context")?;
        let mut config = RendererConfig::default();
        scene.on_init(&mut config);

        let mut renderer = Renderer::new(ctx, config);
        let (width, height) = surface.size();
        renderer.set_size(width, height);
        renderer
            .add(&scene)
            .context("App initialization failed. Cannot register the scene")?;

        let pending = Some(scheduler.request_frame());
        Ok(Self {
            surface,
            renderer,
            scene,
            scheduler,
            stats: None,
            pending,
            last_frame: None,
            disposed: false,
        })
    }

    pub fn with_stats(mut self, stats: impl FrameStats + 'static) -> Self {
        self.stats = Some(Box::new(stats));
        self
    }

    /// Run one frame and schedule the next one.
    pub fn frame(&mut self) -> anyhow::Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.pending = None;

        if let Some(stats) = self.stats.as_mut() {
            stats.begin();
        }
        let now = Instant::now();
        let dt = self.last_frame.map_or(Duration::ZERO, |last| now - last);
        self.last_frame = Some(now);

        self.scene.on_update(dt);
        self.renderer.render(&mut self.scene)?;

        if let Some(stats) = self.stats.as_mut() {
            stats.end();
        }
        self.pending = Some(self.scheduler.request_frame());
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.set_size(width, height);
        self.renderer.set_size(width, height);
    }

    /// Stop the frame loop and release every GPU resource.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.renderer.dispose();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn pending_frame(&self) -> Option<F::Handle> {
        self.pending
    }

    pub fn surface(&self) -> &Sf {
        &self.surface
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn renderer(&self) -> &Renderer<Sf::Context> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<Sf::Context> {
        &mut self.renderer
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }
}

impl<Sf: Surface, S: Scene, F: FrameScheduler> Drop for App<Sf, S, F> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Install the platform logger. A second call is reported, not fatal.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }
}

/// Drive `app` natively until `max_frames` frames ran or it was disposed.
///
/// Returns the number of frames rendered.
#[cfg(not(target_arch = "wasm32"))]
pub fn run<Sf: Surface, S: Scene>(
    app: &mut App<Sf, S, IntervalScheduler>,
    max_frames: u64,
) -> anyhow::Result<u64> {
    init_logging();

    let mut frames = 0;
    while frames < max_frames {
        let Some(handle) = app.pending_frame() else {
            break;
        };
        if !app.scheduler_mut().wait(handle) {
            break;
        }
        if let Err(e) = app.frame() {
            log::error!("Unable to render {:#}", e);
            return Err(e);
        }
        frames += 1;
    }
    Ok(frames)
}
