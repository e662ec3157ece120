//! Browser host: a canvas-backed WebGL2 surface and a
//! `requestAnimationFrame` scheduler.

use std::{cell::RefCell, rc::Rc};

use anyhow::{Context as _, anyhow};
use wasm_bindgen::{JsCast, prelude::Closure};
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

use crate::{
    backends::glow::GlowContext,
    context::Surface,
    flow::{App, FrameScheduler, Scene, init_logging},
    resources::{ShaderSource, load_shader_source},
};

#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    pub fn from_element_id(id: &str) -> anyhow::Result<Self> {
        let canvas = web_sys::window()
            .context("no global window")?
            .document()
            .context("window has no document")?
            .get_element_by_id(id)
            .with_context(|| format!("no element with id `{id}`"))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("element `{id}` is not a canvas"))?;
        Ok(Self::new(canvas))
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    type Context = GlowContext;

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn create_context(&self) -> anyhow::Result<GlowContext> {
        let gl = self
            .canvas
            .get_context("webgl2")
            .map_err(|e| anyhow!("could not request a webgl2 context: {e:?}"))?
            .context("webgl2 is not supported")?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| anyhow!("context is not a WebGl2RenderingContext"))?;
        let gl = ::glow::Context::from_webgl2_context(gl);
        Ok(GlowContext::new(gl)?)
    }
}

/// Schedules one callback per repaint through `requestAnimationFrame`.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrameScheduler {
    pub fn new(callback: Closure<dyn FnMut(f64)>) -> anyhow::Result<Self> {
        let window = web_sys::window().context("no global window")?;
        Ok(Self { window, callback })
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    /// `None` when the browser refused the request.
    type Handle = Option<i32>;

    fn request_frame(&mut self) -> Option<i32> {
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {e:?}");
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: Option<i32>) {
        if let Some(id) = handle {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {e:?}");
            }
        }
    }
}

pub type WebApp<S> = App<CanvasSurface, S, AnimationFrameScheduler>;

type AppSlot<S> = Rc<RefCell<Option<WebApp<S>>>>;

/// Keeps a running [`WebApp`] alive. Dropping the handle disposes the app,
/// which cancels the pending animation frame before the callback is freed.
pub struct WebHandle<S: Scene>(AppSlot<S>);

impl<S: Scene> WebHandle<S> {
    /// `false` until the app has been installed (see [`start_with`]) and
    /// after it failed to start.
    pub fn is_running(&self) -> bool {
        self.0
            .borrow()
            .as_ref()
            .is_some_and(|app| !app.is_disposed())
    }

    pub fn resize(&self, width: u32, height: u32) {
        if let Some(app) = self.0.borrow_mut().as_mut() {
            app.resize(width, height);
        }
    }

    pub fn dispose(&self) {
        if let Some(app) = self.0.borrow_mut().as_mut() {
            app.dispose();
        }
    }
}

fn launch<S: Scene + 'static>(
    slot: &AppSlot<S>,
    canvas_id: &str,
    scene: S,
) -> anyhow::Result<()> {
    let weak = Rc::downgrade(slot);
    let callback = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
        let Some(slot) = weak.upgrade() else {
            return;
        };
        let mut slot = slot.borrow_mut();
        if let Some(app) = slot.as_mut() {
            if let Err(e) = app.frame() {
                log::error!("Unable to render {:#}", e);
                app.dispose();
            }
        }
    });

    let surface = CanvasSurface::from_element_id(canvas_id)?;
    let scheduler = AnimationFrameScheduler::new(callback)?;
    let app = App::new(surface, scene, scheduler)?;
    *slot.borrow_mut() = Some(app);
    Ok(())
}

/// Start rendering `scene` into the canvas with id `canvas_id`.
pub fn start<S: Scene + 'static>(canvas_id: &str, scene: S) -> anyhow::Result<WebHandle<S>> {
    init_logging();

    let slot: AppSlot<S> = Rc::new(RefCell::new(None));
    launch(&slot, canvas_id, scene)?;
    Ok(WebHandle(slot))
}

/// Fetch the shader pair, build the scene from it and start rendering.
///
/// Returns immediately; the app is installed into the handle once both
/// shaders arrived. Load and startup errors are logged. Dropping the handle
/// before that abandons the start.
pub fn start_with<S, F>(canvas_id: &str, vertex: &str, fragment: &str, build: F) -> WebHandle<S>
where
    S: Scene + 'static,
    F: FnOnce(&ShaderSource) -> S + 'static,
{
    init_logging();

    let slot: AppSlot<S> = Rc::new(RefCell::new(None));
    let weak = Rc::downgrade(&slot);
    let canvas_id = canvas_id.to_owned();
    let vertex = vertex.to_owned();
    let fragment = fragment.to_owned();
    wasm_bindgen_futures::spawn_local(async move {
        let shaders = match load_shader_source(&vertex, &fragment).await {
            Ok(shaders) => shaders,
            Err(e) => {
                log::error!("Unable to load shaders {:#}", e);
                return;
            }
        };
        let Some(slot) = weak.upgrade() else {
            log::debug!("handle dropped before the shaders arrived");
            return;
        };
        if let Err(e) = launch(&slot, &canvas_id, build(&shaders)) {
            log::error!("Unable to start {:#}", e);
        }
    });
    WebHandle(slot)
}
