#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo_events::{EventListener, EventListenerOptions};
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent};

use crate::config::ViewerConfig;
use crate::engine::Viewer;
use crate::error::EngineError;
use crate::geometry::GeometryKind;
use crate::render::WgpuContext;

type SharedViewer = Rc<RefCell<Viewer<WgpuContext>>>;
type FrameCallback = Closure<dyn FnMut(f64)>;

/// The frame callback plus the id of the request it is queued under.
struct AnimationFrame {
    request: Option<i32>,
    callback: FrameCallback,
}

type FrameSlot = Rc<RefCell<Option<AnimationFrame>>>;

#[wasm_bindgen(start)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("logger already initialized"));
    }
}

/// One mounted viewer bound to a canvas element.
///
/// A page without WebGL gets an inert instance: every method is a no-op.
#[wasm_bindgen]
pub struct Visualization {
    viewer: SharedViewer,
    canvas: Option<HtmlCanvasElement>,
    animation: FrameSlot,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl Visualization {
    /// Builds the pipeline on `canvas_id` and starts the frame loop.
    pub async fn mount(canvas_id: String, selector: String, width: u32, height: u32) -> Visualization {
        let kind = GeometryKind::from_selector(&selector);
        let (canvas, ctx) = match connect(&canvas_id, width, height).await {
            Ok((canvas, ctx)) => (Some(canvas), Ok(ctx)),
            Err(err) => (None, Err(err)),
        };
        let viewer = Rc::new(RefCell::new(Viewer::mount(
            ctx,
            kind,
            width,
            height,
            ViewerConfig::default(),
        )));

        let listeners = match &canvas {
            Some(canvas) if viewer.borrow().is_active() => attach_listeners(canvas, &viewer),
            _ => Vec::new(),
        };
        let visualization = Self {
            viewer,
            canvas,
            animation: Rc::new(RefCell::new(None)),
            _listeners: listeners,
        };
        start_frame_loop(&visualization.viewer, &visualization.animation);
        visualization
    }

    pub fn pointer_down(&self, x: f32, y: f32) {
        self.viewer.borrow_mut().on_pointer_down(x, y);
    }

    pub fn pointer_move(&self, x: f32, y: f32) {
        self.viewer.borrow_mut().on_pointer_move(x, y);
    }

    pub fn pointer_up(&self) {
        self.viewer.borrow_mut().on_pointer_up();
    }

    pub fn wheel(&self, delta: f32) {
        self.viewer.borrow_mut().on_wheel(delta);
    }

    pub fn reset_view(&self) {
        self.viewer.borrow_mut().reset_view();
    }

    /// Zoom as a whole percentage, `undefined` when inert.
    pub fn zoom(&self) -> Option<u32> {
        self.viewer.borrow().zoom_percent()
    }

    /// Rebuilds for a new selector or canvas size.
    pub fn set_parameters(&self, selector: String, width: u32, height: u32) {
        if let Some(canvas) = &self.canvas {
            canvas.set_width(width.max(1));
            canvas.set_height(height.max(1));
        }
        self.viewer
            .borrow_mut()
            .set_parameters(GeometryKind::from_selector(&selector), width, height);
    }

    /// Cancels the queued frame, stops the loop and releases every GPU object.
    pub fn teardown(&self) {
        cancel_frame_loop(&self.animation);
        drop(self.viewer.borrow_mut().teardown());
    }
}

impl Drop for Visualization {
    fn drop(&mut self) {
        cancel_frame_loop(&self.animation);
    }
}

async fn connect(
    canvas_id: &str,
    width: u32,
    height: u32,
) -> Result<(HtmlCanvasElement, WgpuContext), EngineError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| EngineError::Setup("document not available".into()))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| EngineError::Setup(format!("canvas `{canvas_id}` not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| EngineError::Setup(format!("`{canvas_id}` is not a canvas")))?;
    canvas.set_width(width.max(1));
    canvas.set_height(height.max(1));
    let ctx = WgpuContext::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height).await?;
    Ok((canvas, ctx))
}

fn attach_listeners(canvas: &HtmlCanvasElement, viewer: &SharedViewer) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    {
        let viewer = Rc::clone(viewer);
        listeners.push(EventListener::new(canvas, "mousedown", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                viewer
                    .borrow_mut()
                    .on_pointer_down(event.offset_x() as f32, event.offset_y() as f32);
            }
        }));
    }

    {
        let viewer = Rc::clone(viewer);
        listeners.push(EventListener::new(canvas, "mousemove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                viewer
                    .borrow_mut()
                    .on_pointer_move(event.offset_x() as f32, event.offset_y() as f32);
            }
        }));
    }

    for name in ["mouseup", "mouseleave"] {
        let viewer = Rc::clone(viewer);
        listeners.push(EventListener::new(canvas, name, move |_| {
            viewer.borrow_mut().on_pointer_up();
        }));
    }

    {
        let viewer = Rc::clone(viewer);
        listeners.push(EventListener::new_with_options(
            canvas,
            "wheel",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                if let Some(event) = event.dyn_ref::<WheelEvent>() {
                    event.prevent_default();
                    viewer.borrow_mut().on_wheel(event.delta_y() as f32);
                }
            },
        ));
    }

    listeners
}

/// Ticks on every animation frame and re-registers only while the viewer runs.
fn start_frame_loop(viewer: &SharedViewer, slot: &FrameSlot) {
    if !viewer.borrow().is_running() {
        return;
    }
    let viewer = Rc::clone(viewer);
    let next = Rc::clone(slot);
    let callback = Closure::wrap(Box::new(move |timestamp: f64| {
        let running = {
            let mut viewer = viewer.borrow_mut();
            viewer.tick(Duration::from_secs_f64(timestamp.max(0.0) / 1000.0));
            viewer.is_running()
        };
        if let Some(frame) = next.borrow_mut().as_mut() {
            frame.request = if running {
                request_frame(&frame.callback)
            } else {
                None
            };
        }
    }) as Box<dyn FnMut(f64)>);

    let request = request_frame(&callback);
    *slot.borrow_mut() = Some(AnimationFrame { request, callback });
}

/// Cancels the queued request, then drops the callback.
fn cancel_frame_loop(slot: &FrameSlot) {
    let Some(frame) = slot.borrow_mut().take() else {
        return;
    };
    if let (Some(request), Some(window)) = (frame.request, web_sys::window()) {
        if let Err(err) = window.cancel_animation_frame(request) {
            warn!("cancelAnimationFrame failed: {err:?}");
        }
    }
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    let window = web_sys::window()?;
    match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(request) => Some(request),
        Err(err) => {
            warn!("requestAnimationFrame failed: {err:?}");
            None
        }
    }
}
