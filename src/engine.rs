//! Lifecycle of one visualization: setup, interaction, frames and teardown.
//!
//! [`EngineHandle`] owns every GPU object of an activation and is the only
//! way to reach them. Changing the geometry kind or the viewport size tears
//! the whole pipeline down and builds it again on the same context.
//! [`Viewer`] wraps an optional handle for hosts that must keep going when
//! no pipeline could be built.

use std::time::Duration;

use glam::Vec2;
use log::{error, info, warn};

use crate::camera::{CameraState, OrbitCamera};
use crate::config::ViewerConfig;
use crate::error::EngineError;
use crate::geometry::{self, GeometryData, GeometryKind};
use crate::render::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::render::{DrawInputs, FrameLoop, FrameOutcome, GpuBufferSet, GpuContext, ShaderProgram};

/// Drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// A fully built pipeline for one geometry kind.
///
/// GPU objects are released by [`EngineHandle::teardown`], which hands the
/// context back. Dropping a handle without tearing it down leaves them to the
/// context.
pub struct EngineHandle<C: GpuContext> {
    ctx: C,
    kind: GeometryKind,
    geometry: GeometryData,
    program: ShaderProgram,
    buffers: GpuBufferSet,
    camera: OrbitCamera,
    viewport: Viewport,
    config: ViewerConfig,
    frame_loop: FrameLoop,
}

impl<C: GpuContext> EngineHandle<C> {
    /// Builds geometry, compiles and links the shaders and uploads the mesh.
    ///
    /// Nothing stays allocated on `ctx` when this fails.
    pub fn initialize(
        mut ctx: C,
        kind: GeometryKind,
        width: u32,
        height: u32,
        config: ViewerConfig,
    ) -> Result<Self, EngineError> {
        let geometry = geometry::build(kind);
        geometry.validate()?;

        let program = ShaderProgram::build(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let buffers = match GpuBufferSet::upload(&mut ctx, &geometry) {
            Ok(buffers) => buffers,
            Err(err) => {
                program.release(&mut ctx);
                return Err(err);
            }
        };

        let viewport = Viewport::new(width, height);
        let mut frame_loop = FrameLoop::new();
        frame_loop.start();
        info!(
            "{kind} ready: {} vertices, {} triangles, {}x{}",
            geometry.vertex_count(),
            geometry.triangle_count(),
            viewport.width,
            viewport.height
        );
        Ok(Self {
            ctx,
            kind,
            geometry,
            program,
            buffers,
            camera: OrbitCamera::new(),
            viewport,
            config,
            frame_loop,
        })
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.camera.pointer_down(Vec2::new(x, y));
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.camera.pointer_move(Vec2::new(x, y));
    }

    /// Ends a drag; hosts call this for pointer-leave too.
    pub fn on_pointer_up(&mut self) {
        self.camera.pointer_up();
    }

    pub fn on_wheel(&mut self, delta: f32) {
        self.camera.wheel(delta);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    pub fn camera(&self) -> &CameraState {
        self.camera.state()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.camera.zoom_percent()
    }

    pub fn geometry(&self) -> &GeometryData {
        &self.geometry
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_running()
    }

    /// Renders one frame at host time `now`.
    pub fn tick(&mut self, now: Duration) -> FrameOutcome {
        let inputs = DrawInputs {
            program: &self.program,
            buffers: &self.buffers,
            camera: self.camera.state(),
            aspect: self.viewport.aspect(),
            config: &self.config,
        };
        self.frame_loop.tick(now, &mut self.ctx, inputs)
    }

    /// Stops the loop, deletes every GPU object and returns the context.
    pub fn teardown(mut self) -> C {
        self.frame_loop.stop();
        self.buffers.release(&mut self.ctx);
        self.program.release(&mut self.ctx);
        info!("{} torn down", self.kind);
        self.ctx
    }

    /// Tears down and initializes again with new parameters on the same context.
    pub fn rebuild(self, kind: GeometryKind, width: u32, height: u32) -> Result<Self, EngineError> {
        let config = self.config;
        let mut ctx = self.teardown();
        ctx.resize(width.max(1), height.max(1));
        Self::initialize(ctx, kind, width, height, config)
    }
}

/// Host-facing shell that turns setup failures into an inert viewer.
///
/// Every operation on an inert viewer does nothing.
pub struct Viewer<C: GpuContext> {
    engine: Option<EngineHandle<C>>,
}

impl<C: GpuContext> Viewer<C> {
    /// Builds the pipeline on `ctx`, or stays inert if that is impossible.
    ///
    /// A missing context is logged as a warning; compile, link and resource
    /// failures are logged as errors and leave the canvas blank.
    pub fn mount(
        ctx: Result<C, EngineError>,
        kind: GeometryKind,
        width: u32,
        height: u32,
        config: ViewerConfig,
    ) -> Self {
        let engine = ctx.and_then(|ctx| EngineHandle::initialize(ctx, kind, width, height, config));
        match engine {
            Ok(engine) => Self {
                engine: Some(engine),
            },
            Err(err) => {
                report(&err);
                Self { engine: None }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&EngineHandle<C>> {
        self.engine.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.engine.as_ref().is_some_and(EngineHandle::is_running)
    }

    pub fn tick(&mut self, now: Duration) -> FrameOutcome {
        match self.engine.as_mut() {
            Some(engine) => engine.tick(now),
            None => FrameOutcome::Stopped,
        }
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.on_pointer_down(x, y);
        }
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.on_pointer_move(x, y);
        }
    }

    pub fn on_pointer_up(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.on_pointer_up();
        }
    }

    pub fn on_wheel(&mut self, delta: f32) {
        if let Some(engine) = self.engine.as_mut() {
            engine.on_wheel(delta);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset_view();
        }
    }

    pub fn zoom_percent(&self) -> Option<u32> {
        self.engine.as_ref().map(EngineHandle::zoom_percent)
    }

    /// Applies a geometry or size change by rebuilding. Unchanged parameters do nothing.
    pub fn set_parameters(&mut self, kind: GeometryKind, width: u32, height: u32) {
        let Some(engine) = self.engine.take() else {
            return;
        };
        if engine.kind() == kind && engine.viewport() == Viewport::new(width, height) {
            self.engine = Some(engine);
            return;
        }
        match engine.rebuild(kind, width, height) {
            Ok(engine) => self.engine = Some(engine),
            Err(err) => report(&err),
        }
    }

    /// Releases the pipeline and returns the context, leaving the viewer inert.
    pub fn teardown(&mut self) -> Option<C> {
        self.engine.take().map(EngineHandle::teardown)
    }
}

fn report(err: &EngineError) {
    if err.is_setup() {
        warn!("3D view unavailable: {err}");
    } else {
        error!("3D view disabled: {err}");
    }
}
