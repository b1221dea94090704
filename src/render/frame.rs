use std::time::Duration;

use log::{info, warn};

use super::buffers::GpuBufferSet;
use super::context::{FrameState, GpuContext, UniformValue};
use super::program::ShaderProgram;
use crate::camera::CameraState;
use crate::config::ViewerConfig;
use crate::engine::EngineHandle;
use crate::error::DrawError;
use crate::math::{self, Matrix4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered,
    /// The frame failed and was dropped; the loop keeps running.
    Skipped,
    Stopped,
}

/// Everything one frame reads besides the context.
#[derive(Debug, Clone, Copy)]
pub struct DrawInputs<'a> {
    pub program: &'a ShaderProgram,
    pub buffers: &'a GpuBufferSet,
    pub camera: &'a CameraState,
    pub aspect: f32,
    pub config: &'a ViewerConfig,
}

/// Keep-running flag plus the time origin of the animation.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    origin: Option<Duration>,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            origin: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Stopped {
            info!("render loop started");
        }
        self.state = LoopState::Running;
        self.origin = None;
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            info!("render loop stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Seconds since the first tick after `start`.
    pub fn elapsed(&mut self, now: Duration) -> f32 {
        let origin = *self.origin.get_or_insert(now);
        now.saturating_sub(origin).as_secs_f32()
    }

    /// Renders one frame if running. Draw errors are logged and skipped.
    pub fn tick<C: GpuContext>(
        &mut self,
        now: Duration,
        ctx: &mut C,
        inputs: DrawInputs<'_>,
    ) -> FrameOutcome {
        if !self.is_running() {
            return FrameOutcome::Stopped;
        }
        let elapsed = self.elapsed(now);
        let uniforms = FrameUniforms::compute(inputs.camera, elapsed, inputs.aspect, inputs.config);
        match draw_frame(ctx, &inputs, &uniforms) {
            Ok(()) => FrameOutcome::Rendered,
            Err(err) => {
                warn!("skipping frame at {elapsed:.3}s: {err}");
                FrameOutcome::Skipped
            }
        }
    }
}

/// Per-frame uniform values, derived purely from camera, time and config.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub world: Matrix4,
    pub world_view_projection: Matrix4,
    pub world_inverse_transpose: Matrix4,
    pub light_position: [f32; 3],
    pub view_position: [f32; 3],
    pub color: [f32; 4],
    pub time: f32,
    pub metallic: f32,
    pub roughness: f32,
}

impl FrameUniforms {
    pub fn compute(camera: &CameraState, elapsed: f32, aspect: f32, config: &ViewerConfig) -> Self {
        let mut world = math::identity();
        math::rotate_x(&mut world, camera.rotation.x);
        math::rotate_y(&mut world, camera.rotation.y + elapsed * config.spin_rate);
        math::scale(&mut world, camera.zoom, camera.zoom, camera.zoom);

        let view = math::translation(0.0, 0.0, -config.camera_distance);
        let projection = math::perspective(config.fov_radians(), aspect, config.near, config.far);

        let mut world_view = math::IDENTITY;
        math::multiply(&world, &view, &mut world_view);
        let mut world_view_projection = math::IDENTITY;
        math::multiply(&world_view, &projection, &mut world_view_projection);

        let world_inverse_transpose = math::inverse(&world)
            .map(|inverse| math::transpose(&inverse))
            .unwrap_or(world);

        Self {
            world,
            world_view_projection,
            world_inverse_transpose,
            light_position: config.light_position.to_array(),
            view_position: [0.0, 0.0, config.camera_distance],
            color: config.base_color.to_array(),
            time: elapsed,
            metallic: config.metallic,
            roughness: config.roughness,
        }
    }

    pub fn upload<C: GpuContext>(&self, ctx: &mut C, program: &ShaderProgram) {
        program.set_uniform(ctx, "worldViewProjection", UniformValue::Mat4(&self.world_view_projection));
        program.set_uniform(ctx, "world", UniformValue::Mat4(&self.world));
        program.set_uniform(
            ctx,
            "worldInverseTranspose",
            UniformValue::Mat4(&self.world_inverse_transpose),
        );
        program.set_uniform(ctx, "lightWorldPosition", UniformValue::Vec3(self.light_position));
        program.set_uniform(ctx, "viewWorldPosition", UniformValue::Vec3(self.view_position));
        program.set_uniform(ctx, "color", UniformValue::Vec4(self.color));
        program.set_uniform(ctx, "time", UniformValue::Float(self.time));
        program.set_uniform(ctx, "metallic", UniformValue::Float(self.metallic));
        program.set_uniform(ctx, "roughness", UniformValue::Float(self.roughness));
    }
}

/// Clears, uploads uniforms, binds the mesh and draws it in one frame.
pub fn draw_frame<C: GpuContext>(
    ctx: &mut C,
    inputs: &DrawInputs<'_>,
    uniforms: &FrameUniforms,
) -> Result<(), DrawError> {
    ctx.begin_frame(&FrameState {
        clear_color: inputs.config.clear_color.to_array(),
        depth_test: true,
        cull_back_faces: true,
    })?;
    inputs.program.activate(ctx)?;
    uniforms.upload(ctx, inputs.program);
    inputs.buffers.bind_for_draw(ctx, inputs.program)?;
    ctx.draw_indexed(inputs.buffers.index_count())?;
    ctx.end_frame()
}

/// Frame counts reported by [`run_frames`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub rendered: usize,
    pub skipped: usize,
}

/// Drives up to `frames` ticks on a fixed timestep, stopping early once the loop stops.
pub fn run_frames<C: GpuContext>(
    handle: &mut EngineHandle<C>,
    frames: usize,
    frame_interval: Duration,
) -> FrameStats {
    let mut stats = FrameStats::default();
    let mut now = Duration::ZERO;
    for _ in 0..frames {
        if !handle.is_running() {
            break;
        }
        match handle.tick(now) {
            FrameOutcome::Rendered => stats.rendered += 1,
            FrameOutcome::Skipped => stats.skipped += 1,
            FrameOutcome::Stopped => break,
        }
        now += frame_interval;
    }
    stats
}
