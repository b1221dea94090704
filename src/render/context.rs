use std::fmt;

use crate::error::{DrawError, EngineError};
use crate::math::Matrix4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Vertex input slot resolved from a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Opaque uniform slot, only meaningful for the program it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Mat4(&'a Matrix4),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Float(f32),
}

impl UniformValue<'_> {
    pub fn as_floats(&self) -> &[f32] {
        match self {
            Self::Mat4(m) => &m[..],
            Self::Vec3(v) => &v[..],
            Self::Vec4(v) => &v[..],
            Self::Float(v) => std::slice::from_ref(v),
        }
    }
}

/// Fixed-function state requested at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub clear_color: [f32; 4],
    pub depth_test: bool,
    pub cull_back_faces: bool,
}

/// Immediate-mode graphics API the engine renders through.
///
/// Object lifetimes are explicit: every `create_*` must be paired with the
/// matching `delete_*`, and deleting a handle twice is a no-op. Compile and
/// link report the backend's info log on failure but leave the object alive,
/// so the caller decides what to release.
pub trait GpuContext {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderHandle, EngineError>;
    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> Result<(), String>;
    fn delete_shader(&mut self, shader: ShaderHandle);

    fn create_program(&mut self) -> Result<ProgramHandle, EngineError>;
    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&mut self, program: ProgramHandle) -> Result<(), String>;
    fn delete_program(&mut self, program: ProgramHandle);

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeLocation>;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Creates a buffer filled once with `data`; contents never change afterwards.
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferHandle, EngineError>;
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Starts a frame: clears colour and depth and applies `state`.
    fn begin_frame(&mut self, state: &FrameState) -> Result<(), DrawError>;
    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DrawError>;
    /// Uploads a value for the program selected by `use_program`.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>);
    /// Binds `buffer` to `location`; `stride` 0 means tightly packed.
    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        components: u32,
        stride: u32,
    ) -> Result<(), DrawError>;
    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), DrawError>;
    /// Draws `index_count` u16 indices as a triangle list.
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), DrawError>;
    /// Submits the frame and presents it.
    fn end_frame(&mut self) -> Result<(), DrawError>;

    /// Resizes the drawable. Only called between teardown and the next setup.
    fn resize(&mut self, width: u32, height: u32);
}
