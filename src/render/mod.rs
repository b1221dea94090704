pub mod buffers;
pub mod context;
pub mod frame;
pub mod gpu;
pub mod headless;
pub mod program;
pub mod reflect;
pub mod shaders;

pub use buffers::GpuBufferSet;
pub use context::{
    AttributeLocation, BufferHandle, BufferTarget, FrameState, GpuContext,
    ProgramHandle, ShaderHandle, ShaderStage, UniformLocation, UniformValue,
};
pub use frame::{
    run_frames, DrawInputs, FrameLoop, FrameOutcome, FrameStats, FrameUniforms, LoopState,
};
pub use gpu::WgpuContext;
pub use headless::{HeadlessContext, Ledger};
pub use program::ShaderProgram;
