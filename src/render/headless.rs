use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use super::context::{
    AttributeLocation, BufferHandle, BufferTarget, FrameState, GpuContext,
    ProgramHandle, ShaderHandle, ShaderStage, UniformLocation, UniformValue,
};
use super::reflect::{compile_wgsl, link_interfaces, LinkedInterface, StageInterface};
use crate::error::{DrawError, EngineError};

/// Off-screen backend that validates shaders and records every call.
///
/// Shaders go through the same WGSL front end as the GPU backend, so compile
/// and link behave identically; draws are checked and recorded instead of
/// rasterized. The [`Ledger`] is shared so callers can inspect it after the
/// context has been handed to an engine.
#[derive(Debug, Clone)]
pub struct HeadlessContext {
    ledger: Arc<Mutex<Ledger>>,
    size: (u32, u32),
    buffer_limit: Option<usize>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger::default())),
            size: (width.max(1), height.max(1)),
            buffer_limit: None,
        }
    }

    /// Refuses to create more than `limit` live buffers.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    /// Makes the next `count` draw calls fail.
    pub fn fail_next_draws(&self, count: usize) {
        self.ledger.lock().pending_draw_failures += count;
    }

    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

#[derive(Debug)]
struct ShaderRecord {
    stage: ShaderStage,
    interface: Option<StageInterface>,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<u32>,
    linked: Option<LinkedInterface>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRecord {
    pub target: BufferTarget,
    pub bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub buffer: BufferHandle,
    pub location: AttributeLocation,
    pub components: u32,
    pub stride: u32,
}

/// Everything issued between `begin_frame` and `end_frame`.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub state: FrameState,
    pub program: Option<ProgramHandle>,
    pub uniforms: HashMap<String, Vec<f32>>,
    pub attributes: Vec<AttributeBinding>,
    pub index_buffer: Option<BufferHandle>,
    pub draws: Vec<u32>,
}

impl FrameRecord {
    fn new(state: FrameState) -> Self {
        Self {
            state,
            program: None,
            uniforms: HashMap::new(),
            attributes: Vec::new(),
            index_buffer: None,
            draws: Vec::new(),
        }
    }
}

/// Live objects, creation counters and recorded frames.
#[derive(Debug, Default)]
pub struct Ledger {
    next_id: u32,
    shaders: HashMap<u32, ShaderRecord>,
    programs: HashMap<u32, ProgramRecord>,
    buffers: HashMap<u32, BufferRecord>,
    shaders_created: usize,
    programs_created: usize,
    buffers_created: usize,
    frames_presented: usize,
    current: Option<FrameRecord>,
    last_frame: Option<FrameRecord>,
    pending_draw_failures: usize,
}

impl Ledger {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_objects(&self) -> usize {
        self.live_shaders() + self.live_programs() + self.live_buffers()
    }

    pub fn shaders_created(&self) -> usize {
        self.shaders_created
    }

    pub fn programs_created(&self) -> usize {
        self.programs_created
    }

    pub fn buffers_created(&self) -> usize {
        self.buffers_created
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<BufferRecord> {
        self.buffers.get(&handle.0).copied()
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last_frame.as_ref()
    }

    /// Value uploaded for `name` in the frame in progress, or else the last presented one.
    pub fn frame_uniform(&self, name: &str) -> Option<Vec<f32>> {
        self.current
            .as_ref()
            .or(self.last_frame.as_ref())
            .and_then(|frame| frame.uniforms.get(name).cloned())
    }

    fn linked(&self, program: ProgramHandle) -> Option<&LinkedInterface> {
        self.programs.get(&program.0)?.linked.as_ref()
    }

    fn current_frame(&mut self) -> Result<&mut FrameRecord, DrawError> {
        self.current.as_mut().ok_or(DrawError::NoFrame)
    }

    fn require_buffer(&self, buffer: BufferHandle, target: BufferTarget) -> Result<BufferRecord, DrawError> {
        match self.buffers.get(&buffer.0) {
            Some(record) if record.target == target => Ok(*record),
            _ => Err(DrawError::UnknownHandle {
                kind: "buffer",
                id: buffer.0,
            }),
        }
    }
}

impl GpuContext for HeadlessContext {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderHandle, EngineError> {
        let mut ledger = self.ledger.lock();
        let id = ledger.allocate();
        ledger.shaders.insert(
            id,
            ShaderRecord {
                stage,
                interface: None,
            },
        );
        ledger.shaders_created += 1;
        Ok(ShaderHandle(id))
    }

    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> Result<(), String> {
        let mut ledger = self.ledger.lock();
        let record = ledger
            .shaders
            .get_mut(&shader.0)
            .ok_or_else(|| format!("unknown shader {}", shader.0))?;
        let (_, interface) = compile_wgsl(source, record.stage)?;
        record.interface = Some(interface);
        Ok(())
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.ledger.lock().shaders.remove(&shader.0);
    }

    fn create_program(&mut self) -> Result<ProgramHandle, EngineError> {
        let mut ledger = self.ledger.lock();
        let id = ledger.allocate();
        ledger.programs.insert(id, ProgramRecord::default());
        ledger.programs_created += 1;
        Ok(ProgramHandle(id))
    }

    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(record) = self.ledger.lock().programs.get_mut(&program.0) {
            record.attached.push(shader.0);
        }
    }

    fn link_program(&mut self, program: ProgramHandle) -> Result<(), String> {
        let mut ledger = self.ledger.lock();
        let attached = ledger
            .programs
            .get(&program.0)
            .map(|record| record.attached.clone())
            .ok_or_else(|| format!("unknown program {}", program.0))?;
        let stage_interface = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|id| ledger.shaders.get(id))
                .find(|record| record.stage == stage)
                .and_then(|record| record.interface.clone())
                .ok_or_else(|| format!("no compiled {stage} shader attached"))
        };
        let vertex = stage_interface(ShaderStage::Vertex)?;
        let fragment = stage_interface(ShaderStage::Fragment)?;
        let linked = link_interfaces(&vertex, &fragment)?;
        if let Some(record) = ledger.programs.get_mut(&program.0) {
            record.linked = Some(linked);
        }
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.ledger.lock().programs.remove(&program.0);
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeLocation> {
        let ledger = self.ledger.lock();
        let attribute = ledger.linked(program)?.attribute(name)?;
        Some(AttributeLocation(attribute.location))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let ledger = self.ledger.lock();
        let (index, _) = ledger.linked(program)?.uniforms.as_ref()?.member(name)?;
        Some(UniformLocation(index as u32))
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferHandle, EngineError> {
        let mut ledger = self.ledger.lock();
        if let Some(limit) = self.buffer_limit {
            if ledger.buffers.len() >= limit {
                return Err(EngineError::Resource(format!(
                    "buffer limit of {limit} reached"
                )));
            }
        }
        let id = ledger.allocate();
        ledger.buffers.insert(
            id,
            BufferRecord {
                target,
                bytes: data.len(),
            },
        );
        ledger.buffers_created += 1;
        Ok(BufferHandle(id))
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.ledger.lock().buffers.remove(&buffer.0);
    }

    fn begin_frame(&mut self, state: &FrameState) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        if ledger.current.is_some() {
            warn!("abandoning a frame that was never presented");
        }
        ledger.current = Some(FrameRecord::new(*state));
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        if ledger.linked(program).is_none() {
            return Err(DrawError::UnknownHandle {
                kind: "program",
                id: program.0,
            });
        }
        ledger.current_frame()?.program = Some(program);
        Ok(())
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>) {
        let mut ledger = self.ledger.lock();
        let Some(program) = ledger.current.as_ref().and_then(|frame| frame.program) else {
            warn!("uniform upload outside of a frame");
            return;
        };
        let Some(member) = ledger
            .linked(program)
            .and_then(|linked| linked.uniforms.as_ref())
            .and_then(|block| block.members.get(location.0 as usize))
            .cloned()
        else {
            warn!("uniform slot {} is not part of the active program", location.0);
            return;
        };
        let floats = value.as_floats();
        if floats.len() != member.kind.float_count() {
            warn!(
                "uniform `{}` expects {} floats, got {}",
                member.name,
                member.kind.float_count(),
                floats.len()
            );
            return;
        }
        if let Some(frame) = ledger.current.as_mut() {
            frame.uniforms.insert(member.name, floats.to_vec());
        }
    }

    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        components: u32,
        stride: u32,
    ) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        ledger.require_buffer(buffer, BufferTarget::Vertex)?;
        let frame = ledger.current_frame()?;
        frame.attributes.retain(|binding| binding.location != location);
        frame.attributes.push(AttributeBinding {
            buffer,
            location,
            components,
            stride,
        });
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        ledger.require_buffer(buffer, BufferTarget::Index)?;
        ledger.current_frame()?.index_buffer = Some(buffer);
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        if ledger.pending_draw_failures > 0 {
            ledger.pending_draw_failures -= 1;
            ledger.current = None;
            return Err(DrawError::Backend("injected draw failure".into()));
        }
        let frame = ledger.current.as_ref().ok_or(DrawError::NoFrame)?;
        if frame.program.is_none() {
            return Err(DrawError::Backend("draw without an active program".into()));
        }
        let index_buffer = frame
            .index_buffer
            .ok_or_else(|| DrawError::Backend("draw without an index buffer".into()))?;
        let record = ledger.require_buffer(index_buffer, BufferTarget::Index)?;
        if index_count as usize * std::mem::size_of::<u16>() > record.bytes {
            return Err(DrawError::Backend(format!(
                "{index_count} indices exceed index buffer of {} bytes",
                record.bytes
            )));
        }
        ledger.current_frame()?.draws.push(index_count);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DrawError> {
        let mut ledger = self.ledger.lock();
        let frame = ledger.current.take().ok_or(DrawError::NoFrame)?;
        ledger.last_frame = Some(frame);
        ledger.frames_presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE: FrameState = FrameState {
        clear_color: [0.0, 0.0, 0.0, 1.0],
        depth_test: true,
        cull_back_faces: true,
    };

    #[test]
    fn tracks_buffer_lifetimes() {
        let mut ctx = HeadlessContext::new(64, 64);
        let a = ctx
            .create_buffer(BufferTarget::Vertex, &[0; 12])
            .unwrap();
        let b = ctx
            .create_buffer(BufferTarget::Index, &[0; 6])
            .unwrap();
        let ledger = ctx.ledger();
        assert_eq!(ledger.lock().live_buffers(), 2);
        assert_eq!(ledger.lock().buffer(b).unwrap().bytes, 6);
        ctx.delete_buffer(a);
        ctx.delete_buffer(a);
        ctx.delete_buffer(b);
        assert_eq!(ledger.lock().live_buffers(), 0);
        assert_eq!(ledger.lock().buffers_created(), 2);
    }

    #[test]
    fn buffer_limit_is_enforced() {
        let mut ctx = HeadlessContext::new(64, 64).with_buffer_limit(1);
        ctx.create_buffer(BufferTarget::Vertex, &[0; 4])
            .unwrap();
        let err = ctx
            .create_buffer(BufferTarget::Vertex, &[0; 4])
            .unwrap_err();
        assert!(matches!(err, EngineError::Resource(_)));
    }

    #[test]
    fn draw_requires_a_frame() {
        let mut ctx = HeadlessContext::new(64, 64);
        assert!(matches!(ctx.draw_indexed(3), Err(DrawError::NoFrame)));
        assert!(matches!(ctx.end_frame(), Err(DrawError::NoFrame)));
    }

    #[test]
    fn binding_the_wrong_buffer_kind_fails() {
        let mut ctx = HeadlessContext::new(64, 64);
        let vertices = ctx
            .create_buffer(BufferTarget::Vertex, &[0; 12])
            .unwrap();
        ctx.begin_frame(&STATE).unwrap();
        assert!(matches!(
            ctx.bind_index_buffer(vertices),
            Err(DrawError::UnknownHandle { kind: "buffer", .. })
        ));
    }

    #[test]
    fn injected_failure_drops_the_frame() {
        let mut ctx = HeadlessContext::new(64, 64);
        ctx.fail_next_draws(1);
        ctx.begin_frame(&STATE).unwrap();
        assert!(ctx.draw_indexed(3).is_err());
        assert!(matches!(ctx.end_frame(), Err(DrawError::NoFrame)));
        assert_eq!(ctx.ledger().lock().frames_presented(), 0);
    }
}
