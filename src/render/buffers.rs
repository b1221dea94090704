use log::debug;

use super::context::{BufferHandle, BufferTarget, GpuContext};
use super::program::{ShaderProgram, ATTRIBUTE_NORMAL, ATTRIBUTE_POSITION, ATTRIBUTE_TEX_COORD};
use crate::error::{DrawError, EngineError};
use crate::geometry::GeometryData;

/// One vertex stream: which attribute it feeds and how many floats per vertex.
#[derive(Debug, Clone, Copy)]
struct Stream {
    attribute: &'static str,
    buffer: BufferHandle,
    components: u32,
}

/// Position, normal and texCoord streams plus the u16 index buffer of one mesh.
#[derive(Debug)]
pub struct GpuBufferSet {
    streams: [Stream; 3],
    indices: BufferHandle,
    index_count: u32,
}

impl GpuBufferSet {
    /// Uploads every stream once with a static-draw hint.
    ///
    /// If any buffer cannot be created the ones already created are deleted.
    pub fn upload<C: GpuContext>(ctx: &mut C, geometry: &GeometryData) -> Result<Self, EngineError> {
        let mut created = Vec::with_capacity(4);
        let position = create(
            ctx,
            &mut created,
            BufferTarget::Vertex,
            bytemuck::cast_slice(&geometry.positions),
        )?;
        let normal = create(
            ctx,
            &mut created,
            BufferTarget::Vertex,
            bytemuck::cast_slice(&geometry.normals),
        )?;
        let tex_coord = create(
            ctx,
            &mut created,
            BufferTarget::Vertex,
            bytemuck::cast_slice(&geometry.tex_coords),
        )?;
        let indices = create(
            ctx,
            &mut created,
            BufferTarget::Index,
            bytemuck::cast_slice(&geometry.indices),
        )?;

        debug!(
            "uploaded {} vertices and {} indices",
            geometry.vertex_count(),
            geometry.indices.len()
        );
        Ok(Self {
            streams: [
                Stream {
                    attribute: ATTRIBUTE_POSITION,
                    buffer: position,
                    components: 3,
                },
                Stream {
                    attribute: ATTRIBUTE_NORMAL,
                    buffer: normal,
                    components: 3,
                },
                Stream {
                    attribute: ATTRIBUTE_TEX_COORD,
                    buffer: tex_coord,
                    components: 2,
                },
            ],
            indices,
            index_count: geometry.indices.len() as u32,
        })
    }

    /// Binds every stream whose attribute is active in `program`, then the index buffer.
    pub fn bind_for_draw<C: GpuContext>(
        &self,
        ctx: &mut C,
        program: &ShaderProgram,
    ) -> Result<(), DrawError> {
        for stream in &self.streams {
            if let Some(location) = program.attribute(stream.attribute) {
                ctx.bind_attribute(stream.buffer, location, stream.components, 0)?;
            }
        }
        ctx.bind_index_buffer(self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn release<C: GpuContext>(self, ctx: &mut C) {
        for stream in self.streams {
            ctx.delete_buffer(stream.buffer);
        }
        ctx.delete_buffer(self.indices);
    }
}

/// Creates one static buffer, deleting everything in `created` if that fails.
fn create<C: GpuContext>(
    ctx: &mut C,
    created: &mut Vec<BufferHandle>,
    target: BufferTarget,
    data: &[u8],
) -> Result<BufferHandle, EngineError> {
    match ctx.create_buffer(target, data) {
        Ok(buffer) => {
            created.push(buffer);
            Ok(buffer)
        }
        Err(err) => {
            for buffer in created.drain(..) {
                ctx.delete_buffer(buffer);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, GeometryKind};
    use crate::render::headless::HeadlessContext;
    use crate::render::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};
    use crate::render::FrameState;

    #[test]
    fn uploads_four_static_buffers() {
        let mut ctx = HeadlessContext::new(800, 600);
        let cube = build(GeometryKind::Cube);
        let buffers = GpuBufferSet::upload(&mut ctx, &cube).unwrap();
        assert_eq!(buffers.index_count(), 12);

        let ledger = ctx.ledger();
        {
            let ledger = ledger.lock();
            assert_eq!(ledger.live_buffers(), 4);
            let position = ledger.buffer(buffers.streams[0].buffer).unwrap();
            assert_eq!(position.bytes, 8 * 3 * 4);
            assert_eq!(position.target, BufferTarget::Vertex);
            let tex = ledger.buffer(buffers.streams[2].buffer).unwrap();
            assert_eq!(tex.bytes, 8 * 2 * 4);
            let indices = ledger.buffer(buffers.indices).unwrap();
            assert_eq!(indices.target, BufferTarget::Index);
            assert_eq!(indices.bytes, 12 * 2);
        }

        buffers.release(&mut ctx);
        assert_eq!(ledger.lock().live_buffers(), 0);
    }

    #[test]
    fn partial_upload_failure_leaks_nothing() {
        let mut ctx = HeadlessContext::new(800, 600).with_buffer_limit(2);
        let tower = build(GeometryKind::Tower);
        let err = GpuBufferSet::upload(&mut ctx, &tower).unwrap_err();
        assert!(matches!(err, EngineError::Resource(_)));
        let ledger = ctx.ledger();
        assert_eq!(ledger.lock().live_buffers(), 0);
        assert_eq!(ledger.lock().buffers_created(), 2);
    }

    #[test]
    fn binds_streams_with_their_component_counts() {
        let mut ctx = HeadlessContext::new(800, 600);
        let program = ShaderProgram::build(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
        let buffers = GpuBufferSet::upload(&mut ctx, &build(GeometryKind::Turbine)).unwrap();

        ctx.begin_frame(&FrameState {
            clear_color: [0.0; 4],
            depth_test: true,
            cull_back_faces: true,
        })
        .unwrap();
        program.activate(&mut ctx).unwrap();
        buffers.bind_for_draw(&mut ctx, &program).unwrap();
        ctx.draw_indexed(buffers.index_count()).unwrap();
        ctx.end_frame().unwrap();

        let ledger = ctx.ledger();
        let ledger = ledger.lock();
        let frame = ledger.last_frame().unwrap();
        let mut components: Vec<_> = frame
            .attributes
            .iter()
            .map(|binding| (binding.location.0, binding.components, binding.stride))
            .collect();
        components.sort();
        assert_eq!(components, vec![(0, 3, 0), (1, 3, 0), (2, 2, 0)]);
        assert_eq!(frame.index_buffer, Some(buffers.indices));
        assert_eq!(frame.draws, vec![buffers.index_count()]);
    }
}
