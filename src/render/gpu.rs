use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use wgpu::util::DeviceExt;

use super::context::{
    AttributeLocation, BufferHandle, BufferTarget, FrameState, GpuContext,
    ProgramHandle, ShaderHandle, ShaderStage, UniformLocation, UniformValue,
};
use super::reflect::{compile_wgsl, link_interfaces, LinkedInterface, StageInterface};
use crate::error::{DrawError, EngineError};

/// [`GpuContext`] backed by wgpu.
///
/// Compiling parses and validates WGSL with naga; linking builds a render
/// pipeline with one vertex buffer slot per reflected attribute and a single
/// uniform buffer laid out after the reflected block. Draws issued between
/// `begin_frame` and `end_frame` are recorded and replayed in one render pass.
/// Depth testing and back-face culling are part of every pipeline.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    next_id: u32,
    shaders: HashMap<u32, CompiledShader>,
    programs: HashMap<u32, GpuProgram>,
    buffers: HashMap<u32, GpuBuffer>,
    frame: Option<PendingFrame>,
}

struct CompiledShader {
    stage: ShaderStage,
    compiled: Option<(String, StageInterface)>,
}

#[derive(Default)]
struct GpuProgram {
    attached: Vec<u32>,
    linked: Option<LinkedProgram>,
}

struct LinkedProgram {
    interface: LinkedInterface,
    pipeline: wgpu::RenderPipeline,
    uniforms: Option<UniformStorage>,
    /// Attribute location of each vertex buffer slot.
    slots: Vec<u32>,
}

struct UniformStorage {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    staging: Vec<u8>,
    dirty: bool,
}

struct GpuBuffer {
    target: BufferTarget,
    buffer: wgpu::Buffer,
    len: u64,
}

struct PendingFrame {
    clear: wgpu::Color,
    program: Option<u32>,
    vertex: HashMap<u32, u32>,
    index: Option<u32>,
    draws: Vec<PendingDraw>,
}

struct PendingDraw {
    program: u32,
    vertex: Vec<(u32, u32)>,
    index: u32,
    count: u32,
}

impl WgpuContext {
    /// Connects to a GPU and configures `target` for presentation.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        Self::connect(target.into(), width.max(1), height.max(1))
            .await
            .map_err(|err| EngineError::Setup(format!("{err:#}")))
    }

    async fn connect(target: wgpu::SurfaceTarget<'static>, width: u32, height: u32) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(target)
            .context("failed to create drawing surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("mechviz-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;
        device.on_uncaptured_error(Box::new(|err| error!("GPU error: {err}")));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth = DepthBuffer::create(&device, width, height);

        info!(
            "GPU context ready on {} ({width}x{height}, {format:?})",
            adapter.get_info().name
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            next_id: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            frame: None,
        })
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn linked(&self, program: ProgramHandle) -> Option<&LinkedProgram> {
        self.programs.get(&program.0)?.linked.as_ref()
    }

    fn stage_source(&self, attached: &[u32], stage: ShaderStage) -> Result<(String, StageInterface), String> {
        attached
            .iter()
            .filter_map(|id| self.shaders.get(id))
            .find(|shader| shader.stage == stage)
            .and_then(|shader| shader.compiled.clone())
            .ok_or_else(|| format!("no compiled {stage} shader attached"))
    }

    fn build_pipeline(
        &self,
        vertex_source: &str,
        fragment_source: &str,
        interface: &LinkedInterface,
    ) -> Result<LinkedProgram, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mechviz-vertex"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(vertex_source)),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mechviz-fragment"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(fragment_source)),
        });

        let mut layouts = Vec::new();
        let mut uniforms = None;
        if let Some(block) = &interface.uniforms {
            if block.group != 0 {
                let _ = self.device.pop_error_scope();
                return Err(format!("uniform block must use @group(0), found @group({})", block.group));
            }
            let size = u64::from(block.size).next_multiple_of(16);
            let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mechviz-uniform-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("mechviz-uniforms"),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mechviz-uniform-group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: block.binding,
                    resource: buffer.as_entire_binding(),
                }],
            });
            uniforms = Some(UniformStorage {
                buffer,
                bind_group,
                staging: vec![0; size as usize],
                dirty: true,
            });
            layouts.push(layout);
        }
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().collect();
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mechviz-pipeline-layout"),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let slots: Vec<u32> = interface.attributes.iter().map(|a| a.location).collect();
        let attributes: Vec<wgpu::VertexAttribute> = interface
            .attributes
            .iter()
            .map(|attribute| wgpu::VertexAttribute {
                format: vertex_format(attribute.components),
                offset: 0,
                shader_location: attribute.location,
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = interface
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(attribute, layout)| wgpu::VertexBufferLayout {
                array_stride: u64::from(attribute.components) * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: std::slice::from_ref(layout),
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mechviz-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: &interface.vertex_entry,
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: &interface.fragment_entry,
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        if let Some(err) = pop_validation_error(&self.device) {
            return Err(err);
        }
        Ok(LinkedProgram {
            interface: interface.clone(),
            pipeline,
            uniforms,
            slots,
        })
    }

    fn present(&mut self, frame: PendingFrame) -> Result<(), DrawError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) => {
                if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    self.surface.configure(&self.device, &self.config);
                }
                return Err(surface_error(err));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for draw in &frame.draws {
            let Some(storage) = self
                .programs
                .get_mut(&draw.program)
                .and_then(|program| program.linked.as_mut())
                .and_then(|linked| linked.uniforms.as_mut())
            else {
                continue;
            };
            if storage.dirty {
                self.queue.write_buffer(&storage.buffer, 0, &storage.staging);
                storage.dirty = false;
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mechviz-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mechviz-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &frame.draws {
                let Some(linked) = self
                    .programs
                    .get(&draw.program)
                    .and_then(|program| program.linked.as_ref())
                else {
                    warn!("program {} was deleted before the frame was presented", draw.program);
                    continue;
                };
                let Some(index) = self.buffers.get(&draw.index) else {
                    warn!("index buffer {} was deleted before the frame was presented", draw.index);
                    continue;
                };
                pass.set_pipeline(&linked.pipeline);
                if let Some(storage) = &linked.uniforms {
                    pass.set_bind_group(0, &storage.bind_group, &[]);
                }
                for (slot, buffer) in &draw.vertex {
                    if let Some(vertex) = self.buffers.get(buffer) {
                        pass.set_vertex_buffer(*slot, vertex.buffer.slice(..));
                    }
                }
                pass.set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl GpuContext for WgpuContext {
    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderHandle, EngineError> {
        let id = self.allocate();
        self.shaders.insert(
            id,
            CompiledShader {
                stage,
                compiled: None,
            },
        );
        Ok(ShaderHandle(id))
    }

    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> Result<(), String> {
        let record = self
            .shaders
            .get_mut(&shader.0)
            .ok_or_else(|| format!("unknown shader {}", shader.0))?;
        let (_, interface) = compile_wgsl(source, record.stage)?;
        record.compiled = Some((source.to_owned(), interface));
        Ok(())
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader.0);
    }

    fn create_program(&mut self) -> Result<ProgramHandle, EngineError> {
        let id = self.allocate();
        self.programs.insert(id, GpuProgram::default());
        Ok(ProgramHandle(id))
    }

    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) {
        if let Some(record) = self.programs.get_mut(&program.0) {
            record.attached.push(shader.0);
        }
    }

    fn link_program(&mut self, program: ProgramHandle) -> Result<(), String> {
        let attached = self
            .programs
            .get(&program.0)
            .map(|record| record.attached.clone())
            .ok_or_else(|| format!("unknown program {}", program.0))?;
        let (vertex_source, vertex) = self.stage_source(&attached, ShaderStage::Vertex)?;
        let (fragment_source, fragment) = self.stage_source(&attached, ShaderStage::Fragment)?;
        let interface = link_interfaces(&vertex, &fragment)?;
        let linked = self.build_pipeline(&vertex_source, &fragment_source, &interface)?;
        debug!(
            "linked program {} with {} vertex slots",
            program.0,
            linked.slots.len()
        );
        if let Some(record) = self.programs.get_mut(&program.0) {
            record.linked = Some(linked);
        }
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<AttributeLocation> {
        let attribute = self.linked(program)?.interface.attribute(name)?;
        Some(AttributeLocation(attribute.location))
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let (index, _) = self.linked(program)?.interface.uniforms.as_ref()?.member(name)?;
        Some(UniformLocation(index as u32))
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferHandle, EngineError> {
        let flags = match target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        };
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(match target {
                    BufferTarget::Vertex => "mechviz-vertex-stream",
                    BufferTarget::Index => "mechviz-indices",
                }),
                contents: data,
                usage: flags,
            });
        if let Some(err) = pop_validation_error(&self.device) {
            return Err(EngineError::Resource(err));
        }
        let id = self.allocate();
        self.buffers.insert(
            id,
            GpuBuffer {
                target,
                buffer,
                len: data.len() as u64,
            },
        );
        Ok(BufferHandle(id))
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(record) = self.buffers.remove(&buffer.0) {
            record.buffer.destroy();
        }
    }

    fn begin_frame(&mut self, state: &FrameState) -> Result<(), DrawError> {
        if self.frame.is_some() {
            warn!("abandoning a frame that was never presented");
        }
        if !state.depth_test || !state.cull_back_faces {
            debug!("pipelines always depth test and cull back faces");
        }
        let [r, g, b, a] = state.clear_color.map(f64::from);
        self.frame = Some(PendingFrame {
            clear: wgpu::Color { r, g, b, a },
            program: None,
            vertex: HashMap::new(),
            index: None,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DrawError> {
        if self.linked(program).is_none() {
            return Err(DrawError::UnknownHandle {
                kind: "program",
                id: program.0,
            });
        }
        let frame = self.frame.as_mut().ok_or(DrawError::NoFrame)?;
        frame.program = Some(program.0);
        Ok(())
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue<'_>) {
        let Some(program) = self.frame.as_ref().and_then(|frame| frame.program) else {
            warn!("uniform upload outside of a frame");
            return;
        };
        let Some(linked) = self
            .programs
            .get_mut(&program)
            .and_then(|record| record.linked.as_mut())
        else {
            return;
        };
        let (Some(block), Some(storage)) = (&linked.interface.uniforms, &mut linked.uniforms) else {
            return;
        };
        let Some(member) = block.members.get(location.0 as usize) else {
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
        let bytes: &[u8] = bytemuck::cast_slice(floats);
        let start = member.offset as usize;
        if let Some(slot) = storage.staging.get_mut(start..start + bytes.len()) {
            slot.copy_from_slice(bytes);
            storage.dirty = true;
        }
    }

    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        _components: u32,
        _stride: u32,
    ) -> Result<(), DrawError> {
        match self.buffers.get(&buffer.0) {
            Some(record) if record.target == BufferTarget::Vertex => {}
            _ => {
                return Err(DrawError::UnknownHandle {
                    kind: "buffer",
                    id: buffer.0,
                })
            }
        }
        let frame = self.frame.as_mut().ok_or(DrawError::NoFrame)?;
        frame.vertex.insert(location.0, buffer.0);
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), DrawError> {
        match self.buffers.get(&buffer.0) {
            Some(record) if record.target == BufferTarget::Index => {}
            _ => {
                return Err(DrawError::UnknownHandle {
                    kind: "buffer",
                    id: buffer.0,
                })
            }
        }
        let frame = self.frame.as_mut().ok_or(DrawError::NoFrame)?;
        frame.index = Some(buffer.0);
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), DrawError> {
        let frame = self.frame.as_ref().ok_or(DrawError::NoFrame)?;
        let program = frame
            .program
            .ok_or_else(|| DrawError::Backend("draw without an active program".into()))?;
        let index = frame
            .index
            .ok_or_else(|| DrawError::Backend("draw without an index buffer".into()))?;
        let linked = self
            .programs
            .get(&program)
            .and_then(|record| record.linked.as_ref())
            .ok_or(DrawError::UnknownHandle {
                kind: "program",
                id: program,
            })?;
        let index_len = self.buffers.get(&index).map_or(0, |record| record.len);
        if u64::from(index_count) * 2 > index_len {
            return Err(DrawError::Backend(format!(
                "{index_count} indices exceed index buffer of {index_len} bytes"
            )));
        }
        let mut vertex = Vec::with_capacity(linked.slots.len());
        for (slot, location) in linked.slots.iter().enumerate() {
            let buffer = frame.vertex.get(location).ok_or_else(|| {
                DrawError::Backend(format!("no buffer bound to attribute location {location}"))
            })?;
            vertex.push((slot as u32, *buffer));
        }
        let draw = PendingDraw {
            program,
            vertex,
            index,
            count: index_count,
        };
        if let Some(frame) = self.frame.as_mut() {
            frame.draws.push(draw);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DrawError> {
        let frame = self.frame.take().ok_or(DrawError::NoFrame)?;
        self.present(frame)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, width, height);
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn surface_error(err: wgpu::SurfaceError) -> DrawError {
    match err {
        wgpu::SurfaceError::Lost => DrawError::SurfaceLost,
        wgpu::SurfaceError::Outdated => DrawError::SurfaceOutdated,
        wgpu::SurfaceError::Timeout => DrawError::Timeout,
        wgpu::SurfaceError::OutOfMemory => DrawError::OutOfMemory,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn pop_validation_error(device: &wgpu::Device) -> Option<String> {
    pollster::block_on(device.pop_error_scope()).map(|err| err.to_string())
}

// Browsers resolve error scopes asynchronously; failures reach the
// uncaptured error handler instead.
#[cfg(target_arch = "wasm32")]
fn pop_validation_error(device: &wgpu::Device) -> Option<String> {
    drop(device.pop_error_scope());
    None
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("mechviz-depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_formats_follow_component_count() {
        assert_eq!(vertex_format(2), wgpu::VertexFormat::Float32x2);
        assert_eq!(vertex_format(3), wgpu::VertexFormat::Float32x3);
    }

    #[test]
    fn surface_errors_map_to_draw_errors() {
        assert!(matches!(
            surface_error(wgpu::SurfaceError::Lost),
            DrawError::SurfaceLost
        ));
        assert!(matches!(
            surface_error(wgpu::SurfaceError::Timeout),
            DrawError::Timeout
        ));
    }
}
