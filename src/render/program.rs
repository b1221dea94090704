use std::collections::HashMap;

use log::{debug, error};

use super::context::{
    AttributeLocation, GpuContext, ProgramHandle, ShaderHandle, ShaderStage, UniformLocation,
    UniformValue,
};
use crate::error::{DrawError, EngineError};

pub const ATTRIBUTE_POSITION: &str = "position";
pub const ATTRIBUTE_NORMAL: &str = "normal";
pub const ATTRIBUTE_TEX_COORD: &str = "texCoord";

/// Vertex attributes looked up after every link.
pub const ATTRIBUTES: [&str; 3] = [ATTRIBUTE_POSITION, ATTRIBUTE_NORMAL, ATTRIBUTE_TEX_COORD];

/// Uniforms looked up after every link.
pub const UNIFORMS: [&str; 9] = [
    "worldViewProjection",
    "world",
    "worldInverseTranspose",
    "lightWorldPosition",
    "viewWorldPosition",
    "color",
    "time",
    "metallic",
    "roughness",
];

/// Creates and compiles one shader object.
///
/// On failure the shader object is deleted before the error is returned.
pub fn compile<C: GpuContext>(
    ctx: &mut C,
    source: &str,
    stage: ShaderStage,
) -> Result<ShaderHandle, EngineError> {
    let shader = ctx.create_shader(stage)?;
    if let Err(log) = ctx.compile_shader(shader, source) {
        ctx.delete_shader(shader);
        error!("{stage} shader failed to compile: {log}");
        return Err(EngineError::Compile { stage, log });
    }
    Ok(shader)
}

/// Links a compiled vertex/fragment pair and resolves the known locations.
///
/// On failure the program and both shaders are deleted.
pub fn link<C: GpuContext>(
    ctx: &mut C,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> Result<ShaderProgram, EngineError> {
    let handle = match ctx.create_program() {
        Ok(handle) => handle,
        Err(err) => {
            ctx.delete_shader(vertex);
            ctx.delete_shader(fragment);
            return Err(err);
        }
    };
    ctx.attach_shader(handle, vertex);
    ctx.attach_shader(handle, fragment);
    if let Err(log) = ctx.link_program(handle) {
        ctx.delete_program(handle);
        ctx.delete_shader(vertex);
        ctx.delete_shader(fragment);
        error!("shader program failed to link: {log}");
        return Err(EngineError::Link { log });
    }

    let mut attributes = HashMap::new();
    for name in ATTRIBUTES {
        match ctx.attribute_location(handle, name) {
            Some(location) => {
                attributes.insert(name, location);
            }
            None => debug!("attribute `{name}` is not active in the linked program"),
        }
    }
    let mut uniforms = HashMap::new();
    for name in UNIFORMS {
        match ctx.uniform_location(handle, name) {
            Some(location) => {
                uniforms.insert(name, location);
            }
            None => debug!("uniform `{name}` is not active in the linked program"),
        }
    }

    Ok(ShaderProgram {
        handle,
        shaders: [vertex, fragment],
        attributes,
        uniforms,
    })
}

/// A linked program with its attribute and uniform slots already looked up.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: ProgramHandle,
    shaders: [ShaderHandle; 2],
    attributes: HashMap<&'static str, AttributeLocation>,
    uniforms: HashMap<&'static str, UniformLocation>,
}

impl ShaderProgram {
    /// Compiles both stages and links them. Nothing stays allocated on failure.
    pub fn build<C: GpuContext>(
        ctx: &mut C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, EngineError> {
        let vertex = compile(ctx, vertex_source, ShaderStage::Vertex)?;
        let fragment = match compile(ctx, fragment_source, ShaderStage::Fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                ctx.delete_shader(vertex);
                return Err(err);
            }
        };
        link(ctx, vertex, fragment)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeLocation> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    pub fn activate<C: GpuContext>(&self, ctx: &mut C) -> Result<(), DrawError> {
        ctx.use_program(self.handle)
    }

    /// Uploads `value` if `name` resolved at link time; otherwise does nothing.
    pub fn set_uniform<C: GpuContext>(&self, ctx: &mut C, name: &str, value: UniformValue<'_>) {
        if let Some(location) = self.uniform(name) {
            ctx.set_uniform(location, value);
        }
    }

    pub fn release<C: GpuContext>(self, ctx: &mut C) {
        ctx.delete_program(self.handle);
        for shader in self.shaders {
            ctx.delete_shader(shader);
        }
    }
}
