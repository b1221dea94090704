//! WGSL front end shared by the backends.
//!
//! Compiling a stage parses and validates it with naga and records its
//! interface: located inputs/outputs and the uniform block layout. Linking
//! checks that the fragment inputs are fed by vertex outputs and merges the
//! uniform blocks of both stages.

use naga::{AddressSpace, Binding, Module, TypeInner, VectorSize};

use super::ShaderStage;

/// A `@location` input or output of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    pub fn size(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }

    pub fn float_count(self) -> usize {
        self.size() as usize / 4
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// The single `var<uniform>` struct a stage reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<(usize, &UniformMember)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, member)| member.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct StageInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub uniforms: Option<UniformBlock>,
}

/// Interface of a linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub struct LinkedInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub attributes: Vec<Varying>,
    pub uniforms: Option<UniformBlock>,
}

impl LinkedInterface {
    pub fn attribute(&self, name: &str) -> Option<&Varying> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

/// Parses and validates `source`, requiring an entry point for `stage`.
pub fn compile_wgsl(source: &str, stage: ShaderStage) -> Result<(Module, StageInterface), String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| err.emit_to_string(source))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| err.as_inner().to_string())?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == wanted)
        .ok_or_else(|| format!("source has no @{stage} entry point"))?;

    let mut inputs = Vec::new();
    for argument in &entry.function.arguments {
        collect_varyings(
            &module,
            argument.name.as_deref(),
            argument.ty,
            argument.binding.as_ref(),
            &mut inputs,
        );
    }
    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }
    inputs.sort_by_key(|varying| varying.location);
    outputs.sort_by_key(|varying| varying.location);

    let interface = StageInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms: uniform_block(&module),
    };
    Ok((module, interface))
}

/// Checks that `fragment` consumes only what `vertex` produces and merges uniforms.
pub fn link_interfaces(
    vertex: &StageInterface,
    fragment: &StageInterface,
) -> Result<LinkedInterface, String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err("program needs exactly one vertex and one fragment shader".into());
    }

    for input in &fragment.inputs {
        let output = vertex
            .outputs
            .iter()
            .find(|output| output.location == input.location)
            .ok_or_else(|| {
                format!(
                    "fragment input `{}` at location {} is not written by the vertex stage",
                    input.name, input.location
                )
            })?;
        if output.components != input.components {
            return Err(format!(
                "location {} is vec{} in the vertex stage but vec{} in the fragment stage",
                input.location, output.components, input.components
            ));
        }
    }

    let uniforms = match (&vertex.uniforms, &fragment.uniforms) {
        (Some(v), Some(f)) => Some(merge_blocks(v, f)?),
        (Some(block), None) | (None, Some(block)) => Some(block.clone()),
        (None, None) => None,
    };

    Ok(LinkedInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes: vertex.inputs.clone(),
        uniforms,
    })
}

fn merge_blocks(vertex: &UniformBlock, fragment: &UniformBlock) -> Result<UniformBlock, String> {
    if (vertex.group, vertex.binding) != (fragment.group, fragment.binding) {
        return Err(format!(
            "uniform block bound at @group({}) @binding({}) in the vertex stage but @group({}) @binding({}) in the fragment stage",
            vertex.group, vertex.binding, fragment.group, fragment.binding
        ));
    }
    let mut merged = vertex.clone();
    merged.size = vertex.size.max(fragment.size);
    for member in &fragment.members {
        match vertex.member(&member.name) {
            Some((_, existing)) if existing != member => {
                return Err(format!(
                    "uniform `{}` has a different layout in each stage",
                    member.name
                ));
            }
            Some(_) => {}
            None => merged.members.push(member.clone()),
        }
    }
    Ok(merged)
}

fn collect_varyings(
    module: &Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            if let Some(components) = component_count(&module.types[ty].inner) {
                out.push(Varying {
                    name: name.unwrap_or_default().to_string(),
                    location: *location,
                    components,
                });
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn component_count(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(_) => Some(1),
        TypeInner::Vector { size, .. } => Some(*size as u32),
        _ => None,
    }
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match inner {
        TypeInner::Scalar(_) => Some(UniformKind::Float),
        TypeInner::Vector {
            size: VectorSize::Tri,
            ..
        } => Some(UniformKind::Vec3),
        TypeInner::Vector {
            size: VectorSize::Quad,
            ..
        } => Some(UniformKind::Vec4),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => Some(UniformKind::Mat4),
        _ => None,
    }
}

fn uniform_block(module: &Module) -> Option<UniformBlock> {
    let (_, variable) = module
        .global_variables
        .iter()
        .find(|(_, variable)| variable.space == AddressSpace::Uniform)?;
    let binding = variable.binding.as_ref()?;
    let TypeInner::Struct { members, span } = &module.types[variable.ty].inner else {
        return None;
    };
    let members = members
        .iter()
        .filter_map(|member| {
            let name = member.name.clone()?;
            let kind = uniform_kind(&module.types[member.ty].inner)?;
            Some(UniformMember {
                name,
                offset: member.offset,
                kind,
            })
        })
        .collect();
    Some(UniformBlock {
        group: binding.group,
        binding: binding.binding,
        size: *span,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};

    fn compile(source: &str, stage: ShaderStage) -> StageInterface {
        compile_wgsl(source, stage).unwrap().1
    }

    #[test]
    fn vertex_stage_exposes_named_attributes() {
        let vertex = compile(VERTEX_SHADER, ShaderStage::Vertex);
        let names: Vec<_> = vertex
            .inputs
            .iter()
            .map(|v| (v.name.as_str(), v.location, v.components))
            .collect();
        assert_eq!(
            names,
            vec![("position", 0, 3), ("normal", 1, 3), ("texCoord", 2, 2)]
        );
        assert_eq!(vertex.entry_point, "vs_main");
    }

    #[test]
    fn uniform_layout_is_reflected() {
        let vertex = compile(VERTEX_SHADER, ShaderStage::Vertex);
        let block = vertex.uniforms.unwrap();
        assert_eq!((block.group, block.binding), (0, 0));
        let (_, world) = block.member("world").unwrap();
        assert_eq!(world.offset, 64);
        assert_eq!(world.kind, UniformKind::Mat4);
        let (_, time) = block.member("time").unwrap();
        assert_eq!(time.kind, UniformKind::Float);
        let (_, light) = block.member("lightWorldPosition").unwrap();
        assert_eq!(light.kind, UniformKind::Vec3);
        assert!(block.size >= 244);
        assert_eq!(block.size % 16, 0);
    }

    #[test]
    fn shipped_stages_link() {
        let vertex = compile(VERTEX_SHADER, ShaderStage::Vertex);
        let fragment = compile(FRAGMENT_SHADER, ShaderStage::Fragment);
        let linked = link_interfaces(&vertex, &fragment).unwrap();
        assert_eq!(linked.attribute("texCoord").unwrap().location, 2);
        assert_eq!(linked.uniforms.unwrap().members.len(), 9);
        assert_eq!(linked.fragment_entry, "fs_main");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = compile_wgsl("fn broken( {", ShaderStage::Vertex).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_wgsl(FRAGMENT_SHADER, ShaderStage::Vertex).unwrap_err();
        assert!(err.contains("@vertex"));
    }

    #[test]
    fn unfed_fragment_input_fails_to_link() {
        let vertex = compile(
            r#"
@vertex
fn main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#,
            ShaderStage::Vertex,
        );
        let fragment = compile(FRAGMENT_SHADER, ShaderStage::Fragment);
        let err = link_interfaces(&vertex, &fragment).unwrap_err();
        assert!(err.contains("location 0"));
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let vertex = compile(VERTEX_SHADER, ShaderStage::Vertex);
        assert!(link_interfaces(&vertex, &vertex).is_err());
    }
}
