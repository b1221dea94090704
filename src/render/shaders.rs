//! WGSL sources for the single vertex/fragment pair.
//!
//! Both stages declare the same uniform block so either can be reflected for
//! uniform slots.

macro_rules! uniform_block {
    () => {
        r#"
struct Uniforms {
    worldViewProjection: mat4x4<f32>,
    world: mat4x4<f32>,
    worldInverseTranspose: mat4x4<f32>,
    lightWorldPosition: vec3<f32>,
    time: f32,
    viewWorldPosition: vec3<f32>,
    metallic: f32,
    color: vec4<f32>,
    roughness: f32,
}

@group(0) @binding(0)
var<uniform> u: Uniforms;
"#
    };
}

pub const VERTEX_SHADER: &str = concat!(
    uniform_block!(),
    r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texCoord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) worldPosition: vec3<f32>,
    @location(1) worldNormal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = u.world * vec4<f32>(input.position, 1.0);
    var clip = u.worldViewProjection * vec4<f32>(input.position, 1.0);
    // GL-style depth in [-w, w] remapped to [0, w].
    clip.z = (clip.z + clip.w) * 0.5;
    out.clip = clip;
    out.worldPosition = world.xyz;
    out.worldNormal = (u.worldInverseTranspose * vec4<f32>(input.normal, 0.0)).xyz;
    out.uv = input.texCoord;
    return out;
}
"#
);

pub const FRAGMENT_SHADER: &str = concat!(
    uniform_block!(),
    r#"
struct FragmentInput {
    @location(0) worldPosition: vec3<f32>,
    @location(1) worldNormal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@fragment
fn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {
    let normal = normalize(input.worldNormal);
    let to_light = normalize(u.lightWorldPosition - input.worldPosition);
    let to_view = normalize(u.viewWorldPosition - input.worldPosition);
    let half_dir = normalize(to_light + to_view);

    let diffuse = max(dot(normal, to_light), 0.0);
    let shininess = mix(128.0, 4.0, clamp(u.roughness, 0.0, 1.0));
    let specular = pow(max(dot(normal, half_dir), 0.0), shininess);
    let specular_tint = mix(vec3<f32>(0.04), u.color.rgb, vec3<f32>(u.metallic));

    let pulse = 0.9 + 0.1 * sin(u.time * 2.0 + input.uv.y * 6.2831853);
    let base = u.color.rgb * (0.2 + diffuse * (1.0 - u.metallic * 0.5)) * pulse;
    return vec4<f32>(base + specular_tint * specular, u.color.a);
}
"#
);
