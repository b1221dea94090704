use std::f32::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TOWER_SEGMENTS: u16 = 16;
pub const TOWER_HEIGHT: f32 = 2.0;
pub const TOWER_RADIUS: f32 = 0.2;

pub const TURBINE_BLADES: u16 = 8;
pub const TURBINE_HUB_RADIUS: f32 = 0.1;
pub const TURBINE_BLADE_LENGTH: f32 = 1.5;

/// Procedural shapes the viewer knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Tower,
    Turbine,
    Cube,
}

impl GeometryKind {
    /// Maps the host page selector onto a shape. Unknown selectors fall back to the cube.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim() {
            "kpp-system" | "tower" => Self::Tower,
            "turbine" => Self::Turbine,
            _ => Self::Cube,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tower => "tower",
            Self::Turbine => "turbine",
            Self::Cube => "cube",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("{positions} position floats but {normals} normal floats")]
    NormalMismatch { positions: usize, normals: usize },
    #[error("expected {expected} texture coordinate floats, found {found}")]
    TexCoordMismatch { expected: usize, found: usize },
    #[error("position array length {0} is not a multiple of 3")]
    RaggedPositions(usize),
    #[error("index count {0} is not a multiple of 3")]
    RaggedIndices(usize),
    #[error("index {index} at slot {slot} exceeds vertex count {vertices}")]
    IndexOutOfRange {
        slot: usize,
        index: u16,
        vertices: usize,
    },
}

/// Vertex streams and triangle indices for one mesh.
///
/// Positions and normals hold three floats per vertex, texture coordinates
/// two. The data is never modified once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Checks stream lengths and that every index references a vertex.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.positions.len() % 3 != 0 {
            return Err(GeometryError::RaggedPositions(self.positions.len()));
        }
        if self.positions.len() != self.normals.len() {
            return Err(GeometryError::NormalMismatch {
                positions: self.positions.len(),
                normals: self.normals.len(),
            });
        }
        let vertices = self.vertex_count();
        if self.tex_coords.len() != vertices * 2 {
            return Err(GeometryError::TexCoordMismatch {
                expected: vertices * 2,
                found: self.tex_coords.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::RaggedIndices(self.indices.len()));
        }
        if let Some((slot, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index as usize >= vertices)
        {
            return Err(GeometryError::IndexOutOfRange {
                slot,
                index,
                vertices,
            });
        }
        Ok(())
    }

    fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u16 {
        let index = self.vertex_count() as u16;
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.tex_coords.extend_from_slice(&uv);
        index
    }

    fn push_triangle(&mut self, a: u16, b: u16, c: u16) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

pub fn build(kind: GeometryKind) -> GeometryData {
    match kind {
        GeometryKind::Tower => tower(),
        GeometryKind::Turbine => turbine(),
        GeometryKind::Cube => cube(),
    }
}

/// Open cylinder: side walls only, one bottom/top vertex pair per ring step.
///
/// The ring is sampled `TOWER_SEGMENTS + 1` times so the last column
/// duplicates the first; segment `i` joins column `i` to `i + 1`, which closes
/// the seam without a zero-area quad.
fn tower() -> GeometryData {
    let segments = TOWER_SEGMENTS;
    let mut mesh = GeometryData::default();

    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let (x, z) = (cos * TOWER_RADIUS, sin * TOWER_RADIUS);
        let normal = [cos, 0.0, sin];
        mesh.push_vertex([x, 0.0, z], normal, [u, 0.0]);
        mesh.push_vertex([x, TOWER_HEIGHT, z], normal, [u, 1.0]);
    }

    for i in 0..segments {
        let bottom = i * 2;
        let top = bottom + 1;
        let next_bottom = bottom + 2;
        let next_top = bottom + 3;
        mesh.push_triangle(bottom, top, next_bottom);
        mesh.push_triangle(top, next_top, next_bottom);
    }

    mesh
}

/// Flat blade fan in the XZ plane.
///
/// Only blades `0..TURBINE_BLADES - 1` are joined to their successor, so the
/// wedge between the last and first blade stays open.
// TODO: decide whether the open wedge between the last and first blade should be closed.
fn turbine() -> GeometryData {
    let blades = TURBINE_BLADES;
    let up = [0.0, 1.0, 0.0];
    let mut mesh = GeometryData::default();

    for blade in 0..blades {
        let v = blade as f32 / blades as f32;
        let (sin, cos) = (v * TAU).sin_cos();
        mesh.push_vertex(
            [cos * TURBINE_HUB_RADIUS, 0.0, sin * TURBINE_HUB_RADIUS],
            up,
            [0.0, v],
        );
        mesh.push_vertex(
            [cos * TURBINE_BLADE_LENGTH, 0.0, sin * TURBINE_BLADE_LENGTH],
            up,
            [1.0, v],
        );
    }

    for blade in 0..blades {
        if blade < blades - 1 {
            let hub = blade * 2;
            let tip = hub + 1;
            let next_hub = hub + 2;
            let next_tip = hub + 3;
            mesh.push_triangle(hub, next_tip, tip);
            mesh.push_triangle(hub, next_hub, next_tip);
        }
    }

    mesh
}

/// Front and back quads of a unit cube.
fn cube() -> GeometryData {
    const CORNERS: [([f32; 2], [f32; 2]); 4] = [
        ([-0.5, -0.5], [0.0, 0.0]),
        ([0.5, -0.5], [1.0, 0.0]),
        ([0.5, 0.5], [1.0, 1.0]),
        ([-0.5, 0.5], [0.0, 1.0]),
    ];
    let mut mesh = GeometryData::default();

    for z in [0.5f32, -0.5] {
        let normal = [0.0, 0.0, z.signum()];
        for ([x, y], uv) in CORNERS {
            mesh.push_vertex([x, y, z], normal, uv);
        }
    }

    // front
    mesh.push_triangle(0, 1, 2);
    mesh.push_triangle(0, 2, 3);
    // back
    mesh.push_triangle(4, 6, 5);
    mesh.push_triangle(4, 7, 6);

    mesh
}
