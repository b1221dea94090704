//! Real-time orbit viewer for procedurally built mechanical assemblies.
//!
//! The crate builds a tower, turbine or cube mesh, compiles a PBR-style
//! shader pair, uploads the mesh and renders it every frame under an orbit
//! camera driven by pointer drags and the wheel. Rendering goes through the
//! [`render::GpuContext`] trait, implemented by [`WgpuContext`] for real
//! surfaces (WebGL canvas or native window) and by [`HeadlessContext`] for
//! tests and the `--headless` command line mode.

pub mod app;
pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod math;
pub mod render;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::{CameraState, OrbitCamera};
pub use config::ViewerConfig;
pub use engine::{EngineHandle, Viewer, Viewport};
pub use error::{DrawError, EngineError};
pub use geometry::{GeometryData, GeometryError, GeometryKind};
pub use render::{FrameOutcome, GpuContext, HeadlessContext, WgpuContext};
