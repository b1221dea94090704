use thiserror::Error;

use crate::geometry::GeometryError;
use crate::render::ShaderStage;

/// Failures that abort pipeline setup for one viewer instance.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No usable GPU context. Hosts treat this as "3D unavailable" and stay inert.
    #[error("graphics context unavailable: {0}")]
    Setup(String),
    #[error("failed to compile {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("failed to link shader program: {log}")]
    Link { log: String },
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("failed to create GPU resource: {0}")]
    Resource(String),
}

impl EngineError {
    /// Setup failures are silent at the host; every other kind leaves a blank canvas.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

/// Per-frame failure. The frame is dropped and the next one retries.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("surface lost")]
    SurfaceLost,
    #[error("surface outdated")]
    SurfaceOutdated,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("no frame in progress")]
    NoFrame,
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("{0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_the_stage() {
        let err = EngineError::Compile {
            stage: ShaderStage::Fragment,
            log: "unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to compile fragment shader: unexpected token"
        );
        assert!(!err.is_setup());
        assert!(EngineError::Setup("no adapter".into()).is_setup());
    }
}
