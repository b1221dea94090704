//! Host-side glue shared by the native binary: argument parsing, the headless
//! run and the mapping from window input to viewer actions.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::config::ViewerConfig;
use crate::engine::EngineHandle;
use crate::geometry::GeometryKind;
use crate::render::{run_frames, HeadlessContext};

pub const USAGE: &str =
    "Usage: mechviz [--type <tower|turbine|cube>] [--size WxH] [--config <file.xml>] [--headless] [--frames N]";

/// Fixed timestep used when no display drives the frames.
pub const HEADLESS_FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub kind: GeometryKind,
    pub width: u32,
    pub height: u32,
    pub config: Option<PathBuf>,
    pub headless: bool,
    pub frames: usize,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            kind: GeometryKind::Tower,
            width: 800,
            height: 600,
            config: None,
            headless: false,
            frames: 120,
        }
    }
}

impl CliOptions {
    /// Parses arguments without the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--type" => options.kind = GeometryKind::from_selector(&value("--type")?),
                "--size" => {
                    let size = value("--size")?;
                    (options.width, options.height) = parse_size(&size)?;
                }
                "--config" => options.config = Some(PathBuf::from(value("--config")?)),
                "--frames" => {
                    let frames = value("--frames")?;
                    options.frames = frames
                        .parse()
                        .with_context(|| format!("invalid frame count `{frames}`"))?;
                }
                "--headless" => options.headless = true,
                other => bail!("Unknown argument: {other}. {USAGE}"),
            }
        }
        Ok(options)
    }

    pub fn load_config(&self) -> Result<ViewerConfig> {
        match &self.config {
            Some(path) => ViewerConfig::load(path),
            None => Ok(ViewerConfig::default()),
        }
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like 800x600, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in `{value}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in `{value}`"))?;
    if width == 0 || height == 0 {
        bail!("size must be non-zero, got `{value}`");
    }
    Ok((width, height))
}

/// What a headless run did, printed by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub kind: GeometryKind,
    pub width: u32,
    pub height: u32,
    pub vertices: usize,
    pub triangles: usize,
    pub frames_rendered: usize,
    pub frames_skipped: usize,
    pub outstanding_objects: usize,
}

impl fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "geometry: {} ({}x{})", self.kind, self.width, self.height)?;
        writeln!(f, "vertices: {}", self.vertices)?;
        writeln!(f, "triangles: {}", self.triangles)?;
        writeln!(
            f,
            "frames rendered: {} ({} skipped)",
            self.frames_rendered, self.frames_skipped
        )?;
        write!(f, "outstanding GPU objects: {}", self.outstanding_objects)
    }
}

/// Builds the pipeline on the recording backend, renders and tears down.
pub fn run_headless(options: &CliOptions, config: ViewerConfig) -> Result<HeadlessSummary> {
    let ctx = HeadlessContext::new(options.width, options.height);
    let ledger = ctx.ledger();
    let mut engine = EngineHandle::initialize(ctx, options.kind, options.width, options.height, config)
        .with_context(|| format!("failed to build the {} visualization", options.kind))?;

    let stats = run_frames(&mut engine, options.frames, HEADLESS_FRAME_INTERVAL);
    let vertices = engine.geometry().vertex_count();
    let triangles = engine.geometry().triangle_count();
    drop(engine.teardown());

    let outstanding_objects = ledger.lock().live_objects();
    Ok(HeadlessSummary {
        kind: options.kind,
        width: options.width,
        height: options.height,
        vertices,
        triangles,
        frames_rendered: stats.rendered,
        frames_skipped: stats.skipped,
        outstanding_objects,
    })
}

/// Keyboard shortcuts of the window host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ResetView,
    Switch(GeometryKind),
    Quit,
}

#[cfg(not(target_arch = "wasm32"))]
pub fn map_key(key: &winit::keyboard::Key) -> Option<KeyAction> {
    use winit::keyboard::{Key, NamedKey};
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Character(text) => match text.as_str() {
            "r" | "R" => Some(KeyAction::ResetView),
            "1" => Some(KeyAction::Switch(GeometryKind::Tower)),
            "2" => Some(KeyAction::Switch(GeometryKind::Turbine)),
            "3" => Some(KeyAction::Switch(GeometryKind::Cube)),
            _ => None,
        },
        _ => None,
    }
}

/// Converts a winit scroll into a browser-style wheel delta (positive scrolls away).
#[cfg(not(target_arch = "wasm32"))]
pub fn wheel_delta(delta: winit::event::MouseScrollDelta) -> f32 {
    use winit::event::MouseScrollDelta;
    // Pixels per line, as browsers report for one wheel notch.
    const LINE_HEIGHT: f32 = 100.0;
    match delta {
        MouseScrollDelta::LineDelta(_, lines) => -lines * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

/// Message carried by a caught panic, for hosts that recover from one.
pub fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&'static str>().copied())
        .unwrap_or("unknown panic")
}

/// Window title carrying the zoom label.
pub fn window_title(kind: GeometryKind, zoom_percent: u32) -> String {
    format!("mechviz: {kind} (zoom {zoom_percent}%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn defaults_without_arguments() {
        assert_eq!(CliOptions::parse(Vec::new()).unwrap(), CliOptions::default());
    }

    #[test]
    fn parses_every_flag() {
        let options = CliOptions::parse(args(&[
            "--type", "turbine", "--size", "1024x768", "--config", "viewer.xml", "--headless",
            "--frames", "5",
        ]))
        .unwrap();
        assert_eq!(options.kind, GeometryKind::Turbine);
        assert_eq!((options.width, options.height), (1024, 768));
        assert_eq!(options.config, Some(PathBuf::from("viewer.xml")));
        assert!(options.headless);
        assert_eq!(options.frames, 5);
    }

    #[test]
    fn unknown_selector_means_cube() {
        let options = CliOptions::parse(args(&["--type", "gearbox"])).unwrap();
        assert_eq!(options.kind, GeometryKind::Cube);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CliOptions::parse(args(&["--size", "800"])).is_err());
        assert!(CliOptions::parse(args(&["--size", "0x600"])).is_err());
        assert!(CliOptions::parse(args(&["--frames"])).is_err());
        assert!(CliOptions::parse(args(&["--verbose"])).is_err());
    }

    #[test]
    fn headless_run_releases_everything() {
        let options = CliOptions {
            kind: GeometryKind::Cube,
            frames: 3,
            ..CliOptions::default()
        };
        let summary = run_headless(&options, ViewerConfig::default()).unwrap();
        assert_eq!(summary.vertices, 8);
        assert_eq!(summary.triangles, 4);
        assert_eq!(summary.frames_rendered, 3);
        assert_eq!(summary.outstanding_objects, 0);
        assert!(summary.to_string().contains("geometry: cube (800x600)"));
    }

    #[test]
    fn keys_map_to_actions() {
        use winit::keyboard::{Key, NamedKey};
        assert_eq!(map_key(&Key::Named(NamedKey::Escape)), Some(KeyAction::Quit));
        assert_eq!(
            map_key(&Key::Character("2".into())),
            Some(KeyAction::Switch(GeometryKind::Turbine))
        );
        assert_eq!(map_key(&Key::Character("r".into())), Some(KeyAction::ResetView));
        assert_eq!(map_key(&Key::Character("x".into())), None);
    }

    #[test]
    fn scrolling_up_zooms_in() {
        use winit::event::MouseScrollDelta;
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
    }

    #[test]
    fn panic_payloads_become_text() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("no display server"));
        assert_eq!(panic_text(owned.as_ref()), "no display server");
        let literal: Box<dyn Any + Send> = Box::new("wayland socket missing");
        assert_eq!(panic_text(literal.as_ref()), "wayland socket missing");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_text(other.as_ref()), "unknown panic");
    }

    #[test]
    fn caught_event_loop_panic_is_described() {
        let caught = std::panic::catch_unwind(|| -> u32 { panic!("no display: {}", 0) });
        let payload = caught.unwrap_err();
        assert_eq!(panic_text(payload.as_ref()), "no display: 0");
    }

    #[test]
    fn title_shows_zoom() {
        assert_eq!(window_title(GeometryKind::Tower, 150), "mechviz: tower (zoom 150%)");
    }
}
