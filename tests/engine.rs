use std::time::Duration;

use mechviz::error::EngineError;
use mechviz::render::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};
use mechviz::render::{run_frames, ShaderProgram, ShaderStage};
use mechviz::{
    EngineHandle, FrameOutcome, GeometryKind, HeadlessContext, Viewer, ViewerConfig,
};

const FRAME: Duration = Duration::from_millis(16);

fn cube_engine() -> (EngineHandle<HeadlessContext>, HeadlessContext) {
    let ctx = HeadlessContext::new(800, 600);
    let probe = ctx.clone();
    let engine = EngineHandle::initialize(ctx, GeometryKind::Cube, 800, 600, ViewerConfig::default())
        .expect("cube pipeline builds");
    (engine, probe)
}

#[test]
fn cube_uploads_every_stream_and_teardown_releases_them() {
    let (mut engine, probe) = cube_engine();
    let ledger = probe.ledger();
    {
        let ledger = ledger.lock();
        assert_eq!(ledger.live_shaders(), 2);
        assert_eq!(ledger.live_programs(), 1);
        assert_eq!(ledger.live_buffers(), 4);
    }

    assert_eq!(engine.tick(Duration::ZERO), FrameOutcome::Rendered);
    {
        let ledger = ledger.lock();
        let frame = ledger.last_frame().expect("frame presented");
        assert_eq!(frame.draws, vec![12]);
        assert!(frame.state.depth_test);
        assert!(frame.state.cull_back_faces);

        let mut streams: Vec<(u32, usize)> = frame
            .attributes
            .iter()
            .map(|binding| {
                let record = ledger.buffer(binding.buffer).expect("bound buffer is live");
                (binding.components, record.bytes)
            })
            .collect();
        streams.sort();
        assert_eq!(streams, vec![(2, 8 * 2 * 4), (3, 8 * 3 * 4), (3, 8 * 3 * 4)]);

        let indices = frame.index_buffer.and_then(|buffer| ledger.buffer(buffer));
        assert_eq!(indices.map(|record| record.bytes), Some(12 * 2));
    }

    drop(engine.teardown());
    assert_eq!(ledger.lock().live_objects(), 0);
}

#[test]
fn wheel_zoom_is_clamped_on_both_ends() {
    let (mut engine, _) = cube_engine();
    engine.on_wheel(50_000.0);
    assert_eq!(engine.zoom_percent(), 10);
    engine.on_wheel(-50_000.0);
    assert_eq!(engine.zoom_percent(), 300);
}

#[test]
fn drag_and_zoom_reach_the_world_matrix() {
    let (mut engine, probe) = cube_engine();
    engine.on_wheel(-500.0);
    engine.tick(Duration::ZERO);
    let world = probe.ledger().lock().frame_uniform("world").expect("world uploaded");
    assert!((world[0] - 1.5).abs() < 1e-5);
    assert!((world[5] - 1.5).abs() < 1e-5);

    engine.on_pointer_down(0.0, 0.0);
    engine.on_pointer_move(100.0, 0.0);
    engine.on_pointer_up();
    assert_eq!(engine.camera().rotation.y, 1.0);
    engine.tick(Duration::ZERO);
    let rotated = probe.ledger().lock().frame_uniform("world").expect("world uploaded");
    assert_ne!(rotated, world);
}

#[test]
fn time_uniform_counts_from_the_first_frame() {
    let (mut engine, probe) = cube_engine();
    engine.tick(Duration::from_secs(40));
    engine.tick(Duration::from_millis(41_500));
    let time = probe.ledger().lock().frame_uniform("time").expect("time uploaded");
    assert!((time[0] - 1.5).abs() < 1e-4);
}

#[test]
fn failed_draw_skips_one_frame_and_keeps_running() {
    let (mut engine, probe) = cube_engine();
    probe.fail_next_draws(1);
    assert_eq!(engine.tick(Duration::ZERO), FrameOutcome::Skipped);
    assert!(engine.is_running());
    assert_eq!(engine.tick(FRAME), FrameOutcome::Rendered);
    assert_eq!(probe.ledger().lock().frames_presented(), 1);

    probe.fail_next_draws(2);
    let stats = run_frames(&mut engine, 5, FRAME);
    assert_eq!((stats.rendered, stats.skipped), (3, 2));
}

#[test]
fn rebuild_swaps_geometry_without_leaking() {
    let (engine, probe) = cube_engine();
    let ledger = probe.ledger();
    let engine = engine
        .rebuild(GeometryKind::Turbine, 1024, 768)
        .expect("turbine pipeline builds");
    assert_eq!(engine.kind(), GeometryKind::Turbine);
    assert_eq!(engine.geometry().vertex_count(), 16);
    assert_eq!(engine.context().size(), (1024, 768));
    {
        let ledger = ledger.lock();
        assert_eq!(ledger.live_objects(), 2 + 1 + 4);
        assert_eq!(ledger.programs_created(), 2);
    }
    drop(engine.teardown());
    assert_eq!(ledger.lock().live_objects(), 0);
}

#[test]
fn buffer_exhaustion_fails_setup_and_frees_everything() {
    let ctx = HeadlessContext::new(800, 600).with_buffer_limit(2);
    let ledger = ctx.ledger();
    let err = EngineHandle::initialize(ctx, GeometryKind::Tower, 800, 600, ViewerConfig::default())
        .err()
        .expect("third buffer is refused");
    assert!(matches!(err, EngineError::Resource(_)));
    assert_eq!(ledger.lock().live_objects(), 0);
    assert_eq!(ledger.lock().buffers_created(), 2);
}

#[test]
fn compile_failure_deletes_the_shader() {
    let mut ctx = HeadlessContext::new(8, 8);
    let err = ShaderProgram::build(&mut ctx, VERTEX_SHADER, "fn broken( {").unwrap_err();
    match err {
        EngineError::Compile { stage, log } => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert!(!log.is_empty());
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
    let ledger = ctx.ledger();
    let ledger = ledger.lock();
    assert_eq!(ledger.shaders_created(), 2);
    assert_eq!(ledger.live_objects(), 0);
}

#[test]
fn link_failure_deletes_program_and_shaders() {
    let fragment = r#"
@fragment
fn fs_main(@location(7) tint: vec4<f32>) -> @location(0) vec4<f32> {
    return tint;
}
"#;
    let mut ctx = HeadlessContext::new(8, 8);
    let err = ShaderProgram::build(&mut ctx, VERTEX_SHADER, fragment).unwrap_err();
    assert!(matches!(err, EngineError::Link { .. }));
    let ledger = ctx.ledger();
    assert_eq!(ledger.lock().programs_created(), 1);
    assert_eq!(ledger.lock().live_objects(), 0);
}

#[test]
fn shipped_shaders_link_with_every_attribute() {
    let mut ctx = HeadlessContext::new(8, 8);
    let program = ShaderProgram::build(&mut ctx, VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
    for name in ["position", "normal", "texCoord"] {
        assert!(program.attribute(name).is_some(), "{name} missing");
    }
    assert!(program.uniform("worldViewProjection").is_some());
    program.release(&mut ctx);
    assert_eq!(ctx.ledger().lock().live_objects(), 0);
}

#[test]
fn viewer_without_a_context_stays_inert() {
    let mut viewer: Viewer<HeadlessContext> = Viewer::mount(
        Err(EngineError::Setup("WebGL not supported".into())),
        GeometryKind::Tower,
        640,
        480,
        ViewerConfig::default(),
    );
    viewer.on_pointer_down(1.0, 1.0);
    viewer.on_pointer_move(50.0, 50.0);
    assert!(!viewer.is_running());
    assert_eq!(viewer.tick(FRAME), FrameOutcome::Stopped);
    assert!(viewer.teardown().is_none());
}

#[test]
fn viewer_with_broken_buffers_is_inert_and_clean() {
    let ctx = HeadlessContext::new(640, 480).with_buffer_limit(0);
    let ledger = ctx.ledger();
    let viewer = Viewer::mount(Ok(ctx), GeometryKind::Cube, 640, 480, ViewerConfig::default());
    assert!(!viewer.is_active());
    assert_eq!(viewer.zoom_percent(), None);
    assert_eq!(ledger.lock().live_objects(), 0);
}

#[test]
fn viewer_teardown_stops_and_returns_the_context() {
    let ctx = HeadlessContext::new(640, 480);
    let ledger = ctx.ledger();
    let mut viewer = Viewer::mount(Ok(ctx), GeometryKind::Tower, 640, 480, ViewerConfig::default());
    assert_eq!(viewer.tick(Duration::ZERO), FrameOutcome::Rendered);
    assert!(viewer.teardown().is_some());
    assert!(!viewer.is_active());
    assert_eq!(viewer.tick(FRAME), FrameOutcome::Stopped);
    assert_eq!(ledger.lock().live_objects(), 0);
}
