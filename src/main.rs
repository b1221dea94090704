#[cfg(not(target_arch = "wasm32"))]
fn main() {
    desktop::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod desktop {
    use std::env;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use glam::Vec2;
    use log::info;
    use pollster::block_on;
    use thiserror::Error;
    use winit::dpi::PhysicalSize;
    use winit::event::{ElementState, Event, MouseButton, WindowEvent};
    use winit::event_loop::{ControlFlow, EventLoop};
    use winit::window::WindowBuilder;

    use mechviz::app::{self, CliOptions, KeyAction};
    use mechviz::{EngineError, ViewerConfig, Viewer, WgpuContext};

    pub fn main() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        if let Err(err) = run() {
            eprintln!("Error: {err:?}");
            std::process::exit(1);
        }
    }

    fn run() -> Result<()> {
        let options = CliOptions::parse(env::args().skip(1))?;
        let config = options
            .load_config()
            .context("failed to load viewer configuration")?;

        if options.headless {
            return print_headless(&options, config);
        }
        match run_interactive(&options, config) {
            Ok(()) => Ok(()),
            Err(err) if err.downcast_ref::<WindowUnavailable>().is_some() => {
                eprintln!("{err}; rendering headless instead");
                print_headless(&options, config)
            }
            Err(err) => Err(err),
        }
    }

    fn print_headless(options: &CliOptions, config: ViewerConfig) -> Result<()> {
        let summary = app::run_headless(options, config)?;
        println!("{summary}");
        Ok(())
    }

    fn run_interactive(options: &CliOptions, config: ViewerConfig) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let started = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let event_loop = match started {
            Ok(Ok(event_loop)) => event_loop,
            Ok(Err(err)) => return Err(WindowUnavailable::EventLoop(err.to_string()).into()),
            Err(payload) => {
                let reason = app::panic_text(payload.as_ref()).to_string();
                return Err(WindowUnavailable::EventLoop(reason).into());
            }
        };

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(app::window_title(options.kind, 100))
                .with_inner_size(PhysicalSize::new(options.width, options.height))
                .build(&event_loop)
                .map_err(WindowUnavailable::from)?,
        );

        let size = window.inner_size();
        let ctx = block_on(WgpuContext::new(Arc::clone(&window), size.width, size.height))
            .map_err(WindowUnavailable::from)?;
        let mut viewer = Viewer::mount(Ok(ctx), options.kind, size.width, size.height, config);
        if !viewer.is_active() {
            anyhow::bail!("the {} visualization could not be built", options.kind);
        }

        let mut kind = options.kind;
        let mut pointer = Vec2::ZERO;
        let mut shown_zoom = None;
        let started = Instant::now();
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop
            .run(move |event, elwt| match event {
                Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                        viewer.set_parameters(kind, size.width, size.height);
                        window.request_redraw();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        pointer = Vec2::new(position.x as f32, position.y as f32);
                        viewer.on_pointer_move(pointer.x, pointer.y);
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => viewer.on_pointer_down(pointer.x, pointer.y),
                        ElementState::Released => viewer.on_pointer_up(),
                    },
                    WindowEvent::CursorLeft { .. } => viewer.on_pointer_up(),
                    WindowEvent::MouseWheel { delta, .. } => viewer.on_wheel(app::wheel_delta(delta)),
                    WindowEvent::KeyboardInput { event, .. }
                        if event.state == ElementState::Pressed && !event.repeat =>
                    {
                        match app::map_key(&event.logical_key) {
                            Some(KeyAction::Quit) => elwt.exit(),
                            Some(KeyAction::ResetView) => viewer.reset_view(),
                            Some(KeyAction::Switch(next)) if next != kind => {
                                kind = next;
                                let size = window.inner_size();
                                viewer.set_parameters(kind, size.width, size.height);
                                shown_zoom = None;
                                window.request_redraw();
                            }
                            _ => {}
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        viewer.tick(started.elapsed());
                        let zoom = viewer.zoom_percent();
                        if zoom != shown_zoom {
                            if let Some(percent) = zoom {
                                window.set_title(&app::window_title(kind, percent));
                            }
                            shown_zoom = zoom;
                        }
                        if viewer.is_running() {
                            window.request_redraw();
                        }
                    }
                    _ => {}
                },
                Event::LoopExiting => {
                    if viewer.teardown().is_some() {
                        info!("viewer torn down");
                    }
                }
                _ => {}
            })
            .context("event loop terminated with an error")
    }

    /// Why the interactive window could not come up. Every variant falls back to headless.
    #[derive(Debug, Error)]
    enum WindowUnavailable {
        #[error("no event loop: {0}")]
        EventLoop(String),
        #[error("cannot open a window: {0}")]
        Window(#[from] winit::error::OsError),
        #[error(transparent)]
        Gpu(#[from] EngineError),
    }
}
