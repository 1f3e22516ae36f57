use std::time::Instant;

use pixels::{PixelsBuilder, SurfaceTexture};
use thiserror::Error;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::graphics::Renderer2d;
use crate::input::{InputEvent, PointerEvent, PointerId, PointerPhase, WHEEL_LINE_PX};
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::{SurfaceSize, Viewport};

pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub vsync: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: String::from("app"),
            desired_size: PhysicalSize::new(960, 720),
            clamp_to_monitor: true,
            vsync: Some(true),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    /// The drawing context could not be created; callers should degrade to static output.
    #[error("rendering context unavailable: {0}")]
    RenderContext(pixels::Error),
}

/// An app driven by [`run_app`].
///
/// Input is queued with its arrival timestamp and delivered in order right before `frame`, so
/// everything that happened since the last paint is visible in the next one.
pub trait FrameApp {
    /// Called with the logical viewport on startup and on every non-empty resize. Returns the
    /// backing-store size to draw into, or `None` to keep the current one.
    fn resize(&mut self, viewport: Viewport) -> Option<SurfaceSize>;

    fn input(&mut self, event: InputEvent, now: Instant);

    fn frame(&mut self, gfx: &mut dyn Renderer2d, now: Instant);

    fn teardown(&mut self) {}

    fn exit_requested(&self) -> bool {
        false
    }
}

pub fn run_app<A: FrameApp + 'static>(config: AppConfig, mut app: A) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let initial_size = match event_loop.primary_monitor().map(|m| m.size()) {
        Some(monitor) if config.clamp_to_monitor => PhysicalSize::new(
            config.desired_size.width.min(monitor.width),
            config.desired_size.height.min(monitor.height),
        ),
        _ => config.desired_size,
    };
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width.max(1), window_size.height.max(1));
    let mut scale_factor = window.scale_factor();

    let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
    let mut builder = PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture);
    if let Some(vsync) = config.vsync {
        builder = builder.enable_vsync(vsync);
    }
    let pixels = builder.build().map_err(AppError::RenderContext)?;
    let mut renderer =
        PixelsRenderer2d::new(pixels, surface_size).map_err(AppError::RenderContext)?;

    if let Some(buffer) = app.resize(Viewport::from_physical(surface_size, scale_factor)) {
        if let Err(err) = renderer.resize(surface_size, buffer) {
            tracing::warn!("initial resize failed: {err}");
        }
    }
    tracing::info!(
        width = surface_size.width,
        height = surface_size.height,
        scale_factor,
        "window ready"
    );

    let mut pending: Vec<(InputEvent, Instant)> = Vec::new();
    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut torn_down = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    apply_resize(&mut app, &mut renderer, size, scale_factor);
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged {
                    scale_factor: new_scale,
                    new_inner_size,
                } => {
                    scale_factor = new_scale;
                    apply_resize(&mut app, &mut renderer, *new_inner_size, scale_factor);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = position;
                    let (x, y) = logical(cursor, scale_factor);
                    pending.push((
                        InputEvent::Pointer(PointerEvent::mouse(PointerPhase::Move, x, y)),
                        Instant::now(),
                    ));
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let phase = match state {
                        ElementState::Pressed => PointerPhase::Down,
                        ElementState::Released => PointerPhase::Up,
                    };
                    let (x, y) = logical(cursor, scale_factor);
                    pending.push((
                        InputEvent::Pointer(PointerEvent::mouse(phase, x, y)),
                        Instant::now(),
                    ));
                }
                WindowEvent::Touch(touch) => {
                    let (x, y) = logical(touch.location, scale_factor);
                    pending.push((
                        InputEvent::Pointer(PointerEvent::touch(
                            PointerId::touch(touch.id),
                            touch.phase.into(),
                            x,
                            y,
                        )),
                        Instant::now(),
                    ));
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let delta_y = match delta {
                        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PX,
                        MouseScrollDelta::PixelDelta(pos) => (-pos.y / scale_factor) as f32,
                    };
                    pending.push((InputEvent::Wheel { delta_y }, Instant::now()));
                }
                WindowEvent::Focused(false) => {
                    pending.push((InputEvent::Blur, Instant::now()));
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    pending.push((InputEvent::Key(key), Instant::now()));
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                for (input, at) in pending.drain(..) {
                    app.input(input, at);
                }

                let now = Instant::now();
                renderer.draw_frame(|gfx| app.frame(gfx, now));
                if let Err(err) = renderer.present() {
                    tracing::warn!("present failed: {err}");
                }

                if app.exit_requested() {
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            Event::LoopDestroyed => {
                if !torn_down {
                    torn_down = true;
                    pending.clear();
                    app.teardown();
                }
            }
            _ => {}
        }
    });
}

fn logical(position: PhysicalPosition<f64>, scale_factor: f64) -> (f32, f32) {
    let logical = position.to_logical::<f64>(scale_factor);
    (logical.x as f32, logical.y as f32)
}

fn apply_resize<A: FrameApp>(
    app: &mut A,
    renderer: &mut PixelsRenderer2d,
    size: PhysicalSize<u32>,
    scale_factor: f64,
) {
    let surface = SurfaceSize::new(size.width, size.height);
    if surface.is_empty() {
        return;
    }
    let Some(buffer) = app.resize(Viewport::from_physical(surface, scale_factor)) else {
        return;
    };
    if let Err(err) = renderer.resize(surface, buffer) {
        tracing::warn!("resize failed: {err}");
    }
}
