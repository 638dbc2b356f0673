use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{error, info, warn};
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::Key,
    window::Window,
};

use lumen::config::AppConfig;
use lumen::controller::{FrameLoopContext, InputEvent, MouseButton, UiCapture};
use lumen::model::{MaterialModel, RenderState, Viewport};
use lumen::view::{EguiFrame, GpuContext, Renderer, SceneAssets};
use lumen::{logging, ui};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    frame_ctx: FrameLoopContext,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

impl App {
    async fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self> {
        let gpu = GpuContext::new_native(window.clone()).await?;
        let assets = SceneAssets::load(config).context("failed to load scene assets")?;

        let (width, height) = (gpu.config.width, gpu.config.height);
        let mut renderer = Renderer::new(&gpu.device, gpu.format, width, height, &assets);
        let [diffuse, specular] = assets
            .material_maps()
            .map(|map| renderer.add_texture(&gpu.device, &gpu.queue, map.image, map.color_space, map.label));

        let state = RenderState::new(MaterialModel::new(diffuse, specular), Viewport::new(width, height));
        let frame_ctx = FrameLoopContext::new(state);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        info!(width, height, "context initialized");
        Ok(Self { window, gpu, renderer, frame_ctx, egui_state, egui_ctx })
    }

    fn input(&mut self, event: &WindowEvent) {
        // egui sees everything first
        let consumed = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;
        let capture = if consumed {
            UiCapture { pointer: true, keyboard: true }
        } else {
            UiCapture::default()
        };

        if let Some(input) = to_input_event(event, self.frame_ctx.input.cursor) {
            self.frame_ctx.forward_event(&input, capture);
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if self.frame_ctx.resize(new_size.width, new_size.height) {
            self.gpu.resize(new_size.width, new_size.height);
            self.renderer.resize(&self.gpu.device, new_size.width, new_size.height);
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, &mut self.frame_ctx.state);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);

        let plan = self.frame_ctx.frame();

        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        let egui_frame = EguiFrame {
            primitives: &primitives,
            textures_delta: &output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.config.width, self.gpu.config.height],
                pixels_per_point: output.pixels_per_point,
            },
        };

        self.renderer
            .draw_frame(&self.gpu.device, &self.gpu.queue, &self.gpu.surface, &plan, Some(egui_frame))
    }
}

fn to_input_event(event: &WindowEvent, cursor: Vec2) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput {
            event: KeyEvent { logical_key: Key::Character(text), state, .. },
            ..
        } => {
            let key = text.to_string();
            Some(match state {
                ElementState::Pressed => InputEvent::KeyDown(key),
                ElementState::Released => InputEvent::KeyUp(key),
            })
        }
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                winit::event::MouseButton::Left => MouseButton::Left,
                winit::event::MouseButton::Right => MouseButton::Right,
                winit::event::MouseButton::Middle => MouseButton::Middle,
                _ => return None,
            };
            Some(InputEvent::MouseButton {
                button,
                pressed: *state == ElementState::Pressed,
                x: cursor.x,
                y: cursor.y,
            })
        }
        WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
        WindowEvent::Occluded(occluded) => Some(InputEvent::VisibilityChanged { visible: !occluded }),
        _ => None,
    }
}

fn main() -> Result<()> {
    logging::init();
    let config = AppConfig::from_env();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_attributes = Window::default_attributes()
        .with_title("lumen")
        .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height));
    #[allow(deprecated)]
    let window = event_loop
        .create_window(window_attributes)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window, &config))
        .inspect_err(|e| error!("initialization failed: {e:#}"))?;

    #[allow(deprecated)]
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
                app.input(event);
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                    WindowEvent::RedrawRequested => match app.render() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => app.gpu.reconfigure(),
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("GPU out of memory");
                            elwt.exit();
                        }
                        Err(e) => warn!(error = ?e, "surface error, frame skipped"),
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => app.window.request_redraw(),
            _ => {}
        })
        .context("event loop failed")?;

    Ok(())
}
