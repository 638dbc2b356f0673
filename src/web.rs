use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};

use crate::config::AppConfig;
use crate::controller::input::wasm::{keyboard_event_to_input, mouse_button_to_input, mouse_move_to_input};
use crate::controller::{FrameLoopContext, InputEvent, MouseButton, UiCapture};
use crate::model::{MaterialModel, RenderState, Viewport};
use crate::view::{EguiFrame, GpuContext, Renderer, SceneAssets};
use crate::{logging, ui};

#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let config = AppConfig::from_env();
    let (window, document, canvas) = init_canvas(config.width, config.height)?;
    setup_app(&window, &document, &canvas, &config).await
}

/// DOM events collected between two animation frames.
#[derive(Default)]
struct PendingInput {
    camera: Vec<InputEvent>,
    egui: Vec<egui::Event>,
}

impl PendingInput {
    fn push(&mut self, event: InputEvent) {
        match &event {
            InputEvent::CursorMoved { x, y } => {
                self.egui.push(egui::Event::PointerMoved(egui::pos2(*x, *y)));
            }
            InputEvent::MouseButton { button, pressed, x, y } => {
                self.egui.push(egui::Event::PointerButton {
                    pos: egui::pos2(*x, *y),
                    button: match button {
                        MouseButton::Left => egui::PointerButton::Primary,
                        MouseButton::Right => egui::PointerButton::Secondary,
                        MouseButton::Middle => egui::PointerButton::Middle,
                    },
                    pressed: *pressed,
                    modifiers: egui::Modifiers::default(),
                });
            }
            _ => {}
        }
        self.camera.push(event);
    }

    fn push_key(&mut self, e: &KeyboardEvent, is_down: bool) {
        let modifiers = egui::Modifiers {
            alt: e.alt_key(),
            ctrl: e.ctrl_key(),
            shift: e.shift_key(),
            mac_cmd: false,
            command: e.ctrl_key() || e.meta_key(),
        };
        self.egui.extend(ui::key_events(&e.key(), is_down, modifiers));
        self.push(keyboard_event_to_input(e, is_down));
    }

    fn take(&mut self) -> (Vec<InputEvent>, Vec<egui::Event>) {
        (std::mem::take(&mut self.camera), std::mem::take(&mut self.egui))
    }
}

async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
    config: &AppConfig,
) -> Result<(), JsValue> {
    let gpu = GpuContext::new(canvas, config.width, config.height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e:#}")))?;
    let assets = SceneAssets::load(config).map_err(|e| js_error(format!("asset loading failed: {e:#}")))?;

    let (width, height) = (gpu.config.width, gpu.config.height);
    let mut renderer = Renderer::new(&gpu.device, gpu.format, width, height, &assets);
    let [diffuse, specular] = assets
        .material_maps()
        .map(|map| renderer.add_texture(&gpu.device, &gpu.queue, map.image, map.color_space, map.label));

    let state = RenderState::new(MaterialModel::new(diffuse, specular), Viewport::new(width, height));
    let mut frame_ctx = FrameLoopContext::new(state);
    info!(width, height, "context initialized");

    let pending = Rc::new(RefCell::new(PendingInput::default()));
    setup_input_listeners(document, window, canvas, pending.clone())?;

    let egui_ctx = egui::Context::default();
    let start_time = now_ms(window);

    let frame = RcCellCallback::new(window.clone(), {
        let window = window.clone();
        move || {
            let (events, egui_events) = pending.borrow_mut().take();
            let raw_input = egui::RawInput {
                screen_rect: Some(egui::Rect::from_min_size(
                    egui::Pos2::ZERO,
                    egui::vec2(width as f32, height as f32),
                )),
                time: Some((now_ms(&window) - start_time) / 1000.0),
                events: egui_events,
                ..Default::default()
            };
            let output = ui::build_ui(&egui_ctx, raw_input, &mut frame_ctx.state);

            let capture = UiCapture {
                pointer: egui_ctx.is_pointer_over_area() || egui_ctx.wants_pointer_input(),
                keyboard: egui_ctx.wants_keyboard_input(),
            };
            for event in &events {
                frame_ctx.forward_event(event, capture);
            }
            let plan = frame_ctx.frame();

            let primitives = egui_ctx.tessellate(output.shapes, output.pixels_per_point);
            let egui_frame = EguiFrame {
                primitives: &primitives,
                textures_delta: &output.textures_delta,
                screen: egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: output.pixels_per_point,
                },
            };

            match renderer.draw_frame(&gpu.device, &gpu.queue, &gpu.surface, &plan, Some(egui_frame)) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
                Err(e) => warn!(error = ?e, "surface error, frame skipped"),
            }
        }
    });
    frame.start()
}

/// Registers `f` for `name` events on `target`, downcasting to `E`.
fn listen<E>(target: &EventTarget, name: &str, mut f: impl FnMut(E) + 'static) -> Result<(), JsValue>
where
    E: JsCast + 'static,
{
    let closure = Closure::wrap(Box::new(move |e: Event| {
        if let Ok(e) = e.dyn_into::<E>() {
            f(e);
        }
    }) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    pending: Rc<RefCell<PendingInput>>,
) -> Result<(), JsValue> {
    for (name, is_down) in [("keydown", true), ("keyup", false)] {
        let pending = pending.clone();
        listen(document, name, move |e: KeyboardEvent| {
            pending.borrow_mut().push_key(&e, is_down);
        })?;
    }

    {
        let pending = pending.clone();
        listen(window, "blur", move |_: Event| pending.borrow_mut().push(InputEvent::FocusLost))?;
    }

    {
        let pending = pending.clone();
        let doc = document.clone();
        listen(document, "visibilitychange", move |_: Event| {
            pending.borrow_mut().push(InputEvent::VisibilityChanged { visible: !doc.hidden() });
        })?;
    }

    {
        let pending = pending.clone();
        listen(canvas, "mousemove", move |e: MouseEvent| {
            pending.borrow_mut().push(mouse_move_to_input(&e));
        })?;
    }

    for (name, pressed) in [("mousedown", true), ("mouseup", false)] {
        let pending = pending.clone();
        listen(canvas, name, move |e: MouseEvent| {
            pending.borrow_mut().push(mouse_button_to_input(&e, pressed));
            e.prevent_default();
        })?;
    }

    // right button drives free-look
    listen(canvas, "contextmenu", |e: MouseEvent| e.prevent_default())?;

    Ok(())
}

fn init_canvas(width: u32, height: u32) -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
    let document = window.document().ok_or_else(|| js_error("no document on window"))?;
    let body = document.body().ok_or_else(|| js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_width(width);
    canvas_el.set_height(height);
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

fn now_ms(window: &Window) -> f64 {
    window.performance().map(|p| p.now()).unwrap_or(0.0)
}

fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

type FrameClosure = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Runs a closure once per animation frame, forever.
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn schedule(window: &Window, callback: &FrameClosure) -> Result<i32, JsValue> {
        let slot = callback.borrow();
        let closure = slot.as_ref().ok_or_else(|| js_error("frame callback missing"))?;
        window.request_animation_frame(closure.as_ref().unchecked_ref())
    }

    fn start(self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback: FrameClosure = Rc::new(RefCell::new(None));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();
            if let Err(e) = Self::schedule(&window, &callback_clone) {
                error!(error = ?e, "requestAnimationFrame failed, frame loop stopped");
            }
        }) as Box<dyn FnMut()>));

        Self::schedule(&self.window, &callback)?;

        // the closure re-schedules itself and must outlive this call
        std::mem::forget(callback);
        Ok(())
    }
}
