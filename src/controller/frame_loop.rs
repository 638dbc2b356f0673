use glam::{Mat4, Vec2, Vec3};

use crate::controller::camera_controller::CameraController;
use crate::controller::draw::{self, DrawCall, FramePlan, MeshSlot, Program, UniformValue};
use crate::controller::input::{InputEvent, InputProcessor, InputState, MotionDeltas};
use crate::model::material::{DIFFUSE_TEXTURE_UNIT, SPECULAR_TEXTURE_UNIT};
use crate::model::{PanelValues, RenderState, ViewProjection};

const MARKER_SCALE: f32 = 0.1;

/// Which input the overlay UI claimed this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiCapture {
    pub pointer: bool,
    pub keyboard: bool,
}

impl UiCapture {
    pub fn claims(&self, event: &InputEvent) -> bool {
        if !event.is_press() {
            return false;
        }
        match event {
            InputEvent::KeyDown(_) => self.keyboard,
            InputEvent::MouseButton { .. } => self.pointer,
            _ => false,
        }
    }
}

/// Main loop state and per-frame update logic
pub struct FrameLoopContext {
    pub state: RenderState,
    pub input: InputState,
    pub input_processor: InputProcessor,
    pub camera_controller: CameraController,
}

impl FrameLoopContext {
    pub fn new(state: RenderState) -> Self {
        let camera_controller = CameraController::new(&state.camera_settings);
        Self {
            state,
            input: InputState::new(),
            input_processor: InputProcessor::default(),
            camera_controller,
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        self.input.process_event(event);
        match event {
            InputEvent::MouseButton { button, pressed, x, y }
                if self.input_processor.is_free_look_button(*button) =>
            {
                if *pressed {
                    self.camera_controller.begin_free_look(Vec2::new(*x, *y));
                } else {
                    self.camera_controller.end_free_look();
                }
            }
            // the release would never arrive
            InputEvent::FocusLost => self.camera_controller.end_free_look(),
            _ => {}
        }
    }

    /// Like `handle_event`, but drops presses the UI claimed. Returns whether
    /// the event reached the camera.
    pub fn forward_event(&mut self, event: &InputEvent, capture: UiCapture) -> bool {
        if capture.claims(event) {
            return false;
        }
        self.handle_event(event);
        true
    }

    /// Forwards a window resize; degenerate sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.state.viewport.resize(width, height)
    }

    /// Step 1 of a frame: integrate input into the camera.
    pub fn update(&mut self) -> MotionDeltas {
        self.camera_controller
            .update(&mut self.state.camera, &self.input_processor, &self.input)
    }

    pub fn apply_panel(&mut self, values: PanelValues) {
        self.state.apply_panel(values);
    }

    pub fn compose(&self) -> FramePlan {
        compose_frame(&self.state)
    }

    /// Update then compose, in frame order.
    pub fn frame(&mut self) -> FramePlan {
        self.update();
        self.compose()
    }
}

/// Steps 2-5 of a frame: matrices, effective light, marker and main draw.
pub fn compose_frame(state: &RenderState) -> FramePlan {
    let camera = &state.camera;
    let light = &state.light;
    let view_proj = ViewProjection::derive(camera, &state.viewport, &state.projection).view_proj();
    let effective = light.effective(camera);

    let marker = (!light.flashlight_mode).then(|| {
        let model = Mat4::from_translation(light.position) * Mat4::from_scale(Vec3::splat(MARKER_SCALE));
        let mut call = DrawCall::new(Program::FlatColor, MeshSlot::LightMarker);
        call.set(draw::COLOR, UniformValue::Vec4(light.marker_color().extend(1.0)));
        call.set(draw::TRANSFORM, UniformValue::Mat4(view_proj * model));
        call
    });

    let material = &state.material;
    let model_transform = Mat4::IDENTITY;
    let mut main = DrawCall::new(Program::Lighting, MeshSlot::Model)
        .with_textures(material.diffuse_texture, material.specular_texture);
    main.set(draw::VIEW_POS, UniformValue::Vec3(camera.position));
    main.set(draw::LIGHT_KIND, UniformValue::Int(light.kind as i32));
    main.set(draw::LIGHT_POSITION, UniformValue::Vec3(effective.position));
    main.set(draw::LIGHT_ATTENUATION, UniformValue::Vec3(light.attenuation()));
    main.set(draw::LIGHT_DIRECTION, UniformValue::Vec3(effective.direction));
    main.set(draw::LIGHT_CUTOFF, UniformValue::Vec2(light.cutoff_cosines()));
    main.set(draw::LIGHT_AMBIENT, UniformValue::Vec3(light.ambient()));
    main.set(draw::LIGHT_DIFFUSE, UniformValue::Vec3(light.diffuse()));
    main.set(draw::LIGHT_SPECULAR, UniformValue::Vec3(light.specular()));
    main.set(draw::MATERIAL_DIFFUSE, UniformValue::Int(DIFFUSE_TEXTURE_UNIT));
    main.set(draw::MATERIAL_SPECULAR, UniformValue::Int(SPECULAR_TEXTURE_UNIT));
    main.set(draw::MATERIAL_SHININESS, UniformValue::Float(material.shininess()));
    main.set(draw::TRANSFORM, UniformValue::Mat4(view_proj * model_transform));
    main.set(draw::MODEL_TRANSFORM, UniformValue::Mat4(model_transform));

    FramePlan { clear_color: state.clear_color(), marker, main }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::MouseButton;
    use crate::model::{MaterialModel, TextureHandle, Viewport};

    fn context() -> FrameLoopContext {
        FrameLoopContext::new(RenderState::new(
            MaterialModel::new(TextureHandle(3), TextureHandle(4)),
            Viewport::new(800, 600),
        ))
    }

    fn vec3(call: &DrawCall, name: &str) -> Vec3 {
        match call.uniform(name) {
            Some(UniformValue::Vec3(v)) => v,
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn marker_drawn_only_outside_flashlight_mode() {
        let mut ctx = context();
        let plan = ctx.compose();
        let marker = plan.marker.as_ref().expect("marker");
        assert_eq!(marker.program, Program::FlatColor);
        assert_eq!(plan.draw_calls().count(), 2);

        ctx.state.light.flashlight_mode = true;
        let plan = ctx.compose();
        assert!(plan.marker.is_none());
        assert_eq!(plan.draw_calls().count(), 1);
    }

    #[test]
    fn flashlight_uses_camera_for_shading_only() {
        let mut ctx = context();
        ctx.state.light.flashlight_mode = true;
        let plan = ctx.compose();

        assert_eq!(vec3(&plan.main, draw::LIGHT_POSITION), ctx.state.camera.position);
        assert_eq!(vec3(&plan.main, draw::LIGHT_DIRECTION), ctx.state.camera.front());
        assert_eq!(ctx.state.light.position, Vec3::new(1.0, 4.0, 4.0));
    }

    #[test]
    fn main_draw_carries_full_uniform_contract() {
        let plan = context().compose();
        for name in [
            draw::TRANSFORM,
            draw::MODEL_TRANSFORM,
            draw::VIEW_POS,
            draw::LIGHT_POSITION,
            draw::LIGHT_DIRECTION,
            draw::LIGHT_ATTENUATION,
            draw::LIGHT_CUTOFF,
            draw::LIGHT_AMBIENT,
            draw::LIGHT_DIFFUSE,
            draw::LIGHT_SPECULAR,
            draw::MATERIAL_DIFFUSE,
            draw::MATERIAL_SPECULAR,
            draw::MATERIAL_SHININESS,
        ] {
            assert!(plan.main.uniform(name).is_some(), "missing {name}");
        }
        assert_eq!(plan.main.uniform(draw::MATERIAL_DIFFUSE), Some(UniformValue::Int(0)));
        assert_eq!(plan.main.uniform(draw::MATERIAL_SPECULAR), Some(UniformValue::Int(1)));
        assert_eq!(plan.main.textures, Some([TextureHandle(3), TextureHandle(4)]));
    }

    #[test]
    fn right_button_drives_free_look() {
        let mut ctx = context();
        ctx.handle_event(&InputEvent::KeyDown("w".to_string()));
        ctx.update();
        assert_eq!(ctx.state.camera.position, Vec3::new(0.0, 0.0, 3.0));

        ctx.handle_event(&InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
            x: 10.0,
            y: 10.0,
        });
        ctx.update();
        assert!((ctx.state.camera.position - Vec3::new(0.0, 0.0, 2.95)).length() < 1e-6);

        ctx.handle_event(&InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: false,
            x: 10.0,
            y: 10.0,
        });
        ctx.update();
        assert!((ctx.state.camera.position - Vec3::new(0.0, 0.0, 2.95)).length() < 1e-6);
    }

    #[test]
    fn left_button_does_not_unlock() {
        let mut ctx = context();
        ctx.handle_event(&InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
            x: 0.0,
            y: 0.0,
        });
        assert!(!ctx.camera_controller.is_free_look());
    }

    #[test]
    fn ui_capture_drops_presses_but_not_releases() {
        let mut ctx = context();
        let capture = UiCapture { pointer: true, keyboard: true };
        let press = InputEvent::MouseButton { button: MouseButton::Right, pressed: true, x: 5.0, y: 5.0 };
        assert!(!ctx.forward_event(&press, capture));
        assert!(!ctx.camera_controller.is_free_look());
        assert!(!ctx.forward_event(&InputEvent::KeyDown("w".to_string()), capture));
        assert!(!ctx.input.is_key_pressed("w"));

        // press outside the panel, release over it
        assert!(ctx.forward_event(&press, UiCapture::default()));
        let release = InputEvent::MouseButton { button: MouseButton::Right, pressed: false, x: 5.0, y: 5.0 };
        assert!(ctx.forward_event(&release, capture));
        assert!(!ctx.camera_controller.is_free_look());
        assert!(ctx.forward_event(&InputEvent::CursorMoved { x: 1.0, y: 2.0 }, capture));
    }

    #[test]
    fn zero_height_resize_keeps_projection_finite() {
        let mut ctx = context();
        assert!(!ctx.resize(1024, 0));
        let plan = ctx.compose();
        match plan.main.uniform(draw::TRANSFORM) {
            Some(UniformValue::Mat4(m)) => assert!(m.is_finite()),
            other => panic!("{other:?}"),
        }
    }
}
