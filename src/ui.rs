use egui::{Context, Ui};
use glam::Vec3;
use tracing::debug;

use crate::model::camera::MAX_PITCH;
use crate::model::light::{MAX_CUTOFF_DEGREES, MAX_LIGHT_DISTANCE};
use crate::model::material::{MAX_SHININESS, MIN_SHININESS};
use crate::model::{LightKind, PanelValues, RenderState};

/// Runs one egui pass with the debug panel. The panel works on a copy that
/// is written back through `RenderState::apply_panel`, which re-validates it.
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, state: &mut RenderState) -> egui::FullOutput {
    let mut values = state.panel_values();
    let mut changed = false;
    let output = egui_ctx.run(raw_input, |ctx| {
        changed = debug_panel(ctx, &mut values);
    });
    if changed {
        debug!("panel edited");
    }
    state.apply_panel(values);
    output
}

/// Returns true if any value was edited this frame.
pub fn debug_panel(ctx: &Context, values: &mut PanelValues) -> bool {
    let before = *values;

    egui::Window::new("ui window")
        .default_pos([10.0, 10.0])
        .default_width(300.0)
        .show(ctx, |ui| {
            clear_color_row(ui, &mut values.clear_color);
            ui.separator();

            drag_vec3(ui, "camera pos", &mut values.camera_position, 0.01);
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut values.camera_yaw).speed(0.5));
                ui.label("camera yaw");
            });
            ui.horizontal(|ui| {
                ui.add(
                    egui::DragValue::new(&mut values.camera_pitch)
                        .speed(0.5)
                        .range(-MAX_PITCH..=MAX_PITCH),
                );
                ui.label("camera pitch");
            });
            ui.separator();

            if ui.button("reset camera").clicked() {
                values.reset_camera = true;
            }

            egui::CollapsingHeader::new("light")
                .default_open(true)
                .show(ui, |ui| light_section(ui, values));

            egui::CollapsingHeader::new("material")
                .default_open(true)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::DragValue::new(&mut values.shininess)
                                .speed(1.0)
                                .range(MIN_SHININESS..=MAX_SHININESS),
                        );
                        ui.label("m.shininess");
                    });
                });

            ui.checkbox(&mut values.animation, "animation");
        });

    *values != before
}

fn light_section(ui: &mut Ui, values: &mut PanelValues) {
    egui::ComboBox::from_label("l.kind")
        .selected_text(values.light_kind.label())
        .show_ui(ui, |ui| {
            for kind in LightKind::ALL {
                ui.selectable_value(&mut values.light_kind, kind, kind.label());
            }
        });

    drag_vec3(ui, "l.position", &mut values.light_position, 0.01);
    ui.horizontal(|ui| {
        ui.add(
            egui::DragValue::new(&mut values.light_distance)
                .speed(0.5)
                .range(0.0..=MAX_LIGHT_DISTANCE),
        );
        ui.label("l.distance");
    });
    drag_vec3(ui, "l.direction", &mut values.light_direction, 0.01);
    ui.horizontal(|ui| {
        for angle in values.light_cutoff.iter_mut() {
            ui.add(egui::DragValue::new(angle).speed(0.5).range(0.0..=MAX_CUTOFF_DEGREES));
        }
        ui.label("l.cutoff");
    });

    for (color, label) in [
        (&mut values.light_ambient, "l.ambient"),
        (&mut values.light_diffuse, "l.diffuse"),
        (&mut values.light_specular, "l.specular"),
    ] {
        ui.horizontal(|ui| {
            ui.color_edit_button_rgb(color);
            ui.label(label);
        });
    }

    ui.checkbox(&mut values.flashlight_mode, "flash light");
}

/// egui events for a key reported by its DOM-style name (`"a"`, `"7"`,
/// `"Backspace"`). Printable keys also produce text while held without a
/// command modifier.
pub fn key_events(key: &str, pressed: bool, modifiers: egui::Modifiers) -> Vec<egui::Event> {
    let mut events = Vec::new();
    if let Some(named) = egui::Key::from_name(key) {
        events.push(egui::Event::Key {
            key: named,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers,
        });
    }
    let printable = key.chars().count() == 1 && !key.chars().any(char::is_control);
    if pressed && printable && !modifiers.ctrl && !modifiers.command {
        events.push(egui::Event::Text(key.to_string()));
    }
    events
}

/// RGB and alpha are edited apart. egui's RGBA button premultiplies, which
/// loses the colour of a transparent clear value.
fn clear_color_row(ui: &mut Ui, color: &mut [f32; 4]) {
    ui.horizontal(|ui| {
        let mut rgb = [color[0], color[1], color[2]];
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            color[..3].copy_from_slice(&rgb);
        }
        ui.add(egui::DragValue::new(&mut color[3]).speed(0.01).range(0.0..=1.0));
        ui.label("clear color");
    });
}

fn drag_vec3(ui: &mut Ui, label: &str, v: &mut Vec3, speed: f64) {
    ui.horizontal(|ui| {
        ui.add(egui::DragValue::new(&mut v.x).speed(speed));
        ui.add(egui::DragValue::new(&mut v.y).speed(speed));
        ui.add(egui::DragValue::new(&mut v.z).speed(speed));
        ui.label(label);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaterialModel, TextureHandle, Viewport};

    fn state() -> RenderState {
        RenderState::new(
            MaterialModel::new(TextureHandle(0), TextureHandle(1)),
            Viewport::new(800, 600),
        )
    }

    #[test]
    fn untouched_panel_leaves_state_alone() {
        let ctx = Context::default();
        let mut state = state();
        let before = state.clone();
        let _ = build_ui(&ctx, egui::RawInput::default(), &mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn typed_digits_reach_egui_as_key_and_text() {
        let events = key_events("7", true, egui::Modifiers::NONE);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], egui::Event::Key { key: egui::Key::Num7, pressed: true, .. }));
        assert_eq!(events[1], egui::Event::Text("7".to_string()));

        let released = key_events("7", false, egui::Modifiers::NONE);
        assert!(matches!(released[..], [egui::Event::Key { pressed: false, .. }]));
    }

    #[test]
    fn editing_keys_carry_no_text() {
        let events = key_events("Backspace", true, egui::Modifiers::NONE);
        assert!(matches!(events[..], [egui::Event::Key { key: egui::Key::Backspace, .. }]));

        let copy = key_events("c", true, egui::Modifiers::COMMAND);
        assert!(copy.iter().all(|e| !matches!(e, egui::Event::Text(_))));

        assert!(key_events("Shift", true, egui::Modifiers::SHIFT).is_empty());
    }

    #[test]
    fn transparent_clear_colour_keeps_its_rgb() {
        let ctx = Context::default();
        let mut state = state();
        state.set_clear_color([0.7, 0.4, 0.2, 0.0]);
        for _ in 0..3 {
            let _ = build_ui(&ctx, egui::RawInput::default(), &mut state);
        }
        assert_eq!(state.clear_color(), [0.7, 0.4, 0.2, 0.0]);
    }
}
