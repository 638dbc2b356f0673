// CONTROLLER: input, camera state machine and frame composition
pub mod camera_controller;
pub mod draw;
pub mod frame_loop;
pub mod input;

pub use camera_controller::{CameraController, CameraMode};
pub use draw::{DrawCall, FramePlan, MeshSlot, Program, UniformSink, UniformValue};
pub use frame_loop::{compose_frame, FrameLoopContext, UiCapture};
pub use input::{InputEvent, InputProcessor, InputSampler, InputState, KeyBindings, MouseButton};
