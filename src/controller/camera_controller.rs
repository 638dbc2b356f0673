use glam::Vec2;
use tracing::debug;

use crate::controller::input::{InputProcessor, InputSampler, InputState, MotionDeltas};
use crate::model::{CameraPose, CameraSettings};

/// Whether mouse/keyboard input currently drives the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMode {
    Locked,
    /// `anchor` is the cursor position the next rotation delta is measured from.
    FreeLook { anchor: Vec2 },
}

/// Free-look state machine: integrates sampled input into the camera pose.
pub struct CameraController {
    mode: CameraMode,
    sampler: InputSampler,
}

impl CameraController {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            mode: CameraMode::Locked,
            sampler: InputSampler::new(settings),
        }
    }

    pub fn mode(&self) -> CameraMode { self.mode }

    pub fn is_free_look(&self) -> bool {
        matches!(self.mode, CameraMode::FreeLook { .. })
    }

    /// Enters free-look. The cursor anchor is taken in the same step, so the
    /// first motion sample afterwards never sees a stale position.
    pub fn begin_free_look(&mut self, cursor: Vec2) {
        if !self.is_free_look() {
            debug!(x = cursor.x, y = cursor.y, "free-look on");
        }
        self.mode = CameraMode::FreeLook { anchor: cursor };
    }

    pub fn end_free_look(&mut self) {
        if self.is_free_look() {
            debug!("free-look off");
        }
        self.mode = CameraMode::Locked;
    }

    /// Samples this frame's input and applies it to `pose`. While locked the
    /// sample is discarded and the pose stays frozen.
    pub fn update(&mut self, pose: &mut CameraPose, processor: &InputProcessor, input: &InputState) -> MotionDeltas {
        let CameraMode::FreeLook { anchor } = self.mode else {
            return MotionDeltas::default();
        };

        let deltas = self.sampler.sample(processor, input, pose, anchor);
        self.mode = CameraMode::FreeLook { anchor: input.cursor };
        pose.apply_deltas(deltas.translation, deltas.rotation);
        deltas
    }
}
