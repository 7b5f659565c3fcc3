//! Per-frame orchestration of the three scene passes and picking.

mod backend;
mod orchestrator;

pub use backend::SceneBackend;
pub use orchestrator::FrameOrchestrator;

use crate::effect::TimedEffect;
use crate::input::PointerState;
use crate::picking::ViewportPoint;
use crate::scene::{CameraRig, CommonUniform};
use crate::time::{FrameTime, SessionClock};

/// Tube scroll speed, in turns per second.
pub const OFFSET_RATE: f32 = 0.2;

/// Tube spin speed, in radians per second.
pub const ROTATE_RATE: f32 = 1.2;

/// What the orchestrator reads from the platform each frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
    pub pointer: PointerState,
}

/// Timing state carried across frames.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub clock: SessionClock,
    pub effect: TimedEffect,

    /// Where the last click landed, viewport pixels, bottom-left origin.
    pub warp_origin: ViewportPoint,
}

/// Result of a click's pick readback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PickOutcome {
    Miss,
    Hit { id: u8, raw: i32 },
}

/// Summary of one orchestrated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub time: FrameTime,
    pub instances: usize,
    pub warping: bool,
    /// `None` when there was no click this frame.
    pub pick: Option<PickOutcome>,
}

/// Common uniform contents for session time `now`.
pub fn common_block(camera: &CameraRig, now: f32) -> CommonUniform {
    let offset = (now * OFFSET_RATE).rem_euclid(1.0);
    CommonUniform {
        camera: camera.matrix(now).to_cols_array_2d(),
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
        offset: if offset < 1.0 { offset } else { 0.0 },
        rotate: now * ROTATE_RATE,
        _pad: [0.0; 2],
    }
}
