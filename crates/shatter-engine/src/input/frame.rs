use std::collections::HashSet;

use super::types::{Key, MouseButton};

/// Press edges seen since the previous frame.
///
/// `InputState` provides the held state and pointer position; `InputFrame`
/// only records what went down during the current frame.
///
/// The runtime clears the frame after every `on_frame` call, which is what
/// makes the click flag one-shot.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys pressed this frame.
    pub keys_pressed: HashSet<Key>,

    /// Mouse buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
    }

    /// True if the primary button went down during this frame.
    pub fn clicked(&self) -> bool {
        self.buttons_pressed.contains(&MouseButton::Left)
    }
}
