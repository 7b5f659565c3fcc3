use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{
    InputEvent,
    Key,
    KeyState,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
    PointerState,
};

/// Current input state for the window.
///
/// Holds "is down" information and the last known pointer position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Last known pointer position in surface pixels.
    ///
    /// Kept after the pointer leaves the surface so a late click still
    /// resolves against the edge the pointer exited through.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            // Focus loss mid-press would otherwise leave keys and buttons stuck.
            InputEvent::Focused(false) => {
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            InputEvent::Focused(true) => {}

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((x, y));
            }

            InputEvent::Key { key, state } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(key) {
                        frame.keys_pressed.insert(key);
                    }
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y }) => {
                self.pointer_pos = Some((x, y));

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(button) {
                            frame.buttons_pressed.insert(button);
                        }
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(&button);
                    }
                }
            }
        }
    }

    /// Builds the pointer snapshot for the current frame.
    ///
    /// Coordinates are truncated to whole pixels; a pointer that was never
    /// seen reports the origin.
    pub fn pointer(&self, frame: &InputFrame) -> PointerState {
        let (x, y) = self.pointer_pos.unwrap_or((0.0, 0.0));
        PointerState {
            x: x as i32,
            y: y as i32,
            clicked: frame.clicked(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(button: MouseButton, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button,
            state: MouseButtonState::Pressed,
            x,
            y,
        })
    }

    #[test]
    fn left_press_sets_click_for_one_frame() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, press(MouseButton::Left, 10.7, 20.2));
        let p = state.pointer(&frame);
        assert!(p.clicked);
        assert_eq!((p.x, p.y), (10, 20));

        frame.clear();
        assert!(!state.pointer(&frame).clicked);
    }

    #[test]
    fn right_press_is_not_a_click() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, press(MouseButton::Right, 1.0, 1.0));
        assert!(!state.pointer(&frame).clicked);
        assert!(state.buttons_down.contains(&MouseButton::Right));
    }

    #[test]
    fn held_button_does_not_click_again() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, press(MouseButton::Left, 0.0, 0.0));
        frame.clear();
        state.apply_event(&mut frame, press(MouseButton::Left, 0.0, 0.0));
        assert!(!frame.clicked());
    }

    #[test]
    fn pointer_outside_surface_is_not_clamped() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: -5.0, y: 900.0 }));
        let p = state.pointer(&frame);
        assert_eq!((p.x, p.y), (-5, 900));
    }

    #[test]
    fn escape_press_is_a_one_frame_edge() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        let escape = InputEvent::Key { key: Key::Escape, state: KeyState::Pressed };

        state.apply_event(&mut frame, escape.clone());
        assert!(frame.keys_pressed.contains(&Key::Escape));

        frame.clear();
        state.apply_event(&mut frame, escape);
        assert!(frame.keys_pressed.is_empty());
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, press(MouseButton::Left, 0.0, 0.0));
        state.apply_event(
            &mut frame,
            InputEvent::Key { key: Key::Escape, state: KeyState::Pressed },
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(state.buttons_down.is_empty());
        assert!(state.keys_down.is_empty());
    }
}
