use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use crate::app::camera_controller::DragMode;

/// Pointer state relevant to the camera: which buttons are held and where the cursor is
#[derive(Default)]
pub struct InputState {
    pub mouse_curr_pos: Vec2,
    pub mouse_left_down: bool,
    pub mouse_right_down: bool,
}

impl InputState {
    pub fn process_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button,
                ..
            } => {
                let down = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.mouse_left_down = down,
                    MouseButton::Right => self.mouse_right_down = down,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved {
                position,
                ..
            } => {
                self.mouse_curr_pos = Vec2::new(position.x as f32, position.y as f32);
            }
            // Buttons released outside the window never report back
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => {
                self.mouse_left_down = false;
                self.mouse_right_down = false;
            }
            _ => {}
        }
    }

    /// Left drag orbits, right drag zooms. Left wins when both are held.
    pub fn drag_mode(&self) -> Option<DragMode> {
        if self.mouse_left_down {
            Some(DragMode::Orbit)
        } else if self.mouse_right_down {
            Some(DragMode::Zoom)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_buttons_means_no_drag() {
        assert_eq!(InputState::default().drag_mode(), None);
    }

    #[test]
    fn buttons_select_drag_mode() {
        let mut input = InputState::default();
        input.mouse_right_down = true;
        assert_eq!(input.drag_mode(), Some(DragMode::Zoom));
        input.mouse_left_down = true;
        assert_eq!(input.drag_mode(), Some(DragMode::Orbit));
    }

    #[test]
    fn losing_focus_releases_buttons() {
        let mut input = InputState::default();
        input.mouse_left_down = true;
        input.process_window_events(&WindowEvent::Focused(false));
        assert!(!input.mouse_left_down);
        assert_eq!(input.drag_mode(), None);
    }
}
