use serde::{Deserialize, Serialize};

/// Decoded input event delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Horizontal axis in [-1, 1]; holds until the next move event.
    Move { axis: f32 },
    JumpPressed,
    JumpReleased,
    TetherToggle,
    CrouchToggle,
}

/// Everything latched since the previous step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub move_axis: f32,
    pub jump_pressed: bool,
    /// Release observed after the last press of this frame.
    pub jump_released: bool,
    pub tether_toggle: bool,
    pub crouch_toggle: bool,
}

/// Accumulates events between steps. The simulation never waits on input:
/// an empty latch just means nothing new happened.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    axis: f32,
    jump_pressed: bool,
    jump_released: bool,
    tether_toggles: u32,
    crouch_toggles: u32,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::Move { axis } => {
                self.axis = if axis.is_finite() { axis.clamp(-1.0, 1.0) } else { 0.0 };
            }
            InputEvent::JumpPressed => {
                // A press after a release in the same frame starts a new hold.
                self.jump_pressed = true;
                self.jump_released = false;
            }
            InputEvent::JumpReleased => self.jump_released = true,
            InputEvent::TetherToggle => self.tether_toggles += 1,
            InputEvent::CrouchToggle => self.crouch_toggles += 1,
        }
    }

    /// Drains one-shot events; the move axis persists.
    pub fn take_frame(&mut self) -> InputFrame {
        let frame = InputFrame {
            move_axis: self.axis,
            jump_pressed: self.jump_pressed,
            jump_released: self.jump_released,
            tether_toggle: self.tether_toggles % 2 == 1,
            crouch_toggle: self.crouch_toggles % 2 == 1,
        };
        self.jump_pressed = false;
        self.jump_released = false;
        self.tether_toggles = 0;
        self.crouch_toggles = 0;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_persists_and_clamps() {
        let mut latch = InputLatch::new();
        latch.push(InputEvent::Move { axis: 3.0 });
        assert_eq!(latch.take_frame().move_axis, 1.0);
        assert_eq!(latch.take_frame().move_axis, 1.0);
        latch.push(InputEvent::Move { axis: f32::NAN });
        assert_eq!(latch.take_frame().move_axis, 0.0);
    }

    #[test]
    fn test_one_shot_events_drain() {
        let mut latch = InputLatch::new();
        latch.push(InputEvent::JumpPressed);
        latch.push(InputEvent::TetherToggle);
        let frame = latch.take_frame();
        assert!(frame.jump_pressed);
        assert!(frame.tether_toggle);
        assert_eq!(latch.take_frame(), InputFrame::default());
    }

    #[test]
    fn test_tap_within_one_frame() {
        let mut latch = InputLatch::new();
        latch.push(InputEvent::JumpPressed);
        latch.push(InputEvent::JumpReleased);
        let frame = latch.take_frame();
        assert!(frame.jump_pressed && frame.jump_released);

        latch.push(InputEvent::JumpReleased);
        latch.push(InputEvent::JumpPressed);
        let frame = latch.take_frame();
        assert!(frame.jump_pressed && !frame.jump_released);
    }

    #[test]
    fn test_toggles_cancel_in_pairs() {
        let mut latch = InputLatch::new();
        latch.push(InputEvent::TetherToggle);
        latch.push(InputEvent::TetherToggle);
        latch.push(InputEvent::CrouchToggle);
        let frame = latch.take_frame();
        assert!(!frame.tether_toggle);
        assert!(frame.crouch_toggle);
    }

    #[test]
    fn test_event_json_shape() {
        let event: InputEvent = serde_json::from_str(r#"{"type":"move","axis":-0.5}"#).unwrap();
        assert_eq!(event, InputEvent::Move { axis: -0.5 });
        let event: InputEvent = serde_json::from_str(r#"{"type":"jump_pressed"}"#).unwrap();
        assert_eq!(event, InputEvent::JumpPressed);
    }
}
