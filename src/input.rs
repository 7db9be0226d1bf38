//! Keyboard controls.
//!
//! [`Controls`] tracks which movement keys are held and turns them into a
//! [`MovementIntent`] for the player. What Space and Shift mean depends on
//! whether the player is flying.

use winit::keyboard::KeyCode;

/// What the player wants to do this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    pub jump: bool,
}

/// One-shot actions triggered by a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleFly,
}

#[derive(Clone, Debug, Default)]
pub struct Controls {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    space: bool,
    shift: bool,
    crouch: bool,
    fly_key_down: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key state change. Returns a command on the press edge of a
    /// command key; held or repeated keys do not retrigger it.
    pub fn handle_key(&mut self, code: KeyCode, pressed: bool) -> Option<Command> {
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::Space => self.space = pressed,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.shift = pressed,
            KeyCode::KeyC => self.crouch = pressed,
            KeyCode::KeyF => {
                let was_down = self.fly_key_down;
                self.fly_key_down = pressed;
                if pressed && !was_down {
                    return Some(Command::ToggleFly);
                }
            }
            _ => (),
        }
        None
    }

    /// Forget every held key, e.g. when the window loses focus and release
    /// events will never arrive.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn intent(&self, fly_mode: bool) -> MovementIntent {
        MovementIntent {
            forward: self.forward,
            backward: self.backward,
            left: self.left,
            right: self.right,
            up: fly_mode && self.space,
            down: fly_mode && (self.shift || self.crouch),
            sprint: !fly_mode && self.shift,
            jump: !fly_mode && self.space,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_to_the_same_intent() {
        let mut wasd = Controls::new();
        wasd.handle_key(KeyCode::KeyW, true);
        wasd.handle_key(KeyCode::KeyA, true);
        let mut arrows = Controls::new();
        arrows.handle_key(KeyCode::ArrowUp, true);
        arrows.handle_key(KeyCode::ArrowLeft, true);
        assert_eq!(wasd.intent(false), arrows.intent(false));
        assert!(wasd.intent(false).forward && wasd.intent(false).left);
    }

    #[test]
    fn space_and_shift_depend_on_mode() {
        let mut controls = Controls::new();
        controls.handle_key(KeyCode::Space, true);
        controls.handle_key(KeyCode::ShiftLeft, true);

        let walking = controls.intent(false);
        assert!(walking.jump && walking.sprint);
        assert!(!walking.up && !walking.down);

        let flying = controls.intent(true);
        assert!(flying.up && flying.down);
        assert!(!flying.jump && !flying.sprint);
    }

    #[test]
    fn fly_toggle_fires_once_per_press() {
        let mut controls = Controls::new();
        assert_eq!(controls.handle_key(KeyCode::KeyF, true), Some(Command::ToggleFly));
        // key repeat
        assert_eq!(controls.handle_key(KeyCode::KeyF, true), None);
        assert_eq!(controls.handle_key(KeyCode::KeyF, false), None);
        assert_eq!(controls.handle_key(KeyCode::KeyF, true), Some(Command::ToggleFly));
    }

    #[test]
    fn release_all_clears_intent() {
        let mut controls = Controls::new();
        controls.handle_key(KeyCode::KeyD, true);
        controls.handle_key(KeyCode::KeyC, true);
        controls.release_all();
        assert_eq!(controls.intent(true), MovementIntent::default());
    }
}
