use serde::{Deserialize, Serialize};

/// Operator input for one capture cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Command {
    /// Keep the current cycle's detections if both sides found the board.
    Accept,
    /// Stop capturing immediately.
    Abort,
    #[default]
    Continue,
}

/// Key codes translated into [`Command`]s at the input boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub accept: i32,
    pub abort: i32,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            accept: 32, // space
            abort: 27,  // ESC
        }
    }
}

impl KeyBindings {
    /// Map a polled key code; anything unbound (including "no key") continues.
    /// Only the low byte is compared.
    pub fn command(&self, key: i32) -> Command {
        if key < 0 {
            return Command::Continue;
        }
        let key = key & 0xFF;
        if key == self.abort {
            Command::Abort
        } else if key == self.accept {
            Command::Accept
        } else {
            Command::Continue
        }
    }
}
