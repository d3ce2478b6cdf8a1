use serde::{Deserialize, Serialize};

/// Fixed visual surface fed by the scheduler, part of the wire contract.
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const FRAME_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// One of the sixteen hex-pad key codes (0x0-0xF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(pub u8);

impl Key {
    pub fn new(code: u8) -> Option<Self> {
        (code <= 0xF).then_some(Self(code))
    }
}

/// Run mode of the pacing scheduler. Transitions only via commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Uninitialized,
    Ready,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
