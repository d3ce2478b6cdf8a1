use serde::{Deserialize, Serialize};

use crate::{domain::RunState, error::SchedulerError};

/// Commands posted by the host controller to the pacing scheduler.
///
/// Wire shape: `{"type": "...", "data": {...}}`, unit commands carry no
/// `data` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum HostCommand {
    Init,
    LoadRom {
        rom: Vec<u8>,
    },
    #[serde(rename_all = "camelCase")]
    Input {
        key: u8,
        is_pressed: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetFrequencies {
        cpu_frequency: f64,
        timer_frequency: f64,
    },
    Pause,
    Resume,
    Stop,
}

/// Notifications posted by the pacing scheduler to the host.
///
/// Internally tagged so `draw` keeps its pixel buffer at the top level:
/// `{"type": "draw", "gfx": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchedulerEvent {
    Initialized,
    /// One byte per pixel, 0 or 1, `FRAME_PIXELS` long.
    Draw { gfx: Vec<u8> },
    /// A command was dropped; the scheduler carries on.
    Rejected { error: SchedulerError },
    /// The emulator capability faulted; the scheduler is now stopped.
    Faulted { error: SchedulerError },
    StateChanged { state: RunState },
}

impl SchedulerEvent {
    /// Wire tag of this event, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Draw { .. } => "draw",
            Self::Rejected { .. } => "rejected",
            Self::Faulted { .. } => "faulted",
            Self::StateChanged { .. } => "stateChanged",
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
