//! Host-side protocol adapter: translates user intents into commands and
//! mirrors scheduler notifications into presentation state.

pub mod keymap;

use shared::{
    domain::RunState,
    protocol::{HostCommand, SchedulerEvent},
};
use tracing::{info, warn};

/// UI slider ranges; values outside are clamped before a command is posted.
pub const CPU_HZ_MIN: f64 = 400.0;
pub const CPU_HZ_MAX: f64 = 1200.0;
pub const TIMER_HZ_MIN: f64 = 30.0;
pub const TIMER_HZ_MAX: f64 = 120.0;

/// Holds nothing but the latest known scheduler mode (for enabling and
/// disabling affordances) and the latest frame buffer for display.
pub struct HostController {
    scheduler_state: RunState,
    latest_frame: Option<Vec<u8>>,
    frames_received: u64,
    last_rejection: Option<String>,
}

impl HostController {
    pub fn new() -> Self {
        Self {
            scheduler_state: RunState::Uninitialized,
            latest_frame: None,
            frames_received: 0,
            last_rejection: None,
        }
    }

    pub fn scheduler_state(&self) -> RunState {
        self.scheduler_state
    }

    pub fn latest_frame(&self) -> Option<&[u8]> {
        self.latest_frame.as_deref()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn last_rejection(&self) -> Option<&str> {
        self.last_rejection.as_deref()
    }

    /// Frames are latest-writer-wins: draw notifications may arrive at any
    /// rate, the UI redraws whatever is newest on its own cadence.
    pub fn apply_event(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Initialized => info!("emulator ready"),
            SchedulerEvent::Draw { gfx } => {
                self.latest_frame = Some(gfx);
                self.frames_received += 1;
            }
            SchedulerEvent::StateChanged { state } => {
                info!(?state, "scheduler state");
                self.scheduler_state = state;
            }
            SchedulerEvent::Rejected { error } => {
                warn!(%error, "command rejected by scheduler");
                self.last_rejection = Some(error.to_string());
            }
            SchedulerEvent::Faulted { error } => {
                warn!(%error, "emulator fault, scheduler stopped");
                self.last_rejection = Some(error.to_string());
            }
        }
    }

    /// Build a frequency command, clamped to the slider ranges.
    pub fn set_frequencies(&self, cpu_hz: f64, timer_hz: f64) -> HostCommand {
        HostCommand::SetFrequencies {
            cpu_frequency: cpu_hz.clamp(CPU_HZ_MIN, CPU_HZ_MAX),
            timer_frequency: timer_hz.clamp(TIMER_HZ_MIN, TIMER_HZ_MAX),
        }
    }

    /// Map a keyboard character to a hex-pad input command, if it is bound.
    pub fn key_event(&self, key: char, pressed: bool) -> Option<HostCommand> {
        keymap::map_key(key).map(|key| HostCommand::Input {
            key,
            is_pressed: pressed,
        })
    }
}

impl Default for HostController {
    fn default() -> Self {
        Self::new()
    }
}
