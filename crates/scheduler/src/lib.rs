//! Emulation pacing scheduler: advances a CHIP-8 core and its timer unit at
//! independently configurable frequencies, decoupled from the host's redraw
//! rate.
//!
//! The scheduler runs in its own worker context (see [`worker`]) and talks
//! to the host controller exclusively through [`HostCommand`] /
//! [`SchedulerEvent`] messages. The interpreter itself sits behind the
//! [`EmulatorCore`] capability trait and is exclusively owned by the
//! scheduler; no other component calls into it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use shared::{
    domain::{Key, RunState},
    error::SchedulerError,
    protocol::{HostCommand, SchedulerEvent},
};

pub mod clock;
pub mod worker;

pub use clock::{ClockConfig, CycleAccumulator, MAX_CATCHUP_WINDOW_MS};
pub use worker::{spawn, SchedulerHandle};

/// Fault reported by the emulator capability during initialization or a
/// CPU step. Opaque to the scheduler beyond its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoreFault {
    pub message: String,
}

impl CoreFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The emulator capability the scheduler steps and queries.
///
/// Instruction semantics live entirely behind this trait.
#[async_trait]
pub trait EmulatorCore: Send {
    /// One-shot readiness future. Must complete successfully before any
    /// other method is called.
    async fn initialize(&mut self) -> Result<(), CoreFault>;

    /// Reinitialize to a blank, deterministic state.
    fn reset(&mut self);

    fn load_program(&mut self, rom: &[u8]);

    fn step_cpu_cycle(&mut self) -> Result<(), CoreFault>;

    fn step_timer_tick(&mut self);

    fn set_key(&mut self, key: Key, pressed: bool);

    fn frame_is_dirty(&self) -> bool;

    /// Read the 64x32 one-byte-per-pixel buffer and clear the dirty flag.
    fn read_frame_buffer(&mut self) -> Vec<u8>;
}

/// The run-state machine and cycle-accounting loop.
///
/// Owned state threaded through the worker loop; there is no global
/// mutation anywhere. Timestamps are injected (`now_ms`), which keeps the
/// whole machine deterministic under test.
pub struct PacingScheduler<C> {
    state: RunState,
    clock: ClockConfig,
    accumulator: CycleAccumulator,
    core: C,
    program_loaded: bool,
}

impl<C: EmulatorCore> PacingScheduler<C> {
    pub fn new(core: C) -> Self {
        Self {
            state: RunState::Uninitialized,
            clock: ClockConfig::default(),
            accumulator: CycleAccumulator::default(),
            core,
            program_loaded: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn clock(&self) -> ClockConfig {
        self.clock
    }

    pub fn accumulator(&self) -> CycleAccumulator {
        self.accumulator
    }

    /// Apply one host command at host time `now_ms`, returning the
    /// notifications to post back.
    pub async fn handle_command(&mut self, command: HostCommand, now_ms: f64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        match command {
            HostCommand::Init => {
                if self.state != RunState::Uninitialized {
                    debug!(state = ?self.state, "init ignored, core already initialized");
                    return events;
                }
                match self.core.initialize().await {
                    Ok(()) => {
                        self.transition(RunState::Ready, &mut events);
                        events.push(SchedulerEvent::Initialized);
                    }
                    Err(fault) => {
                        warn!(%fault, "core initialization failed");
                        events.push(SchedulerEvent::Faulted {
                            error: SchedulerError::EmulatorFault {
                                message: fault.to_string(),
                            },
                        });
                    }
                }
            }
            HostCommand::LoadRom { rom } => {
                if self.state == RunState::Uninitialized {
                    events.push(Self::reject("loadRom", SchedulerError::NotReady));
                    return events;
                }
                self.core.reset();
                self.core.load_program(&rom);
                self.program_loaded = true;
                self.accumulator.realign(now_ms);
                info!(bytes = rom.len(), "program loaded");
                self.transition(RunState::Running, &mut events);
            }
            HostCommand::Input { key, is_pressed } => {
                if self.state == RunState::Uninitialized {
                    events.push(Self::reject("input", SchedulerError::NotReady));
                    return events;
                }
                match Key::new(key) {
                    Some(key) => self.core.set_key(key, is_pressed),
                    None => warn!(key, "input outside the hex pad dropped"),
                }
            }
            HostCommand::SetFrequencies {
                cpu_frequency,
                timer_frequency,
            } => match ClockConfig::new(cpu_frequency, timer_frequency) {
                // New periods take effect on the next pass; the accumulator
                // is left alone so the change neither credits nor debits
                // already-elapsed time.
                Ok(clock) => {
                    self.clock = clock;
                    info!(cpu_hz = cpu_frequency, timer_hz = timer_frequency, "clock reconfigured");
                }
                Err(error) => events.push(Self::reject("setFrequencies", error)),
            },
            HostCommand::Pause => {
                if self.state == RunState::Running {
                    self.transition(RunState::Paused, &mut events);
                } else {
                    debug!(state = ?self.state, "pause ignored");
                }
            }
            HostCommand::Resume => match self.state {
                RunState::Paused => {
                    // Idle time during pause is discarded, never replayed.
                    self.accumulator.realign(now_ms);
                    self.transition(RunState::Running, &mut events);
                }
                RunState::Running => debug!("resume ignored, already running"),
                RunState::Uninitialized => {
                    events.push(Self::reject("resume", SchedulerError::NotReady));
                }
                RunState::Ready | RunState::Stopped => {
                    events.push(Self::reject("resume", SchedulerError::NoProgramLoaded));
                }
            },
            HostCommand::Stop => {
                if self.state == RunState::Uninitialized {
                    events.push(Self::reject("stop", SchedulerError::NotReady));
                } else {
                    self.halt(&mut events);
                }
            }
        }
        events
    }

    /// One cycle-accounting pass at host time `now_ms`. No-op unless
    /// running. Tolerates arbitrarily irregular intervals between passes;
    /// work per pass is bounded by [`MAX_CATCHUP_WINDOW_MS`].
    pub fn pacing_pass(&mut self, now_ms: f64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        if self.state != RunState::Running {
            return events;
        }

        let cpu_period = self.clock.cpu_period_ms();
        let cpu_steps = self.accumulator.due_cpu_steps(now_ms, cpu_period);
        for _ in 0..cpu_steps {
            if let Err(fault) = self.core.step_cpu_cycle() {
                warn!(%fault, "cpu step faulted, stopping");
                self.halt(&mut events);
                events.push(SchedulerEvent::Faulted {
                    error: SchedulerError::EmulatorFault {
                        message: fault.to_string(),
                    },
                });
                return events;
            }
            self.accumulator.commit_cpu_step(cpu_period);
        }

        let timer_period = self.clock.timer_period_ms();
        let timer_steps = self.accumulator.due_timer_steps(now_ms, timer_period);
        for _ in 0..timer_steps {
            self.core.step_timer_tick();
            self.accumulator.commit_timer_step(timer_period);
        }

        if self.core.frame_is_dirty() {
            events.push(SchedulerEvent::Draw {
                gfx: self.core.read_frame_buffer(),
            });
        }
        events
    }

    /// Halt the loop and reinitialize the core to a blank state. Safe to
    /// reach from any initialized state, including mid-catch-up.
    fn halt(&mut self, events: &mut Vec<SchedulerEvent>) {
        self.core.reset();
        self.program_loaded = false;
        self.transition(RunState::Stopped, events);
    }

    fn transition(&mut self, next: RunState, events: &mut Vec<SchedulerEvent>) {
        if self.state == next {
            return;
        }
        info!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        events.push(SchedulerEvent::StateChanged { state: next });
    }

    fn reject(command: &str, error: SchedulerError) -> SchedulerEvent {
        warn!(command, %error, "command rejected");
        SchedulerEvent::Rejected { error }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
