//! Pacing parameters and drift-tolerant cycle bookkeeping.

use shared::error::SchedulerError;

pub const DEFAULT_CPU_HZ: f64 = 600.0;
pub const DEFAULT_TIMER_HZ: f64 = 60.0;

/// Longest elapsed window a single pacing pass converts into steps.
///
/// After a host stall longer than this, the backlog beyond one window is
/// discarded instead of replayed, so a stall costs at most one capped pass
/// rather than a sustained catch-up storm.
pub const MAX_CATCHUP_WINDOW_MS: f64 = 1000.0;

/// Guards `floor` against an elapsed time that is a whole number of periods
/// up to f64 rounding (e.g. 10ms at an 0.8333..ms period must yield 12).
const STEP_EPSILON: f64 = 1e-9;

/// CPU and timer frequencies with their derived periods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    cpu_hz: f64,
    timer_hz: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            timer_hz: DEFAULT_TIMER_HZ,
        }
    }
}

impl ClockConfig {
    /// Both frequencies must be finite and strictly positive.
    pub fn new(cpu_hz: f64, timer_hz: f64) -> Result<Self, SchedulerError> {
        if !cpu_hz.is_finite() || cpu_hz <= 0.0 || !timer_hz.is_finite() || timer_hz <= 0.0 {
            return Err(SchedulerError::InvalidFrequency {
                cpu: cpu_hz,
                timer: timer_hz,
            });
        }
        Ok(Self { cpu_hz, timer_hz })
    }

    pub fn cpu_hz(&self) -> f64 {
        self.cpu_hz
    }

    pub fn timer_hz(&self) -> f64 {
        self.timer_hz
    }

    pub fn cpu_period_ms(&self) -> f64 {
        1000.0 / self.cpu_hz
    }

    pub fn timer_period_ms(&self) -> f64 {
        1000.0 / self.timer_hz
    }
}

/// Drift-tolerant bookkeeping of elapsed virtual-clock periods.
///
/// Each clock's timestamp only ever advances by whole periods, one per
/// executed step, so fractional leftover time carries into the next pass
/// instead of being rounded away. Frequency fidelity is prioritized over
/// wall-clock smoothness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleAccumulator {
    last_cpu_tick_ms: f64,
    last_timer_tick_ms: f64,
}

impl CycleAccumulator {
    /// Restart both clocks at `now_ms`, discarding any elapsed time.
    /// Called on every transition into `Running` from a non-running state,
    /// so idle time is never converted into a burst of cycles.
    pub fn realign(&mut self, now_ms: f64) {
        self.last_cpu_tick_ms = now_ms;
        self.last_timer_tick_ms = now_ms;
    }

    pub fn last_cpu_tick_ms(&self) -> f64 {
        self.last_cpu_tick_ms
    }

    pub fn last_timer_tick_ms(&self) -> f64 {
        self.last_timer_tick_ms
    }

    /// Whole CPU periods elapsed since the last committed CPU step, capped
    /// to [`MAX_CATCHUP_WINDOW_MS`]. Capping realigns the clock so the
    /// excess backlog is dropped rather than drained over later passes.
    pub fn due_cpu_steps(&mut self, now_ms: f64, period_ms: f64) -> u64 {
        Self::due_steps(&mut self.last_cpu_tick_ms, now_ms, period_ms)
    }

    pub fn due_timer_steps(&mut self, now_ms: f64, period_ms: f64) -> u64 {
        Self::due_steps(&mut self.last_timer_tick_ms, now_ms, period_ms)
    }

    /// Advance the CPU clock by exactly one period. One call per executed
    /// step; the timestamp never moves backward.
    pub fn commit_cpu_step(&mut self, period_ms: f64) {
        self.last_cpu_tick_ms += period_ms;
    }

    pub fn commit_timer_step(&mut self, period_ms: f64) {
        self.last_timer_tick_ms += period_ms;
    }

    fn due_steps(last_ms: &mut f64, now_ms: f64, period_ms: f64) -> u64 {
        let elapsed = now_ms - *last_ms;
        if elapsed <= 0.0 {
            return 0;
        }
        if elapsed > MAX_CATCHUP_WINDOW_MS {
            *last_ms = now_ms - MAX_CATCHUP_WINDOW_MS;
        }
        let due = ((now_ms - *last_ms) / period_ms + STEP_EPSILON).floor();
        if due <= 0.0 {
            0
        } else {
            due as u64
        }
    }
}

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
mod tests;
