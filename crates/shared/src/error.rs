use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors the scheduler reports back to the host.
///
/// `NotReady`, `InvalidFrequency` and `NoProgramLoaded` are recovered
/// locally: the offending command is dropped and acknowledged with a
/// rejection notification. `EmulatorFault` forces the scheduler into
/// `Stopped`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("scheduler has not completed initialization")]
    NotReady,
    #[error("invalid frequencies: cpu {cpu} Hz, timer {timer} Hz")]
    InvalidFrequency { cpu: f64, timer: f64 },
    #[error("no program image has been loaded")]
    NoProgramLoaded,
    #[error("emulator fault: {message}")]
    EmulatorFault { message: String },
}
