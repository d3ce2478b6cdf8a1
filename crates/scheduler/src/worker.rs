//! Worker runtime: a dedicated thread that owns the scheduler and its core,
//! reachable from the host only through channels.

use std::{
    io,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::TrySendError;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use shared::protocol::{HostCommand, SchedulerEvent};

use crate::{EmulatorCore, PacingScheduler};

const COMMAND_QUEUE_DEPTH: usize = 64;
const EVENT_QUEUE_DEPTH: usize = 256;

/// Polling cadence of the pacing pass, the stand-in for the host's redraw
/// tick. The pass itself tolerates arbitrary jitter in this interval.
const PASS_INTERVAL: Duration = Duration::from_millis(16);

/// Host-side handle to a spawned scheduler worker.
///
/// Commands flow through a FIFO queue into the worker; notifications flow
/// back through an independent FIFO queue. No ordering holds across the
/// two directions.
pub struct SchedulerHandle {
    commands: mpsc::Sender<HostCommand>,
    events: crossbeam_channel::Receiver<SchedulerEvent>,
}

impl SchedulerHandle {
    pub async fn send(
        &self,
        command: HostCommand,
    ) -> Result<(), mpsc::error::SendError<HostCommand>> {
        self.commands.send(command).await
    }

    pub fn events(&self) -> &crossbeam_channel::Receiver<SchedulerEvent> {
        &self.events
    }
}

/// Spawn the pacing scheduler on its own thread with exclusive ownership of
/// `core`. The worker exits when the handle (and with it the command
/// queue) is dropped.
pub fn spawn<C>(core: C) -> io::Result<SchedulerHandle>
where
    C: EmulatorCore + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_QUEUE_DEPTH);

    thread::Builder::new()
        .name("pacing-scheduler".into())
        .spawn(move || run_worker(core, cmd_rx, event_tx))?;

    Ok(SchedulerHandle {
        commands: cmd_tx,
        events: event_rx,
    })
}

fn run_worker<C: EmulatorCore>(
    core: C,
    mut commands: mpsc::Receiver<HostCommand>,
    events: crossbeam_channel::Sender<SchedulerEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build scheduler worker runtime: {err}");
            return;
        }
    };

    runtime.block_on(async move {
        let started = Instant::now();
        let mut scheduler = PacingScheduler::new(core);
        let mut ticks = tokio::time::interval(PASS_INTERVAL);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("scheduler worker started");

        loop {
            tokio::select! {
                maybe_command = commands.recv() => {
                    let Some(command) = maybe_command else {
                        info!("command channel closed, scheduler worker exiting");
                        break;
                    };
                    let now_ms = started.elapsed().as_secs_f64() * 1000.0;
                    for event in scheduler.handle_command(command, now_ms).await {
                        forward(&events, event);
                    }
                }
                _ = ticks.tick() => {
                    let now_ms = started.elapsed().as_secs_f64() * 1000.0;
                    for event in scheduler.pacing_pass(now_ms) {
                        forward(&events, event);
                    }
                }
            }
        }
    });
}

fn forward(events: &crossbeam_channel::Sender<SchedulerEvent>, event: SchedulerEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(kind = event.kind(), "host event queue full, dropping notification");
        }
        // Host gone; the worker will notice the closed command queue soon.
        Err(TrySendError::Disconnected(_)) => {}
    }
}
