use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use scheduler::SchedulerHandle;
use shared::{
    domain::{RunState, DISPLAY_WIDTH},
    protocol::HostCommand,
};

mod controller;
mod pattern_core;

use controller::HostController;
use pattern_core::PatternCore;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a CHIP-8 ROM image.
    #[arg(long)]
    rom: PathBuf,
    /// CPU frequency in Hz (clamped to 400-1200).
    #[arg(long, default_value_t = 600.0)]
    cpu_hz: f64,
    /// Timer frequency in Hz (clamped to 30-120).
    #[arg(long, default_value_t = 60.0)]
    timer_hz: f64,
    /// How long to run before stopping, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    run_ms: u64,
}

/// Host redraw cadence; independent of how often draw notifications arrive.
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let handle = scheduler::spawn(PatternCore::default()).context("spawn scheduler worker")?;
    let mut controller = HostController::new();

    post(&handle, HostCommand::Init).await?;
    wait_for_state(&handle, &mut controller, RunState::Ready)?;

    post(
        &handle,
        controller.set_frequencies(args.cpu_hz, args.timer_hz),
    )
    .await?;

    // The file read is async; the command is posted only once the byte
    // buffer is fully materialized.
    let rom = tokio::fs::read(&args.rom)
        .await
        .with_context(|| format!("read rom {}", args.rom.display()))?;
    info!(bytes = rom.len(), "rom read");
    post(&handle, HostCommand::LoadRom { rom }).await?;

    let started = Instant::now();
    while started.elapsed() < Duration::from_millis(args.run_ms) {
        for event in handle.events().try_iter() {
            controller.apply_event(event);
        }
        if let Some(frame) = controller.latest_frame() {
            render(frame);
        }
        tokio::time::sleep(REDRAW_INTERVAL).await;
    }

    post(&handle, HostCommand::Stop).await?;
    wait_for_state(&handle, &mut controller, RunState::Stopped)?;
    info!(frames = controller.frames_received(), "session finished");
    Ok(())
}

async fn post(handle: &SchedulerHandle, command: HostCommand) -> Result<()> {
    handle
        .send(command)
        .await
        .map_err(|_| anyhow::anyhow!("scheduler worker is gone"))
}

fn wait_for_state(
    handle: &SchedulerHandle,
    controller: &mut HostController,
    wanted: RunState,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.scheduler_state() != wanted {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .with_context(|| format!("timed out waiting for scheduler state {wanted:?}"))?;
        let event = handle
            .events()
            .recv_timeout(remaining)
            .with_context(|| format!("waiting for scheduler state {wanted:?}"))?;
        controller.apply_event(event);
    }
    Ok(())
}

fn render(frame: &[u8]) {
    let mut out = String::with_capacity(frame.len() + frame.len() / DISPLAY_WIDTH);
    for row in frame.chunks(DISPLAY_WIDTH) {
        for pixel in row {
            out.push(if *pixel == 0 { ' ' } else { '#' });
        }
        out.push('\n');
    }
    println!("{out}");
}
