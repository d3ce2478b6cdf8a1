//! Demo stand-in for a real interpreter: sweeps a pixel pattern across the
//! frame at CPU-step rate so the pacing loop has something to draw. Real
//! deployments plug an actual CHIP-8 core in behind [`EmulatorCore`].

use async_trait::async_trait;
use scheduler::{CoreFault, EmulatorCore};
use shared::domain::{Key, DISPLAY_WIDTH, FRAME_PIXELS};

pub struct PatternCore {
    frame: Vec<u8>,
    cursor: usize,
    dirty: bool,
}

impl Default for PatternCore {
    fn default() -> Self {
        Self {
            frame: vec![0; FRAME_PIXELS],
            cursor: 0,
            dirty: false,
        }
    }
}

#[async_trait]
impl EmulatorCore for PatternCore {
    async fn initialize(&mut self) -> Result<(), CoreFault> {
        Ok(())
    }

    fn reset(&mut self) {
        self.frame = vec![0; FRAME_PIXELS];
        self.cursor = 0;
        self.dirty = false;
    }

    fn load_program(&mut self, rom: &[u8]) {
        // Seed the sweep from the image so different ROMs look different.
        self.cursor = rom.iter().map(|byte| *byte as usize).sum::<usize>() % FRAME_PIXELS;
    }

    fn step_cpu_cycle(&mut self) -> Result<(), CoreFault> {
        self.frame[self.cursor] ^= 1;
        self.cursor = (self.cursor + 1) % FRAME_PIXELS;
        // Publish a frame once per completed row.
        if self.cursor % DISPLAY_WIDTH == 0 {
            self.dirty = true;
        }
        Ok(())
    }

    fn step_timer_tick(&mut self) {}

    fn set_key(&mut self, _key: Key, _pressed: bool) {}

    fn frame_is_dirty(&self) -> bool {
        self.dirty
    }

    fn read_frame_buffer(&mut self) -> Vec<u8> {
        self.dirty = false;
        self.frame.clone()
    }
}
