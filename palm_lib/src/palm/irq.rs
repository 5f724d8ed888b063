//! Interrupt lines driven by the emulated peripherals

use crate::state::{SaveState, StateReader, StateWriter};

/// Interrupt lanes, numbered after their bit in the interrupt pending register
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// IRQ5, wired to the touchscreen controller's PENIRQ output
    Pen = 20,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InterruptState {
    /// Interrupt lane levels
    level: u32,
    /// Interrupt status, latched on rising edges until acknowledged
    status: u32,
    /// Interrupt mask
    mask: u32,
}

impl InterruptState {
    pub fn new() -> InterruptState {
        InterruptState::default()
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Current level of the lane
    pub fn is_high(&self, which: Interrupt) -> bool {
        self.level & (1 << which as u32) != 0
    }

    pub fn set_high(&mut self, which: Interrupt) {
        let m = 1 << which as u32;

        if self.level & m != 0 {
            // No change
            return;
        }

        // Rising edge
        self.level |= m;
        self.status |= m;
    }

    pub fn set_low(&mut self, which: Interrupt) {
        let m = 1 << which as u32;

        self.level &= !m;
    }

    pub fn set_level(&mut self, which: Interrupt, high: bool) {
        if high {
            self.set_high(which);
        } else {
            self.set_low(which);
        }
    }

    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Acknowledge interrupts by writing 1 to the corresponding bit. Lanes still held high are
    /// latched again immediately since the lines are level triggered.
    pub fn ack(&mut self, ack: u32) {
        self.status &= !ack;
        self.status |= self.level & ack;
    }

    /// Returns true if we currently have at least one active and unmasked interrupt
    pub fn active(&self) -> bool {
        self.status & self.mask != 0
    }
}

impl SaveState for InterruptState {
    fn state_size(&self) -> usize {
        12
    }

    fn save_state(&self, data: &mut [u8]) {
        let mut w = StateWriter::new(data);

        w.write_u32(self.level);
        w.write_u32(self.status);
        w.write_u32(self.mask);
    }

    fn load_state(&mut self, data: &[u8]) {
        let mut r = StateReader::new(data);

        self.level = r.read_u32();
        self.status = r.read_u32();
        self.mask = r.read_u32();
    }
}
