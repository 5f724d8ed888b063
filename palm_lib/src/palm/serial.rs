//! Synchronous serial bus plumbing shared by the chip-select + clocked bit peripherals

use super::input::{MiscHw, PalmInput};
use super::irq::InterruptState;
use crate::bitwise::Bitwise;
use crate::state::SaveState;

/// What a serial device can see and drive outside of its own registers
pub struct DeviceContext<'a> {
    pub input: &'a PalmInput,
    pub misc: &'a MiscHw,
    pub irq: &'a mut InterruptState,
}

/// Trait used to abstract away the various chips sitting on a chip-select gated serial bus.
///
/// All of them share the same contract: a reset when the select line is released, a protocol
/// decoded one clocked bit at a time and a savestate block of constant size.
pub trait SerialDevice: SaveState {
    /// Human-readable description of the device
    fn description(&self) -> String;

    /// Hard reset, as if the device had just been powered on
    fn reset(&mut self, ctx: &mut DeviceContext);

    /// Called every time the level of the select line changes or is rewritten. `line_high` is
    /// the electrical level: the line is active low, so the device is selected when it's false.
    fn set_chip_select(&mut self, line_high: bool, ctx: &mut DeviceContext);

    /// Called once per serial clock. Samples `bit_in` and returns the level of the data out line.
    fn exchange_bit(&mut self, bit_in: bool, ctx: &mut DeviceContext) -> bool;
}

/// Dummy device emulating an empty bus: nothing ever drives the data line so it's pulled high.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Default)]
pub struct DisconnectedDevice;

impl SaveState for DisconnectedDevice {
    fn state_size(&self) -> usize {
        0
    }

    fn save_state(&self, _: &mut [u8]) {}

    fn load_state(&mut self, _: &[u8]) {}
}

impl SerialDevice for DisconnectedDevice {
    fn description(&self) -> String {
        "Disconnected".to_string()
    }

    fn reset(&mut self, _: &mut DeviceContext) {}

    fn set_chip_select(&mut self, _: bool, _: &mut DeviceContext) {}

    fn exchange_bit(&mut self, _: bool, _: &mut DeviceContext) -> bool {
        true
    }
}

/// Master side of a serial port, the way the SPI controller drives it: it owns the select line
/// and clocks whole words through the connected device.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
pub struct SerialPort<D> {
    device: D,
}

impl<D: SerialDevice> SerialPort<D> {
    pub fn new(device: D) -> SerialPort<D> {
        SerialPort { device }
    }

    /// Return a reference to the connected device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Return a mutable reference to the connected device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn reset(&mut self, ctx: &mut DeviceContext) {
        self.device.reset(ctx);
    }

    pub fn set_chip_select(&mut self, line_high: bool, ctx: &mut DeviceContext) {
        self.device.set_chip_select(line_high, ctx);
    }

    pub fn exchange_bit(&mut self, bit_in: bool, ctx: &mut DeviceContext) -> bool {
        self.device.exchange_bit(bit_in, ctx)
    }

    /// Clock the `bits` low bits of `data` out MSB-first and return the bits received, packed
    /// the same way. Words are at most 16 bits long, larger lengths are clamped.
    pub fn exchange_word(&mut self, data: u16, bits: u8, ctx: &mut DeviceContext) -> u16 {
        if bits > 16 {
            warn!("Invalid SPI word length {}, clamped to 16", bits);
        }

        let bits = bits.min(16);
        let mut response = 0u16;

        for pos in (0..bits).rev() {
            let bit = self.device.exchange_bit(data.bit(pos), ctx);
            response.set_bit(pos, bit);
        }

        response
    }
}
