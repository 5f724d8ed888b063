//! ADS7846 touchscreen controller emulation
//!
//! The chip sits on a 3-wire serial bus. Each transaction starts with a start bit followed by a
//! 7 bit command, a one clock busy period and then the 12 (or 8) bit result shifted out MSB
//! first. The bus master is free to clock in the next start bit while the previous result is
//! still being shifted out, as long as the previous one was at least 16 clocks ago: everything is
//! driven by a single countdown, reloaded on every start bit.

mod channel;
mod control;
#[cfg(test)]
mod tests;

pub use channel::convert;
pub use control::{Channel, ControlByte, Conversion, PowerDown, Reference, Resolution};

use super::input::PalmInput;
use super::irq::{Interrupt, InterruptState};
use super::serial::{DeviceContext, SerialDevice};
use crate::bitwise::Bitwise;
use crate::state::{SaveState, StateReader, StateWriter};

macro_rules! adc_debug {
    ($($arg:tt)+) => (if cfg!(feature = "adc_verbose") { ::log::debug!($($arg)+) })
}

/// Countdown reload value on a start bit: 7 command bits, 1 busy clock and up to 8 output
/// clocks before the next start bit can be recognized.
const FRAME_CLOCKS: u8 = 15;
/// Countdown values above this one are still part of the command
const LAST_COMMAND_CLOCK: u8 = 8;
/// Countdown value at which the command and busy period are over and the result is latched
const CONVERSION_READY: u8 = 6;
/// Clocks saved by an 8 bit conversion
const SHORT_CONVERSION_CLOCKS: u8 = 4;
/// Serialized size: PENIRQ enable, countdown, control byte, output register, chip select
const STATE_SIZE: usize = 6;

/// What a clock edge means for the given countdown value
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ClockPhase {
    /// Idle or done with the previous frame: the input bit may be a start bit
    AwaitingStart,
    /// Shifting in the command byte
    Command,
    /// The conversion result becomes available on this clock
    ConversionReady,
    /// Shifting out the result
    Output,
}

impl ClockPhase {
    fn at(countdown: u8) -> ClockPhase {
        match countdown {
            0 => ClockPhase::AwaitingStart,
            CONVERSION_READY => ClockPhase::ConversionReady,
            c if c >= LAST_COMMAND_CLOCK => ClockPhase::Command,
            _ => ClockPhase::Output,
        }
    }
}

/// User-facing settings, not part of the savestate
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Ads7846Config {
    /// Pulse the pen interrupt line on every conversion that doesn't drive the touchscreen
    /// plates. The OS pen driver relies on it to keep sampling, without it the stylus tends to
    /// get stuck.
    pub fake_pen_irq: bool,
}

impl Default for Ads7846Config {
    fn default() -> Ads7846Config {
        Ads7846Config { fake_pen_irq: true }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Ads7846 {
    /// True if the PENIRQ output is enabled by the last power-down mode
    pen_irq_enabled: bool,
    /// Clocks left until a new start bit is recognized
    bits_to_next_control: u8,
    /// Command being shifted in or last command received
    control: ControlByte,
    /// Output shift register, the MSB is on the data out line
    output: u16,
    /// Level of the active low chip select line
    chip_select: bool,
    #[serde(skip)]
    config: Ads7846Config,
}

impl Ads7846 {
    pub fn new() -> Ads7846 {
        Ads7846::with_config(Ads7846Config::default())
    }

    pub fn with_config(config: Ads7846Config) -> Ads7846 {
        Ads7846 {
            pen_irq_enabled: true,
            bits_to_next_control: 0,
            control: ControlByte::default(),
            output: 0,
            chip_select: true,
            config,
        }
    }

    pub fn config(&self) -> Ads7846Config {
        self.config
    }

    pub fn set_config(&mut self, config: Ads7846Config) {
        self.config = config;
    }

    pub fn pen_irq_enabled(&self) -> bool {
        self.pen_irq_enabled
    }

    pub fn bits_to_next_control(&self) -> u8 {
        self.bits_to_next_control
    }

    pub fn control(&self) -> ControlByte {
        self.control
    }

    pub fn output(&self) -> u16 {
        self.output
    }

    pub fn chip_select(&self) -> bool {
        self.chip_select
    }

    /// Level of the PENIRQ output as seen by the interrupt controller (true when asserted)
    pub fn pen_irq_line(&self, input: &PalmInput) -> bool {
        self.pen_irq_enabled && input.touchscreen_touched
    }

    /// Push the PENIRQ level to the interrupt controller. Must be called whenever the touch state
    /// changes.
    pub fn refresh_pen_irq(&self, input: &PalmInput, irq: &mut InterruptState) {
        irq.set_level(Interrupt::Pen, self.pen_irq_line(input));
    }

    /// Clear the protocol state. The select line itself is left alone.
    fn reset_protocol(&mut self, ctx: &mut DeviceContext) {
        self.bits_to_next_control = 0;
        self.control = ControlByte::default();
        self.pen_irq_enabled = true;
        self.output = 0;
        self.refresh_pen_irq(ctx.input, ctx.irq);
    }

    /// The command and busy period are over: run the conversion and latch the result in the
    /// output shift register.
    fn finish_conversion(&mut self, ctx: &mut DeviceContext) {
        let conversion = self.control.decode();

        adc_debug!(
            "ADS7846 conversion {:?} ({:02x})",
            conversion,
            self.control.raw()
        );

        if self.config.fake_pen_irq {
            ctx.irq
                .set_level(Interrupt::Pen, !conversion.channel.drives_touchscreen());
        }

        // Reference power-down isn't emulated, the converter behaves as if it was always on
        let value = convert(&conversion, ctx.input, ctx.misc.data_port);

        // Left align on the 16 bit register, the MSB goes out on the next clock
        self.output = value << 4;

        if conversion.resolution == Resolution::Bits8 {
            self.output &= 0xff00;
            self.bits_to_next_control -= SHORT_CONVERSION_CLOCKS;
        }

        self.pen_irq_enabled = conversion.power_down.pen_irq_enabled();
        self.refresh_pen_irq(ctx.input, ctx.irq);
    }
}

impl Default for Ads7846 {
    fn default() -> Ads7846 {
        Ads7846::new()
    }
}

impl SerialDevice for Ads7846 {
    fn description(&self) -> String {
        "ADS7846 touchscreen controller".to_string()
    }

    fn reset(&mut self, ctx: &mut DeviceContext) {
        self.reset_protocol(ctx);
        self.chip_select = true;
    }

    fn set_chip_select(&mut self, line_high: bool, ctx: &mut DeviceContext) {
        // The chip resets when it's deselected
        if line_high && !self.chip_select {
            self.reset_protocol(ctx);
        }

        self.chip_select = line_high;
    }

    fn exchange_bit(&mut self, bit_in: bool, ctx: &mut DeviceContext) -> bool {
        // Data out is high while the chip is off the bus
        if self.chip_select {
            return true;
        }

        if self.bits_to_next_control > 0 {
            self.bits_to_next_control -= 1;
        }

        match ClockPhase::at(self.bits_to_next_control) {
            ClockPhase::AwaitingStart => {
                if bit_in {
                    self.control = ControlByte::START;
                    self.bits_to_next_control = FRAME_CLOCKS;
                }
            }
            ClockPhase::Command => self.control.shift_in(bit_in),
            ClockPhase::ConversionReady => self.finish_conversion(ctx),
            ClockPhase::Output => (),
        }

        self.output.shift_out()
    }
}

impl SaveState for Ads7846 {
    fn state_size(&self) -> usize {
        STATE_SIZE
    }

    fn save_state(&self, data: &mut [u8]) {
        let mut w = StateWriter::new(data);

        w.write_bool(self.pen_irq_enabled);
        w.write_u8(self.bits_to_next_control);
        w.write_u8(self.control.raw());
        w.write_u16(self.output);
        w.write_bool(self.chip_select);
    }

    fn load_state(&mut self, data: &[u8]) {
        let mut r = StateReader::new(data);

        self.pen_irq_enabled = r.read_bool();
        self.bits_to_next_control = r.read_u8();
        self.control = ControlByte::new(r.read_u8());
        self.output = r.read_u16();
        self.chip_select = r.read_bool();
    }
}
