//! Analog front end: what the converter reads on each channel
//!
//! The values below were measured on real hardware. Several of them make no physical sense
//! (temperature channels in differential mode, the dormant X/Y plates) but that's what the chip
//! returns and what the OS expects to see.

use super::control::{Channel, Conversion, PowerDown, Reference};
use crate::palm::input::{DataPort, PalmInput};

/// Returned by every non-pointer channel in single-ended mode while the panel is pressed, the
/// touchscreen plates cross lines with REF+.
const CROSSED_REFERENCE: u16 = 0xf80;

/// Data port identification resistor, indexed by `DataPort`. Only the USB cradle has been
/// measured, the other accessories are unknown.
const DATA_PORT_RESISTOR: [u16; 5] = [
    0xfff, // None
    0x1eb, // USB cradle
    0x000, // Serial cradle
    0x000, // USB peripheral
    0x000, // Serial peripheral
];

/// Touchscreen plate axis. Both coordinates are inverted before being converted: 0.0 on the
/// panel reads as the top of the range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Axis {
    X,
    Y,
}

/// Linear mapping of a normalized axis position onto the range the converter reports
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Span {
    axis: Axis,
    min: u16,
    max: u16,
}

impl Span {
    const fn new(axis: Axis, min: u16, max: u16) -> Span {
        Span { axis, min, max }
    }

    fn sample(self, input: &PalmInput) -> f32 {
        let pos = match self.axis {
            Axis::X => input.touchscreen_x,
            Axis::Y => input.touchscreen_y,
        };

        range_map(0.0, 1.0, 1.0 - pos, self.min as f32, self.max as f32)
    }
}

/// Touchscreen Y
const Y_SPAN: Span = Span::new(Axis::Y, 0x0ee, 0xee4);
/// Touchscreen X
const X_SPAN: Span = Span::new(Axis::X, 0x0fd, 0xf47);
/// X plate relative to Y: mostly X with some Y bleeding in
const Z1_SPANS: [Span; 2] = [
    Span::new(Axis::X, 0x093, 0x600),
    Span::new(Axis::Y, 0x000, 0x280),
];
/// Y plate relative to X: mostly Y with some X bleeding in
const Z2_SPANS: [Span; 2] = [
    Span::new(Axis::Y, 0x9af, 0xf3f),
    Span::new(Axis::X, 0x000, 0x150),
];

/// What the converter outputs for a given table entry
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Response {
    /// Fixed code
    Code(u16),
    /// Linear function of the pointer position, possibly summed over several plates
    Position(&'static [Span]),
    /// Data port identification resistor
    DataPort,
}

/// Lookup key for the channel table
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Key {
    reference: Reference,
    channel: Channel,
    touched: bool,
}

impl Key {
    fn response(self) -> Response {
        use Channel::*;
        use Reference::*;
        use Response::{Code, DataPort, Position};

        match (self.reference, self.channel, self.touched) {
            // Wrong mode for the temperature diode
            (Differential, Temp0, _) => Code(0xfff),
            // Y is almost fully on when dormant
            (Differential, Y, false) => Code(0xfef),
            // Wrong mode for the battery
            (Differential, Battery, _) => Code(0xfff),
            (Differential, Z1, false) => Code(0x000),
            (Differential, Z2, false) => Code(0xfff),
            (Differential, X, false) => Code(0x309),
            // Wrong mode for the auxiliary input
            (Differential, Aux, _) => Code(0xfff),
            // Usually 0xdff, sometimes 0xbff or 0xfff
            (Differential, Temp1, _) => Code(0xdff),

            // Room temperature
            (SingleEnded, Temp0, false) => Code(0x3e2),
            (SingleEnded, Y, false) => Code(0xfff),
            // Full charge. The discharge curve hasn't been measured yet.
            (SingleEnded, Battery, false) => Code(0x69c),
            (SingleEnded, Z1, false) => Code(0x000),
            (SingleEnded, Z2, false) => Code(0xfff),
            (SingleEnded, X, false) => Code(0x3fb),
            (SingleEnded, Aux, false) => DataPort,
            // Room temperature
            (SingleEnded, Temp1, false) => Code(0x4a1),
            (SingleEnded, Temp0 | Battery | Aux | Temp1, true) => Code(CROSSED_REFERENCE),

            // Pointer channels while touched, same in both modes
            (_, Y, true) => Position(&[Y_SPAN]),
            (_, Z1, true) => Position(&Z1_SPANS),
            (_, Z2, true) => Position(&Z2_SPANS),
            (_, X, true) => Position(&[X_SPAN]),
        }
    }
}

/// Run a conversion and return the 12 bit result, right aligned. Truncation for 8 bit mode is
/// done by the caller.
pub fn convert(conversion: &Conversion, input: &PalmInput, data_port: DataPort) -> u16 {
    let touched = input.touchscreen_touched;

    if conversion.power_down == PowerDown::AdcOff {
        // ADC disabled, the result is garbage. The X plate channels read low while dormant.
        return match conversion.channel {
            Channel::Z1 | Channel::X if !touched => 0x000,
            _ => 0xfff,
        };
    }

    let key = Key {
        reference: conversion.reference,
        channel: conversion.channel,
        touched,
    };

    match key.response() {
        Response::Code(code) => code,
        // Plates are summed before truncating to an integer
        Response::Position(spans) => spans.iter().map(|s| s.sample(input)).sum::<f32>() as u16,
        Response::DataPort => DATA_PORT_RESISTOR[data_port as usize],
    }
}

fn range_map(old_min: f32, old_max: f32, value: f32, new_min: f32, new_max: f32) -> f32 {
    (value - old_min) / (old_max - old_min) * (new_max - new_min) + new_min
}
