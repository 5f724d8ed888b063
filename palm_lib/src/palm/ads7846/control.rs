//! Control byte layout

use bitfield::bitfield;

use crate::bitwise::Bitwise;

bitfield! {
    /// Command shifted in after the start bit
    #[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlByte(u8);
    impl Debug;

    /// Start bit (bit 7)
    pub start, _: 7;

    /// Input multiplexer address (bits 6 - 4)
    pub u8, address, _: 6, 4;

    /// Set for an 8 bit conversion, cleared for 12 bits (bit 3)
    pub mode_8bit, _: 3;

    /// Set for single-ended reference, cleared for differential (bit 2)
    pub single_ended, _: 2;

    /// Power-down mode (bits 1 - 0)
    pub u8, power_down_bits, _: 1, 0;
}

impl ControlByte {
    /// Value latched when a start bit is clocked in. The following 7 bits are shifted in behind it.
    pub const START: ControlByte = ControlByte(0x01);

    pub fn new(raw: u8) -> ControlByte {
        ControlByte(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn shift_in(&mut self, bit: bool) {
        self.0.shift_in(bit);
    }

    /// Decode the byte. Every value is legal, the reserved combinations simply select whatever
    /// their bits say.
    pub fn decode(self) -> Conversion {
        Conversion {
            channel: Channel::from_address(self.address()),
            resolution: if self.mode_8bit() {
                Resolution::Bits8
            } else {
                Resolution::Bits12
            },
            reference: if self.single_ended() {
                Reference::SingleEnded
            } else {
                Reference::Differential
            },
            power_down: PowerDown::from_bits(self.power_down_bits()),
        }
    }
}

/// Parameters of a single conversion
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Conversion {
    pub channel: Channel,
    pub resolution: Resolution,
    pub reference: Reference,
    pub power_down: PowerDown,
}

/// Analog input selected by the multiplexer
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Channel {
    /// Temperature diode, first measurement point
    Temp0 = 0,
    /// Touchscreen Y position
    Y = 1,
    /// Battery voltage
    Battery = 2,
    /// Touchscreen X plate measured relative to Y, used for pressure
    Z1 = 3,
    /// Touchscreen Y plate measured relative to X, used for pressure
    Z2 = 4,
    /// Touchscreen X position
    X = 5,
    /// Auxiliary input, wired to the data port identification resistor
    Aux = 6,
    /// Temperature diode, second measurement point
    Temp1 = 7,
}

impl Channel {
    fn from_address(addr: u8) -> Channel {
        match addr & 7 {
            0 => Channel::Temp0,
            1 => Channel::Y,
            2 => Channel::Battery,
            3 => Channel::Z1,
            4 => Channel::Z2,
            5 => Channel::X,
            6 => Channel::Aux,
            _ => Channel::Temp1,
        }
    }

    /// The touchscreen drivers are switched on while measuring these, which masks the pen
    /// detection circuit.
    pub fn drives_touchscreen(self) -> bool {
        matches!(self, Channel::Y | Channel::Z1 | Channel::Z2 | Channel::X)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resolution {
    Bits12,
    Bits8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reference {
    Differential,
    SingleEnded,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerDown {
    /// Powered down between conversions, PENIRQ enabled
    BetweenConversions = 0,
    /// Reference off, ADC on, PENIRQ disabled
    ReferenceOff = 1,
    /// Reference on, ADC off, PENIRQ enabled
    AdcOff = 2,
    /// Always powered, PENIRQ disabled
    AlwaysOn = 3,
}

impl PowerDown {
    fn from_bits(bits: u8) -> PowerDown {
        match bits & 3 {
            0 => PowerDown::BetweenConversions,
            1 => PowerDown::ReferenceOff,
            2 => PowerDown::AdcOff,
            _ => PowerDown::AlwaysOn,
        }
    }

    /// PENIRQ is only enabled in the modes with the low bit cleared
    pub fn pen_irq_enabled(self) -> bool {
        !(self as u8).bit(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fields() {
        // S=1, A=101 (X), 12 bit, differential, PD=00
        let c = ControlByte::new(0xd0).decode();

        assert_eq!(c.channel, Channel::X);
        assert_eq!(c.resolution, Resolution::Bits12);
        assert_eq!(c.reference, Reference::Differential);
        assert_eq!(c.power_down, PowerDown::BetweenConversions);

        // S=1, A=010 (battery), 8 bit, single-ended, PD=11
        let c = ControlByte::new(0xaf).decode();

        assert_eq!(c.channel, Channel::Battery);
        assert_eq!(c.resolution, Resolution::Bits8);
        assert_eq!(c.reference, Reference::SingleEnded);
        assert_eq!(c.power_down, PowerDown::AlwaysOn);
    }

    #[test]
    fn every_byte_decodes() {
        for raw in 0..=255u8 {
            let cb = ControlByte::new(raw);
            let c = cb.decode();

            assert_eq!(c.channel as u8, (raw >> 4) & 7);
            assert_eq!(c.power_down as u8, raw & 3);
            assert_eq!(cb.start(), raw & 0x80 != 0);
        }
    }

    #[test]
    fn shift_in_after_start_bit() {
        let mut cb = ControlByte::START;

        for bit in [false, false, true, false, false, true, false] {
            cb.shift_in(bit);
        }

        assert_eq!(cb.raw(), 0x92);
        assert!(cb.start());
        assert_eq!(cb.decode().channel, Channel::Y);
    }

    #[test]
    fn pen_irq_follows_low_power_down_bit() {
        assert!(PowerDown::BetweenConversions.pen_irq_enabled());
        assert!(!PowerDown::ReferenceOff.pen_irq_enabled());
        assert!(PowerDown::AdcOff.pen_irq_enabled());
        assert!(!PowerDown::AlwaysOn.pen_irq_enabled());
    }
}
