use super::*;
use crate::palm::input::{DataPort, MiscHw, PalmInput};

const PEN: u32 = 1 << Interrupt::Pen as u32;

/// Chip wired to its own set of inputs and interrupt controller
struct Rig {
    chip: Ads7846,
    input: PalmInput,
    misc: MiscHw,
    irq: InterruptState,
}

impl Rig {
    fn new() -> Rig {
        Rig::with_config(Ads7846Config::default())
    }

    fn with_config(config: Ads7846Config) -> Rig {
        Rig {
            chip: Ads7846::with_config(config),
            input: PalmInput::default(),
            misc: MiscHw::default(),
            irq: InterruptState::new(),
        }
    }

    fn set_cs(&mut self, line_high: bool) {
        let mut ctx = DeviceContext {
            input: &self.input,
            misc: &self.misc,
            irq: &mut self.irq,
        };

        self.chip.set_chip_select(line_high, &mut ctx);
    }

    fn clock(&mut self, bit: bool) -> bool {
        let mut ctx = DeviceContext {
            input: &self.input,
            misc: &self.misc,
            irq: &mut self.irq,
        };

        self.chip.exchange_bit(bit, &mut ctx)
    }

    fn reset(&mut self) {
        let mut ctx = DeviceContext {
            input: &self.input,
            misc: &self.misc,
            irq: &mut self.irq,
        };

        self.chip.reset(&mut ctx);
    }

    /// Clock `bits` bits of `data` MSB first
    fn exchange(&mut self, data: u32, bits: u8) -> u32 {
        let mut response = 0;

        for pos in (0..bits).rev() {
            let b = self.clock((data >> pos) & 1 != 0);
            response |= (b as u32) << pos;
        }

        response
    }

    /// 24 clock transaction: command byte then 16 clocks of readback. Returns the 12 bit result.
    fn convert(&mut self, control: u8) -> u16 {
        let response = self.exchange((control as u32) << 16, 24);

        ((response >> 3) & 0xfff) as u16
    }

    /// Clock a command up to and including the conversion ready edge. Returns the output
    /// register and countdown right after that edge.
    fn latch(&mut self, control: u8) -> (u16, u8) {
        self.exchange(control as u32, 8);
        // Busy clock
        self.clock(false);
        self.clock(false);

        (self.chip.output, self.chip.bits_to_next_control)
    }
}

#[test]
fn idle_line_reads_high() {
    let mut rig = Rig::new();
    rig.input.touch_at(0.5, 0.5);

    let before = rig.chip.clone();

    for &bit in &[true, false, true, true, false, false, true, false] {
        assert!(rig.clock(bit));
    }

    assert_eq!(rig.chip, before);
    assert_eq!(rig.irq, InterruptState::new());
}

#[test]
fn idle_line_after_deselect_mid_frame() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xd4, 8);
    rig.set_cs(true);

    let before = rig.chip.clone();

    for _ in 0..20 {
        assert!(rig.clock(true));
        assert!(rig.clock(false));
    }

    assert_eq!(rig.chip, before);
}

#[test]
fn deselect_resets_protocol() {
    let mut rig = Rig::with_config(Ads7846Config {
        fake_pen_irq: false,
    });
    rig.input.touch_at(0.25, 0.75);

    rig.set_cs(false);
    // X, 12 bit, single-ended, PENIRQ disabled, then past the conversion ready edge
    rig.exchange(0xd5, 8);
    rig.exchange(0, 4);

    assert_ne!(rig.chip.bits_to_next_control, 0);
    assert_ne!(rig.chip.output, 0);
    assert!(!rig.chip.pen_irq_enabled);
    assert!(!rig.irq.is_high(Interrupt::Pen));

    rig.set_cs(true);

    assert_eq!(rig.chip.bits_to_next_control, 0);
    assert_eq!(rig.chip.control.raw(), 0);
    assert_eq!(rig.chip.output, 0);
    assert!(rig.chip.pen_irq_enabled);
    assert!(rig.chip.chip_select);
    // PENIRQ refreshed with the panel still pressed
    assert!(rig.irq.is_high(Interrupt::Pen));

    rig.set_cs(false);

    assert_eq!(rig.chip.bits_to_next_control, 0);
    assert_eq!(rig.chip.control.raw(), 0);
    assert_eq!(rig.chip.output, 0);
    assert!(rig.chip.pen_irq_enabled);
    assert!(!rig.chip.chip_select);
}

#[test]
fn rewriting_select_level_is_a_no_op() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xd4, 11);

    let before = rig.chip.clone();
    rig.set_cs(false);
    assert_eq!(rig.chip, before);

    rig.set_cs(true);
    let before = rig.chip.clone();
    rig.set_cs(true);
    assert_eq!(rig.chip, before);
}

#[test]
fn hard_reset_deselects() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xd4, 12);
    rig.reset();

    assert_eq!(rig.chip, Ads7846::new());
}

#[test]
fn start_bit_rearms_mid_output() {
    let mut rig = Rig::new();
    rig.input.touch_at(0.5, 0.5);

    rig.set_cs(false);
    rig.exchange(0xd4, 8);
    // Busy clock, then the first 6 bits of the result
    rig.exchange(0, 7);

    assert_eq!(rig.chip.bits_to_next_control, 1);

    let pending = rig.chip.output;
    assert_ne!(pending, 0);

    // 16th clock since the previous start bit
    let out = rig.clock(true);

    assert_eq!(rig.chip.bits_to_next_control, 15);
    assert_eq!(rig.chip.control.raw(), 0x01);
    // The previous result keeps shifting out
    assert_eq!(out, pending & 0x8000 != 0);
    assert_eq!(rig.chip.output, pending << 1);
}

#[test]
fn start_bit_during_output_is_ignored() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xd4, 8);
    rig.exchange(0, 3);

    let countdown = rig.chip.bits_to_next_control;
    rig.clock(true);

    assert_eq!(rig.chip.bits_to_next_control, countdown - 1);
    assert_eq!(rig.chip.control.raw(), 0xd4);
}

#[test]
fn zero_bits_while_idle_dont_start_a_frame() {
    let mut rig = Rig::new();

    rig.set_cs(false);

    for _ in 0..32 {
        assert!(!rig.clock(false));
        assert_eq!(rig.chip.bits_to_next_control, 0);
    }
}

#[test]
fn result_is_latched_on_conversion_ready_clock() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xd4, 8);

    assert_eq!(rig.chip.bits_to_next_control, 8);
    assert_eq!(rig.chip.control.raw(), 0xd4);

    // Busy clock
    rig.clock(false);
    assert_eq!(rig.chip.bits_to_next_control, 7);
    assert_eq!(rig.chip.output, 0);

    let msb = rig.clock(false);
    assert_eq!(rig.chip.bits_to_next_control, CONVERSION_READY);
    // Dormant X in single-ended mode, already shifted once
    assert_eq!(rig.chip.output, 0x3fb0 << 1);
    assert!(!msb);
}

#[test]
fn single_ended_x_transaction() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.input.touch_at(0.5, 0.5);
    assert_eq!(rig.convert(0xd4), 0x822);

    rig.input.release();
    assert_eq!(rig.convert(0xd4), 0x3fb);
}

#[test]
fn differential_temperature_reads_full_scale() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    assert_eq!(rig.convert(0x80), 0xfff);

    rig.input.touch_at(0.1, 0.9);
    assert_eq!(rig.convert(0x80), 0xfff);
}

#[test]
fn adc_off_fixtures() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    // Z1, single-ended, PD=10
    assert_eq!(rig.convert(0xb6), 0x000);
    // Temp0, single-ended, PD=10
    assert_eq!(rig.convert(0x86), 0xfff);
    assert!(rig.chip.pen_irq_enabled);
}

#[test]
fn data_port_is_read_from_misc_hw() {
    let mut rig = Rig::new();
    rig.misc.data_port = DataPort::UsbCradle;

    rig.set_cs(false);
    // Aux, single-ended
    assert_eq!(rig.convert(0xe4), 0x1eb);

    rig.misc.data_port = DataPort::None;
    assert_eq!(rig.convert(0xe4), 0xfff);
}

#[test]
fn eight_bit_transaction() {
    let mut rig = Rig::new();
    rig.input.touch_at(0.5, 0.5);

    rig.set_cs(false);

    let response = rig.exchange(0xdc << 16, 24);
    assert_eq!((response >> 7) & 0xff, 0x82);
    assert_eq!(response & 0x7f, 0);
}

#[test]
fn eight_bit_frame_can_restart_early() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    rig.exchange(0xdc, 8);
    // Busy clock, conversion ready, then one output clock
    rig.exchange(0, 3);

    assert_eq!(rig.chip.bits_to_next_control, 1);

    rig.clock(true);
    assert_eq!(rig.chip.bits_to_next_control, FRAME_CLOCKS);
}

#[test]
fn eight_bit_mode_truncates_every_conversion() {
    for raw in 0x80..=0xffu8 {
        if raw & 0x08 != 0 {
            continue;
        }

        for touched in [false, true] {
            let latch = |control| {
                let mut rig = Rig::new();
                rig.misc.data_port = DataPort::UsbCradle;
                if touched {
                    rig.input.touch_at(0.3, 0.8);
                }

                rig.set_cs(false);
                rig.latch(control)
            };

            let (full, full_countdown) = latch(raw);
            let (short, short_countdown) = latch(raw | 0x08);

            assert_eq!(short, full & 0xfe00, "control {:02x}", raw);
            assert_eq!(short & 0x01ff, 0);
            assert_eq!(full_countdown, CONVERSION_READY);
            assert_eq!(short_countdown + SHORT_CONVERSION_CLOCKS, full_countdown);
        }
    }
}

#[test]
fn power_down_mode_controls_pen_irq() {
    let mut rig = Rig::with_config(Ads7846Config {
        fake_pen_irq: false,
    });
    rig.input.touch_at(0.5, 0.5);

    rig.set_cs(false);

    // X, PD=01: PENIRQ disabled
    rig.convert(0xd5);
    assert!(!rig.chip.pen_irq_enabled);
    assert!(!rig.chip.pen_irq_line(&rig.input));
    assert!(!rig.irq.is_high(Interrupt::Pen));

    // X, PD=00: PENIRQ enabled
    rig.convert(0xd4);
    assert!(rig.chip.pen_irq_enabled);
    assert!(rig.chip.pen_irq_line(&rig.input));
    assert!(rig.irq.is_high(Interrupt::Pen));

    rig.input.release();
    assert!(!rig.chip.pen_irq_line(&rig.input));
}

#[test]
fn fake_pen_irq_pulses_on_non_touch_channels() {
    let mut rig = Rig::new();

    rig.set_cs(false);
    // Temp0, single-ended
    rig.convert(0x84);

    // The pulse was latched even though the line went back low
    assert_eq!(rig.irq.status() & PEN, PEN);
    assert!(!rig.irq.is_high(Interrupt::Pen));

    rig.irq.ack(PEN);

    // X drives the plates, no pulse
    rig.convert(0xd4);
    assert_eq!(rig.irq.status() & PEN, 0);
}

#[test]
fn fake_pen_irq_can_be_disabled() {
    let mut rig = Rig::with_config(Ads7846Config {
        fake_pen_irq: false,
    });

    rig.set_cs(false);
    rig.convert(0x84);

    assert_eq!(rig.irq.status(), 0);
}

#[test]
fn save_layout() {
    let mut chip = Ads7846::new();

    chip.pen_irq_enabled = false;
    chip.bits_to_next_control = 9;
    chip.control = ControlByte::new(0x4b);
    chip.output = 0xbeef;
    chip.chip_select = false;

    let mut buf = [0xaa; STATE_SIZE];
    chip.save_state(&mut buf);

    assert_eq!(buf, [0x00, 0x09, 0x4b, 0xbe, 0xef, 0x00]);
}

#[test]
fn load_overwrites_every_field() {
    let mut chip = Ads7846::new();

    chip.load_state(&[0xff; STATE_SIZE]);

    assert!(chip.pen_irq_enabled);
    assert_eq!(chip.bits_to_next_control, 0xff);
    assert_eq!(chip.control.raw(), 0xff);
    assert_eq!(chip.output, 0xffff);
    assert!(chip.chip_select);

    chip.load_state(&[0x00; STATE_SIZE]);

    assert_eq!(chip, {
        let mut zero = Ads7846::new();
        zero.pen_irq_enabled = false;
        zero.chip_select = false;
        zero
    });
}

#[test]
fn save_load_round_trip_mid_transaction() {
    let mut rig = Rig::new();
    rig.input.touch_at(0.3, 0.6);

    rig.set_cs(false);
    rig.exchange(0x93, 8);

    for extra in 0..16 {
        assert_eq!(rig.chip.state_size(), STATE_SIZE);

        let mut buf = vec![0; rig.chip.state_size()];
        rig.chip.save_state(&mut buf);

        let mut other = Rig::new();
        other.input = rig.input;
        other.chip.load_state(&buf);

        assert_eq!(other.chip, rig.chip);

        // Both copies keep producing the same bits
        let mut a = Rig::new();
        a.input = rig.input;
        a.chip = rig.chip.clone();
        assert_eq!(a.exchange(0xd0 << 16, 24), other.exchange(0xd0 << 16, 24));
        assert_eq!(a.chip, other.chip);

        rig.exchange(extra & 1, 1);
    }
}
