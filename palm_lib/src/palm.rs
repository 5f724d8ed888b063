pub mod ads7846;
pub mod input;
pub mod irq;
pub mod serial;

use ads7846::{Ads7846, Ads7846Config};
use input::{DataPort, MiscHw, PalmInput};
use irq::InterruptState;
use serial::{DeviceContext, SerialDevice, SerialPort};

use crate::error::{PalmError, PalmResult};
use crate::state::{SaveState, StateReader, StateWriter};

/// Savestate header magic
const STATE_MAGIC: [u8; 4] = *b"PALM";
/// Bumped every time the layout of one of the peripheral blocks changes
const STATE_VERSION: u32 = 0;
/// Magic followed by the little endian version
const STATE_HEADER_SIZE: usize = 8;
/// Data port identity
const MISC_STATE_SIZE: usize = 1;

/// The emulated handheld: inputs set by the frontend plus the peripherals sitting on the SPI bus
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
pub struct Palm {
    /// Owned by the frontend, not part of the emulated state
    #[serde(skip)]
    input: PalmInput,
    misc: MiscHw,
    irq: InterruptState,
    /// Touchscreen controller, on the SPI bus behind its own chip select
    touchscreen: SerialPort<Ads7846>,
}

impl Palm {
    pub fn new() -> Palm {
        Palm::with_config(Ads7846Config::default())
    }

    pub fn with_config(config: Ads7846Config) -> Palm {
        let mut palm = Palm {
            input: PalmInput::default(),
            misc: MiscHw::default(),
            irq: InterruptState::new(),
            touchscreen: SerialPort::new(Ads7846::with_config(config)),
        };

        palm.hard_reset();

        palm
    }

    /// Split the borrows between the SPI port and what its devices get to see
    fn bus(&mut self) -> (&mut SerialPort<Ads7846>, DeviceContext<'_>) {
        let ctx = DeviceContext {
            input: &self.input,
            misc: &self.misc,
            irq: &mut self.irq,
        };

        (&mut self.touchscreen, ctx)
    }

    /// Power cycle every peripheral. The frontend input is left untouched.
    pub fn hard_reset(&mut self) {
        let (port, mut ctx) = self.bus();

        info!("Hard reset: {}", port.device().description());

        port.reset(&mut ctx);
    }

    pub fn input(&self) -> &PalmInput {
        &self.input
    }

    /// Replace the whole input state and refresh the level-triggered interrupts that depend on it
    pub fn set_input(&mut self, input: PalmInput) {
        self.input = input;
        self.refresh_inputs();
    }

    pub fn touch_at(&mut self, x: f32, y: f32) {
        self.input.touch_at(x, y);
        self.refresh_inputs();
    }

    pub fn release_touch(&mut self) {
        self.input.release();
        self.refresh_inputs();
    }

    fn refresh_inputs(&mut self) {
        self.touchscreen
            .device()
            .refresh_pen_irq(&self.input, &mut self.irq);
    }

    pub fn data_port(&self) -> DataPort {
        self.misc.data_port
    }

    pub fn set_data_port(&mut self, port: DataPort) {
        if port != self.misc.data_port {
            debug!("Data port: {:?} -> {:?}", self.misc.data_port, port);
        }

        self.misc.data_port = port;
    }

    pub fn irq(&self) -> &InterruptState {
        &self.irq
    }

    pub fn irq_mut(&mut self) -> &mut InterruptState {
        &mut self.irq
    }

    pub fn touchscreen(&self) -> &Ads7846 {
        self.touchscreen.device()
    }

    pub fn set_touchscreen_config(&mut self, config: Ads7846Config) {
        self.touchscreen.device_mut().set_config(config);
    }

    /// Drive the touchscreen controller's chip select line
    pub fn spi_set_chip_select(&mut self, line_high: bool) {
        let (port, mut ctx) = self.bus();

        port.set_chip_select(line_high, &mut ctx);
    }

    pub fn spi_exchange_bit(&mut self, bit_in: bool) -> bool {
        let (port, mut ctx) = self.bus();

        port.exchange_bit(bit_in, &mut ctx)
    }

    /// Clock a `bits` wide word through the bus, MSB first, the way the SPI master does. `bits`
    /// is clamped to 16.
    pub fn spi_exchange(&mut self, data: u16, bits: u8) -> u16 {
        let (port, mut ctx) = self.bus();

        port.exchange_word(data, bits, &mut ctx)
    }

    /// Size of the fixed layout savestate, constant for a given build
    pub fn state_size(&self) -> usize {
        STATE_HEADER_SIZE
            + MISC_STATE_SIZE
            + self.irq.state_size()
            + self.touchscreen.device().state_size()
    }

    pub fn save_state(&self, data: &mut [u8]) -> PalmResult<()> {
        let expected = self.state_size();

        if data.len() < expected {
            error!(
                "Can't save state: buffer too small ({} < {})",
                data.len(),
                expected
            );
            return Err(PalmError::StateBufferTooSmall {
                expected,
                got: data.len(),
            });
        }

        let mut w = StateWriter::new(data);

        w.write_bytes(&STATE_MAGIC);
        w.write_bytes(&STATE_VERSION.to_le_bytes());
        w.write_u8(self.misc.data_port as u8);

        let irq_len = self.irq.state_size();
        self.irq.save_state(w.remaining());
        w.advance(irq_len);

        let chip = self.touchscreen.device();
        let chip_len = chip.state_size();
        chip.save_state(w.remaining());
        w.advance(chip_len);

        debug_assert_eq!(w.offset(), expected);

        Ok(())
    }

    /// Load a savestate produced by `save_state`. Nothing is modified if the buffer is rejected.
    pub fn load_state(&mut self, data: &[u8]) -> PalmResult<()> {
        let expected = self.state_size();

        if data.len() < expected {
            error!(
                "Can't load state: buffer too small ({} < {})",
                data.len(),
                expected
            );
            return Err(PalmError::StateBufferTooSmall {
                expected,
                got: data.len(),
            });
        }

        if *array_ref![data, 0, 4] != STATE_MAGIC {
            error!("Can't load state: bad magic");
            return Err(PalmError::BadStateMagic);
        }

        let version = u32::from_le_bytes(*array_ref![data, 4, 4]);

        if version != STATE_VERSION {
            error!("Can't load state: unsupported version {}", version);
            return Err(PalmError::UnsupportedStateVersion(version));
        }

        let mut r = StateReader::new(data);
        r.advance(STATE_HEADER_SIZE);

        let data_port = match DataPort::from_raw(r.read_u8()) {
            Ok(p) => p,
            Err(e) => {
                error!("Can't load state: {}", e);
                return Err(e);
            }
        };

        // Everything has been validated, from now on we can't fail
        self.misc.data_port = data_port;

        let irq_len = self.irq.state_size();
        self.irq.load_state(r.remaining());
        r.advance(irq_len);

        let chip = self.touchscreen.device_mut();
        let chip_len = chip.state_size();
        chip.load_state(r.remaining());
        r.advance(chip_len);

        if data.len() > expected {
            warn!(
                "Savestate has {} trailing bytes, ignored",
                data.len() - expected
            );
        }

        Ok(())
    }

    /// Serialize the whole machine into a self-describing flexbuffer. Unlike `save_state` the
    /// layout isn't fixed, it's meant for debugging and tooling.
    pub fn serialize_snapshot(&self) -> PalmResult<Vec<u8>> {
        use serde::Serialize;

        let mut fb = flexbuffers::FlexbufferSerializer::new();

        if let Err(e) = self.serialize(&mut fb) {
            error!("Couldn't serialize snapshot: {}", e);
            return Err(PalmError::Snapshot(e.to_string()));
        }

        Ok(fb.view().to_vec())
    }

    /// Restore a snapshot produced by `serialize_snapshot`. The current input and touchscreen
    /// configuration are kept.
    pub fn deserialize_snapshot(&mut self, data: &[u8]) -> PalmResult<()> {
        use serde::Deserialize;

        let fbr = match flexbuffers::Reader::get_root(data) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to load snapshot: {}", e);
                return Err(PalmError::Snapshot(e.to_string()));
            }
        };

        let mut palm = match Palm::deserialize(fbr) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to load snapshot: {}", e);
                return Err(PalmError::Snapshot(e.to_string()));
            }
        };

        palm.input = self.input;
        palm.set_touchscreen_config(self.touchscreen.device().config());

        *self = palm;

        Ok(())
    }
}

impl Default for Palm {
    fn default() -> Palm {
        Palm::new()
    }
}
