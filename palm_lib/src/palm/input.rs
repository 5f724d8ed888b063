//! Analog inputs and miscellaneous hardware state owned by the frontend
//!
//! Peripherals only ever read these. The frontend updates them between frames through the
//! `Palm` methods so that level-triggered interrupts get refreshed.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::{PalmError, PalmResult};

/// State of the pointing device
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct PalmInput {
    /// 0.0 = left, 1.0 = right
    pub touchscreen_x: f32,
    /// 0.0 = top, 1.0 = bottom
    pub touchscreen_y: f32,
    pub touchscreen_touched: bool,
}

impl PalmInput {
    /// Press the stylus at the given position. Coordinates are clamped to the panel.
    pub fn touch_at(&mut self, x: f32, y: f32) {
        self.touchscreen_x = x.clamp(0.0, 1.0);
        self.touchscreen_y = y.clamp(0.0, 1.0);
        self.touchscreen_touched = true;
    }

    /// Lift the stylus. The last position is kept, like on the real panel it's meaningless until
    /// the next touch.
    pub fn release(&mut self) {
        self.touchscreen_touched = false;
    }
}

/// What's plugged into the data port at the bottom of the device. The docking station identifies
/// itself through a resistor divider read by the touchscreen controller's auxiliary input.
#[derive(
    serde::Serialize, serde::Deserialize, FromPrimitive, Clone, Copy, PartialEq, Eq, Debug, Default,
)]
#[repr(u8)]
pub enum DataPort {
    #[default]
    None = 0,
    UsbCradle = 1,
    SerialCradle = 2,
    UsbPeripheral = 3,
    SerialPeripheral = 4,
}

impl DataPort {
    pub fn from_raw(raw: u8) -> PalmResult<DataPort> {
        DataPort::from_u8(raw).ok_or(PalmError::UnknownDataPort(raw))
    }
}

/// Miscellaneous board state that isn't owned by any emulated chip
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MiscHw {
    pub data_port: DataPort,
}
