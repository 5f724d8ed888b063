//! Palm handheld peripheral emulation core

// Most of our casts are constrained by the width of the emulated hardware registers
#![allow(clippy::cast_lossless)]
// The ADS7846 channel table reads better as one match than as a chain of helpers
#![allow(clippy::match_same_arms)]

#[macro_use]
extern crate arrayref;
#[macro_use]
extern crate log;
extern crate flexbuffers;
extern crate serde;
extern crate thiserror;

mod bitwise;
pub mod error;
pub mod palm;
pub mod state;

pub use error::{PalmError, PalmResult};
pub use palm::Palm;
pub use palm::ads7846::{Ads7846, Ads7846Config};
pub use palm::input::{DataPort, MiscHw, PalmInput};
pub use palm::irq::{Interrupt, InterruptState};
pub use palm::serial::{DeviceContext, DisconnectedDevice, SerialDevice, SerialPort};
pub use state::SaveState;
