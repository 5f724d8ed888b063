use thiserror::Error;

pub type PalmResult<T> = ::std::result::Result<T, PalmError>;

#[derive(Error, Debug)]
pub enum PalmError {
    #[error("Savestate buffer too small: expected {expected} bytes, got {got}")]
    StateBufferTooSmall { expected: usize, got: usize },
    #[error("Bad savestate magic")]
    BadStateMagic,
    #[error("Unsupported savestate version {0}")]
    UnsupportedStateVersion(u32),
    #[error("Snapshot (de)serialization failed: {0}")]
    Snapshot(String),
    #[error("Unknown data port identifier: {0}")]
    UnknownDataPort(u8),
}
