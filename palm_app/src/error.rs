use std::path::PathBuf;

use palm_lib::PalmError;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Can't access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to load config: {0}")]
    Ini(#[from] ini::Error),
    #[error("Invalid value for {section}.{key}: {value:?}")]
    Config {
        section: &'static str,
        key: &'static str,
        value: String,
    },
    #[error("Trace line {line}: {message}")]
    Trace { line: usize, message: String },
    #[error(transparent)]
    Palm(#[from] PalmError),
}
