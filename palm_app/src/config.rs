//! Initial machine setup, loaded from an INI file:
//!
//! ```ini
//! [Input]
//! touched = true
//! x = 0.5
//! y = 0.25
//!
//! [Misc]
//! data_port = UsbCradle
//!
//! [Ads7846]
//! fake_pen_irq = false
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use ini::{Ini, Properties};
use palm_lib::{Ads7846Config, DataPort, Palm, PalmInput};
use tracing::{info, warn};

use crate::error::{AppError, Result};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Config {
    pub input: PalmInput,
    pub data_port: DataPort,
    pub ads7846: Ads7846Config,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let ini = Ini::load_from_file(path)?;

        info!("Loading config from {}", path.display());

        Config::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Config> {
        let mut config = Config::default();

        if let Some(input) = ini.section(Some("Input")) {
            let x = parse_f32(input, "Input", "x")?.unwrap_or(0.0);
            let y = parse_f32(input, "Input", "y")?.unwrap_or(0.0);

            config.input.touch_at(x, y);

            if !parse_bool(input, "Input", "touched")?.unwrap_or(false) {
                config.input.release();
            }
        }

        if let Some(misc) = ini.section(Some("Misc")) {
            if let Some(port) = misc.get("data_port") {
                config.data_port =
                    parse_data_port(port).ok_or_else(|| invalid("Misc", "data_port", port))?;
            }
        }

        if let Some(adc) = ini.section(Some("Ads7846")) {
            if let Some(fake) = parse_bool(adc, "Ads7846", "fake_pen_irq")? {
                config.ads7846.fake_pen_irq = fake;
            }
        }

        for (section, _) in ini.iter() {
            match section {
                None | Some("Input") | Some("Misc") | Some("Ads7846") => (),
                Some(s) => warn!("Ignoring unknown config section [{}]", s),
            }
        }

        Ok(config)
    }

    /// Power on a machine with this configuration
    pub fn machine(&self) -> Palm {
        let mut palm = Palm::with_config(self.ads7846);

        palm.set_data_port(self.data_port);
        palm.set_input(self.input);

        palm
    }
}

/// Parse a data port by name or by its raw identifier
pub fn parse_data_port(s: &str) -> Option<DataPort> {
    let port = match s.to_ascii_lowercase().as_str() {
        "none" => DataPort::None,
        "usbcradle" => DataPort::UsbCradle,
        "serialcradle" => DataPort::SerialCradle,
        "usbperipheral" => DataPort::UsbPeripheral,
        "serialperipheral" => DataPort::SerialPeripheral,
        raw => return raw.parse::<u8>().ok().and_then(|r| DataPort::from_raw(r).ok()),
    };

    Some(port)
}

fn invalid(section: &'static str, key: &'static str, value: &str) -> AppError {
    AppError::Config {
        section,
        key,
        value: value.to_string(),
    }
}

fn parse_bool(
    props: &Properties,
    section: &'static str,
    key: &'static str,
) -> Result<Option<bool>> {
    let Some(value) = props.get(key) else {
        return Ok(None);
    };

    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(invalid(section, key, value)),
    }
}

fn parse_f32(
    props: &Properties,
    section: &'static str,
    key: &'static str,
) -> Result<Option<f32>> {
    let Some(value) = props.get(key) else {
        return Ok(None);
    };

    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(invalid(section, key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config> {
        Config::from_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse("").unwrap();

        assert_eq!(config, Config::default());
        assert!(config.ads7846.fake_pen_irq);
    }

    #[test]
    fn full_config() {
        let config = parse(
            "[Input]\ntouched = yes\nx = 0.25\ny = 2.0\n\
             [Misc]\ndata_port = UsbCradle\n\
             [Ads7846]\nfake_pen_irq = 0\n",
        )
        .unwrap();

        assert!(config.input.touchscreen_touched);
        assert_eq!(config.input.touchscreen_x, 0.25);
        // Clamped to the panel
        assert_eq!(config.input.touchscreen_y, 1.0);
        assert_eq!(config.data_port, DataPort::UsbCradle);
        assert!(!config.ads7846.fake_pen_irq);
    }

    #[test]
    fn untouched_position_is_kept() {
        let config = parse("[Input]\nx = 0.75\n").unwrap();

        assert!(!config.input.touchscreen_touched);
        assert_eq!(config.input.touchscreen_x, 0.75);
    }

    #[test]
    fn data_port_by_number() {
        assert_eq!(parse_data_port("3"), Some(DataPort::UsbPeripheral));
        assert_eq!(parse_data_port("serialCradle"), Some(DataPort::SerialCradle));
        assert_eq!(parse_data_port("9"), None);
        assert_eq!(parse_data_port("floppy"), None);
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse("[Input]\ntouched = maybe\n"),
            Err(AppError::Config { key: "touched", .. })
        ));
        assert!(matches!(
            parse("[Input]\nx = nan\n"),
            Err(AppError::Config { key: "x", .. })
        ));
        assert!(matches!(
            parse("[Misc]\ndata_port = 12\n"),
            Err(AppError::Config { section: "Misc", .. })
        ));
    }
}
