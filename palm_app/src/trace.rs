//! SPI trace replay
//!
//! A trace is a text file with one command per line. Empty lines and anything following a `#`
//! are ignored.
//!
//! | Command              | Effect                                                  |
//! |----------------------|---------------------------------------------------------|
//! | `cs <0\|1>`          | Drive the touchscreen chip select line                  |
//! | `bits <hex> <count>` | Clock `count` (1 to 16) bits of `hex` MSB first         |
//! | `touch <x> <y>`      | Press the stylus at the given normalized position      |
//! | `release`            | Lift the stylus                                         |
//! | `port <name\|id>`    | Change what's plugged in the data port                  |
//! | `reset`              | Hard reset                                              |
//! | `expect <hex>`       | Compare with the response to the last `bits` command    |
//! | `expect_pen <0\|1>`  | Compare with the level of the pen interrupt line        |

use palm_lib::{DataPort, Interrupt, Palm};
use tracing::{debug, info, warn};

use crate::config::parse_data_port;
use crate::error::{AppError, Result};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Command {
    ChipSelect(bool),
    Bits { data: u16, count: u8 },
    Touch { x: f32, y: f32 },
    Release,
    Port(DataPort),
    Reset,
    Expect(u16),
    ExpectPen(bool),
}

/// Command along with the line it was read from, for error reporting
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TraceLine {
    pub line: usize,
    pub command: Command,
}

pub fn parse(text: &str) -> Result<Vec<TraceLine>> {
    let mut commands = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let code = raw.split('#').next().unwrap_or("");

        let tokens: Vec<&str> = code.split_whitespace().collect();

        if tokens.is_empty() {
            continue;
        }

        let command =
            parse_command(&tokens).map_err(|message| AppError::Trace { line, message })?;

        commands.push(TraceLine { line, command });
    }

    Ok(commands)
}

fn parse_command(tokens: &[&str]) -> ::std::result::Result<Command, String> {
    let command = match tokens {
        ["cs", level] => Command::ChipSelect(parse_level(level)?),
        ["bits", data, count] => {
            let count = count
                .parse::<u8>()
                .ok()
                .filter(|c| (1..=16).contains(c))
                .ok_or_else(|| format!("invalid bit count {:?}", count))?;

            Command::Bits {
                data: parse_hex(data)?,
                count,
            }
        }
        ["touch", x, y] => Command::Touch {
            x: parse_coord(x)?,
            y: parse_coord(y)?,
        },
        ["release"] => Command::Release,
        ["port", port] => Command::Port(
            parse_data_port(port).ok_or_else(|| format!("unknown data port {:?}", port))?,
        ),
        ["reset"] => Command::Reset,
        ["expect", value] => Command::Expect(parse_hex(value)?),
        ["expect_pen", level] => Command::ExpectPen(parse_level(level)?),
        _ => return Err(format!("can't parse {:?}", tokens.join(" "))),
    };

    Ok(command)
}

fn parse_level(s: &str) -> ::std::result::Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(format!("invalid line level {:?}", s)),
    }
}

fn parse_hex(s: &str) -> ::std::result::Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value {:?}: {}", s, e))
}

fn parse_coord(s: &str) -> ::std::result::Result<f32, String> {
    match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid coordinate {:?}", s)),
    }
}

/// Outcome of a replay
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TraceReport {
    /// Number of `bits` commands executed
    pub exchanges: usize,
    /// Number of expectations checked
    pub checks: usize,
    pub mismatches: usize,
}

/// Run `commands` against `palm`. Mismatching expectations are logged and counted, only an
/// expectation with nothing to compare against aborts the replay.
pub fn run(palm: &mut Palm, commands: &[TraceLine]) -> Result<TraceReport> {
    let mut report = TraceReport::default();
    let mut last_response = None;

    for &TraceLine { line, command } in commands {
        match command {
            Command::ChipSelect(level) => {
                debug!("{}: chip select {}", line, level as u8);
                palm.spi_set_chip_select(level);
            }
            Command::Bits { data, count } => {
                let response = palm.spi_exchange(data, count);

                debug!(
                    "{}: sent {:0w$x} got {:0w$x}",
                    line,
                    data,
                    response,
                    w = (count as usize).div_ceil(4)
                );

                last_response = Some(response);
                report.exchanges += 1;
            }
            Command::Touch { x, y } => palm.touch_at(x, y),
            Command::Release => palm.release_touch(),
            Command::Port(port) => palm.set_data_port(port),
            Command::Reset => {
                palm.hard_reset();
                last_response = None;
            }
            Command::Expect(expected) => {
                let Some(got) = last_response else {
                    return Err(AppError::Trace {
                        line,
                        message: "nothing to compare, no bits were exchanged".to_string(),
                    });
                };

                report.checks += 1;

                if got != expected {
                    warn!("{}: expected {:04x}, got {:04x}", line, expected, got);
                    report.mismatches += 1;
                }
            }
            Command::ExpectPen(expected) => {
                let got = palm.irq().is_high(Interrupt::Pen);

                report.checks += 1;

                if got != expected {
                    warn!(
                        "{}: expected pen IRQ {}, got {}",
                        line, expected as u8, got as u8
                    );
                    report.mismatches += 1;
                }
            }
        }
    }

    info!(
        "Replayed {} exchanges, {}/{} checks passed",
        report.exchanges,
        report.checks - report.mismatches,
        report.checks
    );

    Ok(report)
}
