// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! The typed operations the strip controller supports. Every operation clamps its arguments
//! into the ranges the firmware accepts, converts total durations into the per-step interval
//! the firmware expects and performs exactly one acknowledged exchange.

use tracing::{debug, info};

use crate::{
    protocol::{vocabulary, Client, Frame, ProtocolError, Value},
    transport::Transport,
};

/// The largest 24-bit RGB color.
pub const MAX_COLOR: u32 = 0xFF_FFFF;

/// The number of steps in one full rainbow cycle.
pub const RAINBOW_STEPS: u32 = 256;

/// Clamps a color into the 24-bit range. Black is a valid color.
pub fn constrain_color(color: i64) -> u32 {
    color.clamp(0, i64::from(MAX_COLOR)) as u32
}

/// Clamps a brightness into 0-255.
pub fn constrain_brightness(brightness: i64) -> u8 {
    brightness.clamp(0, i64::from(u8::MAX)) as u8
}

/// Clamps a run of LEDs so that it starts on the strip and does not run off the end.
pub fn clamp_range(start: i64, count: i64, leds: u8) -> (u8, u8) {
    let leds = i64::from(leds.max(1));
    let start = start.clamp(0, leds - 1);
    let count = count.clamp(0, leds - start);
    (start as u8, count as u8)
}

/// Converts a total duration into a per-unit interval, never less than 1ms.
pub fn duration_to_interval(total_ms: u32, units: u32) -> u32 {
    (total_ms / units.max(1)).max(1)
}

/// A single device operation together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sets every LED to one color.
    SetAll { color: u32, duration_ms: u32 },

    /// Sets one LED.
    SetSingle {
        index: u8,
        color: u32,
        duration_ms: u32,
    },

    /// Sets a run of LEDs.
    SetRange {
        start: u8,
        count: u8,
        color: u32,
        duration_ms: u32,
    },

    /// Cycles the whole strip through the color wheel.
    Rainbow { duration_ms: u32 },

    /// Theater-style chase between two colors.
    Theater {
        color1: u32,
        color2: u32,
        duration_ms: u32,
    },

    /// Wipes a color along the strip.
    Wipe { color: u32, duration_ms: u32 },

    /// Bounces a single color back and forth.
    Scanner { color: u32, duration_ms: u32 },

    /// Fades from one color to another in the given number of steps.
    Fade {
        from: u32,
        to: u32,
        steps: u32,
        duration_ms: u32,
    },

    /// Sets the global brightness.
    SetBrightness { brightness: u8 },

    /// Turns every LED off.
    LedsOff { duration_ms: u32 },

    /// Does nothing; keeps the controller talking.
    Keepalive,
}

impl Command {
    /// The wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetAll { .. } => vocabulary::SET_COLOR_ALL,
            Command::SetSingle { .. } => vocabulary::SET_COLOR_SINGLE,
            Command::SetRange { .. } => vocabulary::SET_COLOR_RANGE,
            Command::Rainbow { .. } => vocabulary::SET_PATTERN_RAINBOW,
            Command::Theater { .. } => vocabulary::SET_PATTERN_THEATER,
            Command::Wipe { .. } => vocabulary::SET_PATTERN_WIPE,
            Command::Scanner { .. } => vocabulary::SET_PATTERN_SCANNER,
            Command::Fade { .. } => vocabulary::SET_PATTERN_FADE,
            Command::SetBrightness { .. } => vocabulary::SET_BRIGHTNESS_ALL,
            Command::LedsOff { .. } => vocabulary::SET_LEDS_OFF,
            Command::Keepalive => vocabulary::NO_COMMAND,
        }
    }

    /// The clamped wire values of the command for a strip of the given length.
    pub fn values(&self, leds: u8) -> Vec<Value> {
        let color = |c: u32| Value::U32(constrain_color(i64::from(c)));
        let leds_units = u32::from(leds);

        match *self {
            Command::SetAll {
                color: c,
                duration_ms,
            } => vec![color(c), Value::U32(duration_ms)],
            Command::SetSingle {
                index,
                color: c,
                duration_ms,
            } => {
                let (index, _) = clamp_range(i64::from(index), 1, leds);
                vec![Value::U8(index), color(c), Value::U32(duration_ms)]
            }
            Command::SetRange {
                start,
                count,
                color: c,
                duration_ms,
            } => {
                let (start, count) = clamp_range(i64::from(start), i64::from(count), leds);
                vec![
                    Value::U8(start),
                    Value::U8(count),
                    color(c),
                    Value::U32(duration_ms),
                ]
            }
            Command::Rainbow { duration_ms } => {
                vec![Value::U32(duration_to_interval(duration_ms, RAINBOW_STEPS))]
            }
            Command::Theater {
                color1,
                color2,
                duration_ms,
            } => vec![
                color(color1),
                color(color2),
                Value::U32(duration_to_interval(duration_ms, leds_units)),
            ],
            Command::Wipe {
                color: c,
                duration_ms,
            } => vec![
                color(c),
                Value::U32(duration_to_interval(duration_ms, leds_units)),
            ],
            Command::Scanner {
                color: c,
                duration_ms,
            } => vec![
                color(c),
                Value::U32(duration_to_interval(duration_ms, 2 * leds_units)),
            ],
            Command::Fade {
                from,
                to,
                steps,
                duration_ms,
            } => {
                let steps = steps.clamp(1, i32::MAX as u32);
                vec![
                    color(from),
                    color(to),
                    Value::I32(steps as i32),
                    Value::U32(duration_to_interval(duration_ms, steps)),
                ]
            }
            Command::SetBrightness { brightness } => vec![Value::U8(brightness)],
            Command::LedsOff { duration_ms } => vec![Value::U32(duration_ms)],
            Command::Keepalive => vec![Value::Bool(true)],
        }
    }
}

/// Issues catalog operations to a strip of a fixed length.
pub struct Catalog<T: Transport> {
    client: Client<T>,
    leds: u8,
}

impl<T: Transport> Catalog<T> {
    /// Creates a catalog for a strip with the given number of LEDs.
    pub fn new(client: Client<T>, leds: u8) -> Catalog<T> {
        Catalog {
            client,
            leds: leds.max(1),
        }
    }

    /// The number of LEDs on the strip.
    pub fn leds(&self) -> u8 {
        self.leds
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client<T> {
        &mut self.client
    }

    /// Consumes the catalog, returning the client.
    pub fn into_client(self) -> Client<T> {
        self.client
    }

    /// Sends the command and returns the acknowledgement.
    pub fn execute(&mut self, command: &Command) -> Result<Frame, ProtocolError> {
        let values = command.values(self.leds);
        let ack = self.client.send_and_await(command.name(), &values)?;
        debug!(command = command.name(), ack = %ack, "Command acknowledged.");
        Ok(ack)
    }

    pub fn set_all(&mut self, color: u32, duration_ms: u32) -> Result<Frame, ProtocolError> {
        self.execute(&Command::SetAll { color, duration_ms })
    }

    pub fn set_single(
        &mut self,
        index: u8,
        color: u32,
        duration_ms: u32,
    ) -> Result<Frame, ProtocolError> {
        self.execute(&Command::SetSingle {
            index,
            color,
            duration_ms,
        })
    }

    pub fn set_range(
        &mut self,
        start: u8,
        count: u8,
        color: u32,
        duration_ms: u32,
    ) -> Result<Frame, ProtocolError> {
        self.execute(&Command::SetRange {
            start,
            count,
            color,
            duration_ms,
        })
    }

    pub fn rainbow(&mut self, duration_ms: u32) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Rainbow { duration_ms })
    }

    pub fn theater(
        &mut self,
        color1: u32,
        color2: u32,
        duration_ms: u32,
    ) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Theater {
            color1,
            color2,
            duration_ms,
        })
    }

    pub fn wipe(&mut self, color: u32, duration_ms: u32) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Wipe { color, duration_ms })
    }

    pub fn scanner(&mut self, color: u32, duration_ms: u32) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Scanner { color, duration_ms })
    }

    pub fn fade(
        &mut self,
        from: u32,
        to: u32,
        steps: u32,
        duration_ms: u32,
    ) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Fade {
            from,
            to,
            steps,
            duration_ms,
        })
    }

    pub fn set_brightness(&mut self, brightness: u8) -> Result<Frame, ProtocolError> {
        info!(brightness, "Setting brightness.");
        self.execute(&Command::SetBrightness { brightness })
    }

    pub fn leds_off(&mut self, duration_ms: u32) -> Result<Frame, ProtocolError> {
        self.execute(&Command::LedsOff { duration_ms })
    }

    pub fn keepalive(&mut self) -> Result<Frame, ProtocolError> {
        self.execute(&Command::Keepalive)
    }
}
