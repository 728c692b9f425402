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
use std::str::FromStr;

use crate::catalog::{clamp_range, constrain_brightness, constrain_color, Command, MAX_COLOR};

use super::{EffectKind, ParameterError};

/// The longest interval a collaborator may configure.
pub const MAX_INTERVAL_MS: u32 = 60_000;
/// The interval used until a collaborator picks one.
pub const DEFAULT_INTERVAL_MS: u32 = 1_000;
/// The step count used until a collaborator picks one.
pub const DEFAULT_STEP_COUNT: u32 = 100;

/// Which of the two configurable colors to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    Primary,
    Secondary,
}

impl FromStr for ColorSlot {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "color1" | "primary" => Ok(ColorSlot::Primary),
            "2" | "color2" | "secondary" => Ok(ColorSlot::Secondary),
            other => Err(ParameterError::UnknownSlot(other.to_string())),
        }
    }
}

/// Parses a color picker value such as "#FF8800", "ff8800" or "0xff8800".
pub fn parse_hex_color(hex: &str) -> Result<u32, ParameterError> {
    let trimmed = hex.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 6 {
        return Err(ParameterError::InvalidColor(hex.to_string()));
    }
    u32::from_str_radix(digits, 16)
        .ok()
        .filter(|color| *color <= MAX_COLOR)
        .ok_or_else(|| ParameterError::InvalidColor(hex.to_string()))
}

/// The parameters every effect is built from. Setters clamp into range so the record is
/// always valid. Cloning yields a consistent snapshot for one scheduler cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectParameters {
    leds: u8,
    color1: u32,
    color2: u32,
    start_index: u8,
    step_count: u32,
    brightness: u8,
    interval_ms: u32,
}

impl EffectParameters {
    /// Creates the default parameters for a strip: white to black, default interval and steps.
    pub fn new(leds: u8, brightness: u8) -> EffectParameters {
        EffectParameters {
            leds: leds.max(1),
            color1: MAX_COLOR,
            color2: 0x000000,
            start_index: 0,
            step_count: DEFAULT_STEP_COUNT,
            brightness,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }

    pub fn leds(&self) -> u8 {
        self.leds
    }

    pub fn color1(&self) -> u32 {
        self.color1
    }

    pub fn color2(&self) -> u32 {
        self.color2
    }

    pub fn color(&self, slot: ColorSlot) -> u32 {
        match slot {
            ColorSlot::Primary => self.color1,
            ColorSlot::Secondary => self.color2,
        }
    }

    pub fn start_index(&self) -> u8 {
        self.start_index
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Sets one of the colors, clamped into the 24-bit range.
    pub fn set_color(&mut self, slot: ColorSlot, color: i64) {
        let color = constrain_color(color);
        match slot {
            ColorSlot::Primary => self.color1 = color,
            ColorSlot::Secondary => self.color2 = color,
        }
    }

    /// Sets one of the colors from a hex string.
    pub fn set_color_hex(&mut self, slot: ColorSlot, hex: &str) -> Result<(), ParameterError> {
        self.set_color(slot, i64::from(parse_hex_color(hex)?));
        Ok(())
    }

    /// Sets the first LED used by single and range effects, clamped onto the strip.
    pub fn set_start_index(&mut self, start_index: i64) {
        self.start_index = clamp_range(start_index, 0, self.leds).0;
    }

    /// Sets the step count. Fades use it as their step count, ranges as their length.
    pub fn set_step_count(&mut self, step_count: i64) {
        self.step_count = step_count.clamp(0, i64::from(i32::MAX)) as u32;
    }

    pub fn set_brightness(&mut self, brightness: i64) {
        self.brightness = constrain_brightness(brightness);
    }

    /// Sets the total duration of one effect cycle, clamped to 0-60s.
    pub fn set_interval(&mut self, interval_ms: i64) {
        self.interval_ms = interval_ms.clamp(0, i64::from(MAX_INTERVAL_MS)) as u32;
    }

    /// Builds the catalog command for a single-command effect. Composite effects have none.
    pub fn command(&self, kind: EffectKind) -> Option<Command> {
        let duration_ms = self.interval_ms;
        Some(match kind {
            EffectKind::SetAll => Command::SetAll {
                color: self.color1,
                duration_ms,
            },
            EffectKind::SetSingle => Command::SetSingle {
                index: self.start_index,
                color: self.color1,
                duration_ms,
            },
            EffectKind::SetRange => Command::SetRange {
                start: self.start_index,
                count: clamp_range(
                    i64::from(self.start_index),
                    i64::from(self.step_count),
                    self.leds,
                )
                .1,
                color: self.color1,
                duration_ms,
            },
            EffectKind::Rainbow => Command::Rainbow { duration_ms },
            EffectKind::Theater => Command::Theater {
                color1: self.color1,
                color2: self.color2,
                duration_ms,
            },
            EffectKind::Wipe => Command::Wipe {
                color: self.color1,
                duration_ms,
            },
            EffectKind::Scanner => Command::Scanner {
                color: self.color1,
                duration_ms,
            },
            EffectKind::Fade => Command::Fade {
                from: self.color1,
                to: self.color2,
                steps: self.step_count,
                duration_ms,
            },
            EffectKind::Off => Command::LedsOff { duration_ms },
            EffectKind::Keepalive => Command::Keepalive,
            EffectKind::Breathe => return None,
        })
    }
}
