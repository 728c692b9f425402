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
use std::{fmt, time::Duration};

use duration_string::DurationString;
use serde::Deserialize;
use tracing::Level;

use crate::effects::EffectKind;

use super::error::ConfigError;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_BRIGHTNESS: u8 = 255;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(75);
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);
pub const DEFAULT_LOG_LEVEL: Level = Level::INFO;
pub const DEFAULT_EFFECT: EffectKind = EffectKind::Off;

/// Setting `ack_timeout` to this value waits for acknowledgements forever.
const NO_TIMEOUT: &str = "none";

/// A file representation of the strip controller configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Controller {
    /// The serial port the strip controller is attached to.
    port: String,

    /// The serial baud rate.
    baud_rate: Option<u32>,

    /// The serial read timeout.
    timeout: Option<String>,

    /// The number of LEDs on the strip.
    leds: u8,

    /// The brightness applied on the first cycle.
    brightness: Option<u8>,

    /// How often the scheduler runs.
    tick_interval: Option<String>,

    /// How long to wait for one acknowledgement before giving up on the cycle.
    ack_timeout: Option<String>,

    /// How often to check the link while waiting for data.
    poll_interval: Option<String>,

    /// The log level used when RUST_LOG is not set.
    log_level: Option<String>,

    /// Where to write logs. Defaults to stderr.
    log_file: Option<String>,

    /// The effect to start with.
    effect: Option<String>,
}

fn parse_duration(
    key: &'static str,
    value: &Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    value.as_ref().map_or(Ok(default), |duration| {
        DurationString::from_string(duration.clone())
            .map(Into::into)
            .map_err(|e| ConfigError::Duration {
                key,
                value: duration.clone(),
                reason: e.to_string(),
            })
    })
}

impl Controller {
    /// Checks every value so that a bad file fails before the port is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".to_string()));
        }
        if self.leds == 0 {
            return Err(ConfigError::Invalid(
                "leds must be between 1 and 255".to_string(),
            ));
        }
        if self.baud_rate() == 0 {
            return Err(ConfigError::Invalid(
                "baud_rate must be greater than zero".to_string(),
            ));
        }
        self.timeout()?;
        if self.tick_interval()?.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        self.ack_timeout()?;
        self.poll_interval()?;
        self.log_level()?;
        self.effect()?;
        Ok(())
    }

    /// Gets the serial port name.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Gets the baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE)
    }

    /// Gets the serial read timeout.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("timeout", &self.timeout, DEFAULT_TIMEOUT)
    }

    /// Gets the number of LEDs.
    pub fn leds(&self) -> u8 {
        self.leds
    }

    /// Gets the initial brightness.
    pub fn brightness(&self) -> u8 {
        self.brightness.unwrap_or(DEFAULT_BRIGHTNESS)
    }

    /// Gets the scheduler cadence.
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("tick_interval", &self.tick_interval, DEFAULT_TICK_INTERVAL)
    }

    /// Gets the acknowledgement deadline. None means wait forever.
    pub fn ack_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match &self.ack_timeout {
            Some(value) if value.trim().eq_ignore_ascii_case(NO_TIMEOUT) => Ok(None),
            value => parse_duration("ack_timeout", value, DEFAULT_ACK_TIMEOUT).map(Some),
        }
    }

    /// Gets the link poll interval.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("poll_interval", &self.poll_interval, DEFAULT_POLL_INTERVAL)
    }

    /// Gets the configured log level.
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level.as_ref().map_or(Ok(DEFAULT_LOG_LEVEL), |level| {
            level
                .parse::<Level>()
                .map_err(|_| ConfigError::Invalid(format!("invalid log level '{}'", level)))
        })
    }

    /// Gets the log file, if any.
    pub fn log_file(&self) -> Option<&str> {
        self.log_file.as_deref()
    }

    /// Gets the initial effect.
    pub fn effect(&self) -> Result<EffectKind, ConfigError> {
        self.effect.as_ref().map_or(Ok(DEFAULT_EFFECT), |effect| {
            effect
                .parse::<EffectKind>()
                .map_err(|e| ConfigError::Invalid(format!("{}", e)))
        })
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Port: {} @ {} baud", self.port, self.baud_rate())?;
        writeln!(f, "LEDs: {}", self.leds)?;
        writeln!(f, "Brightness: {}", self.brightness())?;
        if let Ok(tick_interval) = self.tick_interval() {
            writeln!(f, "Tick interval: {:?}", tick_interval)?;
        }
        match self.ack_timeout() {
            Ok(Some(ack_timeout)) => writeln!(f, "Acknowledgement timeout: {:?}", ack_timeout)?,
            Ok(None) => writeln!(f, "Acknowledgement timeout: none")?,
            Err(_) => {}
        }
        if let Ok(effect) = self.effect() {
            write!(f, "Effect: {}", effect)?;
        }
        Ok(())
    }
}
