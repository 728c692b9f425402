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
use std::{io, thread};

use tokio::sync::mpsc::Sender;
use tracing::{info, span, warn, Level};

use crate::effects::{ColorSlot, EffectKind};

use super::Event;

const EFFECT: &str = "effect";
const COLOR1: &str = "color1";
const COLOR2: &str = "color2";
const BRIGHTNESS: &str = "brightness";
const INTERVAL: &str = "interval";
const START: &str = "start";
const STEPS: &str = "steps";
const QUIT: &str = "quit";

/// A UI collaborator that reads settings from the keyboard, one command per line.
pub struct Driver {}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Turns one line of input into an event. Unrecognized input yields nothing.
    fn parse(input: &str) -> Option<Event> {
        let mut words = input.split_whitespace();
        let command = words.next()?.to_lowercase();
        let argument = words.next();

        let event = match (command.as_str(), argument) {
            (QUIT, None) => Some(Event::Quit),
            (EFFECT, Some(name)) => name.parse::<EffectKind>().ok().map(Event::SetEffect),
            (COLOR1, Some(hex)) => Some(Event::SetColor {
                slot: ColorSlot::Primary,
                hex: hex.to_string(),
            }),
            (COLOR2, Some(hex)) => Some(Event::SetColor {
                slot: ColorSlot::Secondary,
                hex: hex.to_string(),
            }),
            (BRIGHTNESS, Some(value)) => value.parse().ok().map(Event::SetBrightness),
            (INTERVAL, Some(value)) => value.parse().ok().map(Event::SetInterval),
            (START, Some(value)) => value.parse().ok().map(Event::SetStartIndex),
            (STEPS, Some(value)) => value.parse().ok().map(Event::SetStepCount),
            _ => None,
        };

        if words.next().is_some() {
            return None;
        }
        event
    }

    /// Prompts for and handles one line. Returns false once the input is exhausted.
    fn monitor_io<R, W>(events_tx: &Sender<Event>, mut reader: R, mut writer: W) -> io::Result<bool>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <name>, {} <hex>, {} <hex>, {} <0-255>, {} <ms>, {} <index>, {} <n>, {}): ",
            EFFECT, COLOR1, COLOR2, BRIGHTNESS, INTERVAL, START, STEPS, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }
        if input.trim().is_empty() {
            return Ok(true);
        }

        match Self::parse(&input) {
            Some(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?,
            None => warn!(input = input.trim(), "Unrecognized input"),
        }
        Ok(true)
    }

    /// Reads stdin on its own thread until it closes or the receiver goes away.
    pub fn monitor_events(
        &self,
        events_tx: Sender<Event>,
    ) -> io::Result<thread::JoinHandle<io::Result<()>>> {
        thread::Builder::new()
            .name("keyboard".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "keyboard driver");
                let _enter = span.enter();

                info!("Keyboard driver started.");
                while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
                info!("Keyboard input closed.");
                Ok(())
            })
    }
}
