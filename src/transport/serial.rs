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
use std::{
    io::{self, Read, Write},
    time::Duration,
};

use serialport::{ClearBuffer, SerialPort};
use tracing::debug;

use super::Transport;

/// A strip controller attached to a serial port.
pub struct Serial {
    port: Box<dyn SerialPort>,
    name: String,
}

impl Serial {
    /// Opens the given serial port.
    pub fn open(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Serial, serialport::Error> {
        let port = serialport::new(path, baud_rate).timeout(timeout).open()?;
        debug!(port = path, baud_rate, timeout = ?timeout, "Serial port opened.");

        Ok(Serial {
            name: port.name().unwrap_or_else(|| path.to_string()),
            port,
        })
    }
}

impl Transport for Serial {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn bytes_available(&self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            result => result,
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }
}
