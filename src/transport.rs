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
use std::{error::Error, io};

use tracing::info;

use crate::config;

mod mock;
mod serial;

/// A byte-oriented duplex link to the strip controller.
pub trait Transport: Send {
    /// Returns the name of the link, for diagnostics.
    fn name(&self) -> String;

    /// Returns the number of bytes that can be read without blocking.
    fn bytes_available(&self) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes. Returns 0 if nothing arrived before the read timeout.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of the given bytes to the link.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Discards anything waiting in the input buffer.
    fn clear_input(&mut self) -> io::Result<()>;
}

impl Transport for Box<dyn Transport> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn bytes_available(&self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        (**self).clear_input()
    }
}

/// Opens the link named in the configuration. Ports whose name starts with "mock" open a
/// simulated controller that is always idle.
pub fn open(config: &config::Controller) -> Result<Box<dyn Transport>, Box<dyn Error>> {
    let port = config.port();
    if port.starts_with("mock") {
        info!(port, "Using simulated strip controller.");
        return Ok(Box::new(mock::Device::idle(port)?));
    }

    Ok(Box::new(serial::Serial::open(
        port,
        config.baud_rate(),
        config.timeout()?,
    )?))
}

/// Lists the serial ports known to the system.
pub fn list_ports() -> Result<Vec<String>, Box<dyn Error>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|port| match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => format!(
                "{} (USB {:04x}:{:04x}{})",
                port.port_name,
                usb.vid,
                usb.pid,
                usb.product.map(|p| format!(", {}", p)).unwrap_or_default()
            ),
            _ => port.port_name,
        })
        .collect())
}
