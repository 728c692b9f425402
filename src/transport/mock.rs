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
use std::{collections::VecDeque, io, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::protocol::{vocabulary, Codec, Frame, FrameBuffer, ProtocolError, Value};

/// The number of received commands kept for inspection. Older ones are forgotten.
const MAX_RECORDED: usize = 1024;

/// A simulated strip controller. It acknowledges every command it receives with CMDCONF and,
/// when reporting is enabled, announces that it is idle whenever the host looks for data.
#[derive(Clone)]
pub struct Device {
    name: String,
    state: Arc<Mutex<State>>,
}

struct State {
    codec: Codec,
    inbound: FrameBuffer,
    outbound: VecDeque<u8>,
    received: VecDeque<Frame>,
    report_idle: bool,
    busy: bool,
    silent: bool,
    error: Option<String>,
}

impl State {
    fn queue(&mut self, name: &str, values: &[Value]) {
        match self.codec.encode(name, values) {
            Ok(bytes) => self.outbound.extend(bytes),
            Err(e) => warn!(err = %e, "Simulated controller could not encode reply."),
        }
    }

    fn handle_written(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes);
        while let Some(raw) = self.inbound.next_frame() {
            let frame = match self.codec.decode(&raw) {
                Ok(frame) => frame,
                Err(e) => {
                    if !self.silent {
                        self.queue(vocabulary::CMD_ERROR, &[Value::Str(e.to_string())]);
                    }
                    continue;
                }
            };
            debug!(frame = %frame, "Simulated controller received command.");

            let id = self.codec.id(frame.name()).unwrap_or_default() as u32;
            if self.received.len() == MAX_RECORDED {
                self.received.pop_front();
            }
            self.received.push_back(frame);
            if self.silent {
                continue;
            }
            match self.error.take() {
                Some(text) => self.queue(vocabulary::CMD_ERROR, &[Value::Str(text)]),
                None => self.queue(vocabulary::CMD_CONF, &[Value::U32(id)]),
            }
        }
    }
}

impl Device {
    fn new(name: &str, report_idle: bool) -> Result<Device, ProtocolError> {
        Ok(Device {
            name: name.to_string(),
            state: Arc::new(Mutex::new(State {
                codec: vocabulary::codec()?,
                inbound: FrameBuffer::new(),
                outbound: VecDeque::new(),
                received: VecDeque::new(),
                report_idle,
                busy: false,
                silent: false,
                error: None,
            })),
        })
    }

    /// Gets a simulated controller that reports itself idle whenever it has nothing else to say.
    pub fn idle(name: &str) -> Result<Device, ProtocolError> {
        Device::new(name, true)
    }

    #[cfg(test)]
    /// Gets a scripted controller. It only reports status when told to.
    pub fn get(name: &str) -> Device {
        Device::new(name, false).expect("vocabulary must be valid")
    }

    #[cfg(test)]
    /// Queues a status report with the given busy flag.
    pub fn push_status(&self, busy: bool) {
        self.push_frame(vocabulary::ARDUINO_BUSY, &[Value::Bool(busy)]);
    }

    #[cfg(test)]
    /// Queues an arbitrary frame for the host to read.
    pub fn push_frame(&self, name: &str, values: &[Value]) {
        self.state.lock().queue(name, values);
    }

    #[cfg(test)]
    /// Queues raw bytes for the host to read.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state.lock().outbound.extend(bytes.iter().copied());
    }

    #[cfg(test)]
    /// Marks the controller busy, which suppresses automatic idle reports.
    pub fn set_busy(&self, busy: bool) {
        self.state.lock().busy = busy;
    }

    #[cfg(test)]
    /// A silent controller swallows commands without acknowledging them.
    pub fn set_silent(&self, silent: bool) {
        self.state.lock().silent = silent;
    }

    #[cfg(test)]
    /// Answers the next command with CMDERROR carrying the given text.
    pub fn fail_next(&self, text: &str) {
        self.state.lock().error = Some(text.to_string());
    }

    #[cfg(test)]
    /// Gets every command the host has written so far.
    pub fn received(&self) -> Vec<Frame> {
        self.state.lock().received.iter().cloned().collect()
    }

    #[cfg(test)]
    /// Gets the number of bytes the host has not read yet.
    pub fn unread(&self) -> usize {
        self.state.lock().outbound.len()
    }
}

impl super::Transport for Device {
    fn name(&self) -> String {
        format!("{} (Mock)", self.name)
    }

    fn bytes_available(&self) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.outbound.is_empty() && state.report_idle && !state.busy && !state.silent {
            state.queue(vocabulary::ARDUINO_BUSY, &[Value::Bool(false)]);
        }
        Ok(state.outbound.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        let count = buf.len().min(state.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.outbound.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.state.lock().handle_written(bytes);
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.state.lock().outbound.clear();
        Ok(())
    }
}
