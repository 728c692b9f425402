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
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::transport::Transport;

use super::{vocabulary, Codec, Frame, FrameBuffer, ProtocolError, Value};

/// The largest chunk read from the link in one go.
const MAX_READ: usize = 256;

/// Exchanges frames with the strip controller. Every request waits for exactly one
/// acknowledgement before the call returns, so there is never more than one outstanding
/// request on the link.
pub struct Client<T: Transport> {
    transport: T,
    codec: Codec,
    buffer: FrameBuffer,
    ack_timeout: Option<Duration>,
    poll_interval: Duration,
}

impl<T: Transport> Client<T> {
    /// Creates a new client. With no acknowledgement timeout, waits are unbounded.
    pub fn new(
        transport: T,
        codec: Codec,
        ack_timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Client<T> {
        Client {
            transport,
            codec,
            buffer: FrameBuffer::new(),
            ack_timeout,
            poll_interval,
        }
    }

    /// Gets the codec used by this client.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Gets the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the client, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Drops any stale bytes, both buffered and waiting on the link.
    pub fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.buffer = FrameBuffer::new();
        self.transport.clear_input()?;
        Ok(())
    }

    /// Returns true if there is anything to read. Never blocks.
    pub fn has_pending_data(&self) -> Result<bool, ProtocolError> {
        Ok(!self.buffer.is_empty() || self.transport.bytes_available()? > 0)
    }

    /// Sends a command and waits for the acknowledgement.
    pub fn send_and_await(&mut self, name: &str, values: &[Value]) -> Result<Frame, ProtocolError> {
        let bytes = self.codec.encode(name, values)?;
        debug!(command = name, bytes = bytes.len(), "Sending command.");
        self.transport.write_all(&bytes)?;

        self.receive()
    }

    /// Waits for the next decodable frame. Frames that fail to decode are logged and dropped.
    /// A device-reported error is logged and returned like any other frame.
    pub fn receive(&mut self) -> Result<Frame, ProtocolError> {
        let start = Instant::now();

        loop {
            while let Some(raw) = self.buffer.next_frame() {
                match self.codec.decode(&raw) {
                    Ok(frame) => {
                        if frame.name() == vocabulary::CMD_ERROR {
                            let text = frame.values().first().and_then(|value| value.as_str());
                            warn!(error = text, "Device reported an error.");
                        }
                        return Ok(frame);
                    }
                    Err(e) => warn!(err = %e, "Dropping undecodable frame."),
                }
                self.check_deadline(start)?;
            }

            self.check_deadline(start)?;
            let available = self.transport.bytes_available()?;
            if available > 0 {
                let mut chunk = vec![0u8; available.min(MAX_READ)];
                let read = self.transport.read(&mut chunk)?;
                self.buffer.extend(&chunk[..read]);
                continue;
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Fails with LinkStall once the acknowledgement deadline has passed.
    fn check_deadline(&self, start: Instant) -> Result<(), ProtocolError> {
        match self.ack_timeout {
            Some(ack_timeout) if start.elapsed() >= ack_timeout => {
                Err(ProtocolError::LinkStall(ack_timeout))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::transport::test::Device;

    fn client(device: &Device) -> Client<Device> {
        Client::new(
            device.clone(),
            vocabulary::codec().unwrap(),
            Some(Duration::from_millis(50)),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_send_and_await() {
        let device = Device::get("mock");
        let mut client = client(&device);

        let ack = client
            .send_and_await(vocabulary::SET_PATTERN_RAINBOW, &[Value::U32(10)])
            .unwrap();

        assert_eq!(Frame::new(vocabulary::CMD_CONF, vec![Value::U32(4)]), ack);
        assert_eq!(
            vec![Frame::new(vocabulary::SET_PATTERN_RAINBOW, vec![Value::U32(10)])],
            device.received()
        );
        assert!(!client.has_pending_data().unwrap());
    }

    #[test]
    fn test_device_error_is_returned() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.fail_next("unknown pattern");
        let ack = client
            .send_and_await(vocabulary::SET_LEDS_OFF, &[Value::U32(0)])
            .unwrap();
        assert_eq!(vocabulary::CMD_ERROR, ack.name());
        assert_eq!(Some("unknown pattern"), ack.values()[0].as_str());
    }

    #[test]
    fn test_link_stall() {
        let device = Device::get("mock");
        device.set_silent(true);
        let mut client = client(&device);

        let result = client.send_and_await(vocabulary::SET_LEDS_OFF, &[Value::U32(0)]);
        assert!(matches!(result, Err(ProtocolError::LinkStall(_))));
        // The command still went out exactly once.
        assert_eq!(1, device.received().len());
    }

    #[test]
    fn test_encode_errors_send_nothing() {
        let device = Device::get("mock");
        let mut client = client(&device);

        assert!(matches!(
            client.send_and_await("SETCOLORPURPLE", &[]),
            Err(ProtocolError::UnknownCommand(_))
        ));
        assert!(matches!(
            client.send_and_await(vocabulary::SET_BRIGHTNESS_ALL, &[Value::U32(1)]),
            Err(ProtocolError::ArityMismatch { .. })
        ));
        assert!(device.received().is_empty());
    }

    #[test]
    fn test_receive_skips_undecodable_frames() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.push_bytes(b"77,\x01;noise;");
        device.push_status(false);
        assert!(client.has_pending_data().unwrap());

        let frame = client.receive().unwrap();
        assert_eq!(
            Frame::new(vocabulary::ARDUINO_BUSY, vec![Value::Bool(false)]),
            frame
        );
        assert!(!client.has_pending_data().unwrap());
    }

    /// A link that never stops producing garbage.
    struct Noise {}

    impl Transport for Noise {
        fn name(&self) -> String {
            "noise".to_string()
        }

        fn bytes_available(&self) -> std::io::Result<usize> {
            Ok(4)
        }

        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let noise = b"zz;q";
            let count = buf.len().min(noise.len());
            buf[..count].copy_from_slice(&noise[..count]);
            Ok(count)
        }

        fn write_all(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
            Ok(())
        }

        fn clear_input(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_link_stall_on_constant_noise() {
        let mut client = Client::new(
            Noise {},
            vocabulary::codec().unwrap(),
            Some(Duration::from_millis(50)),
            Duration::from_millis(1),
        );

        let start = std::time::Instant::now();
        let result = client.send_and_await(vocabulary::SET_LEDS_OFF, &[Value::U32(0)]);
        assert!(matches!(result, Err(ProtocolError::LinkStall(_))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_clear_input() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.push_status(true);
        client.clear_input().unwrap();
        assert!(!client.has_pending_data().unwrap());
    }
}
