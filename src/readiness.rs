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
//! The readiness gate: the only flow control the strip controller offers. The controller
//! announces its state with ARDUINOBUSY frames and only accepts a new command once it has
//! reported that it is not busy.

use tracing::{debug, warn};

use crate::{
    protocol::{vocabulary, Client, Frame, Value},
    transport::Transport,
};

/// Returns true if the frame is the controller reporting that it is idle.
pub fn is_idle_report(frame: &Frame) -> bool {
    frame.name() == vocabulary::ARDUINO_BUSY && frame.values() == [Value::Bool(false)]
}

/// Takes the next status exchange from the controller and reports whether it may be sent a
/// command. Writes nothing to the link. Anything other than an idle report, including
/// silence, means not ready.
pub fn is_ready<T: Transport>(client: &mut Client<T>, trace_tag: &str) -> bool {
    match client.has_pending_data() {
        Ok(true) => {}
        Ok(false) => {
            debug!(trace_tag, "No status from the device.");
            return false;
        }
        Err(e) => {
            warn!(trace_tag, err = %e, "Unable to poll the device.");
            return false;
        }
    }

    match client.receive() {
        Ok(frame) => {
            let ready = is_idle_report(&frame);
            debug!(trace_tag, status = %frame, ready, "Device status.");
            ready
        }
        Err(e) => {
            warn!(trace_tag, err = %e, "No usable status from the device.");
            false
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
            Some(Duration::from_millis(20)),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_ready_when_not_busy() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.push_status(false);
        assert!(is_ready(&mut client, "test"));
        assert!(device.received().is_empty());
    }

    #[test]
    fn test_not_ready_when_busy() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.push_status(true);
        assert!(!is_ready(&mut client, "test"));
        assert!(device.received().is_empty());
    }

    #[test]
    fn test_not_ready_without_status() {
        let device = Device::get("mock");
        let mut client = client(&device);

        assert!(!is_ready(&mut client, "test"));
    }

    #[test]
    fn test_not_ready_on_other_frames() {
        let device = Device::get("mock");
        let mut client = client(&device);

        device.push_frame(vocabulary::NO_COMMAND, &[Value::Bool(false)]);
        assert!(!is_ready(&mut client, "test"));

        device.push_frame(vocabulary::CMD_CONF, &[Value::U32(11)]);
        assert!(!is_ready(&mut client, "test"));

        // A partial frame never completes before the deadline.
        device.push_bytes(b"11,");
        assert!(!is_ready(&mut client, "test"));
    }

    #[test]
    fn test_idle_report() {
        assert!(is_idle_report(&Frame::new(
            vocabulary::ARDUINO_BUSY,
            vec![Value::Bool(false)]
        )));
        assert!(!is_idle_report(&Frame::new(
            vocabulary::ARDUINO_BUSY,
            vec![Value::Bool(true)]
        )));
        assert!(!is_idle_report(&Frame::new(
            vocabulary::NO_COMMAND,
            vec![Value::Bool(false)]
        )));
    }
}
