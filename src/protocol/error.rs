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
use std::{io, time::Duration};

/// Errors raised while encoding, decoding or exchanging frames with the device.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("arity mismatch for {name}: {reason}")]
    ArityMismatch { name: String, reason: String },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("command '{0}' registered more than once")]
    DuplicateCommand(String),

    #[error("no acknowledgement from the device within {0:?}")]
    LinkStall(Duration),

    #[error("link I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    /// Returns true if the error came from the link rather than from the frame contents.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, ProtocolError::LinkStall(_) | ProtocolError::Io(_))
    }
}
