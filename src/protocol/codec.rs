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
use std::{collections::HashMap, fmt};

use tracing::warn;

use super::ProtocolError;

/// Separates the fields of a frame.
pub const FIELD_SEPARATOR: u8 = b',';
/// Terminates a frame.
pub const COMMAND_SEPARATOR: u8 = b';';
/// Escapes a separator that appears inside a binary field.
pub const ESCAPE: u8 = b'/';

const ESCAPED_BYTES: [u8; 4] = [FIELD_SEPARATOR, COMMAND_SEPARATOR, ESCAPE, 0];

/// The most unterminated input a frame buffer holds before it is thrown away.
pub const MAX_PENDING: usize = 4096;

/// The primitive type of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U8,
    U32,
    I32,
    Bool,
    Str,
}

impl FieldType {
    /// The exact number of bytes the field occupies on the wire. Strings are variable.
    fn width(&self) -> Option<usize> {
        match self {
            FieldType::U8 | FieldType::Bool => Some(1),
            FieldType::U32 | FieldType::I32 => Some(4),
            FieldType::Str => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FieldType::U8 => "U8",
            FieldType::U32 => "U32",
            FieldType::I32 => "I32",
            FieldType::Bool => "BOOL",
            FieldType::Str => "STRING",
        };
        write!(f, "{}", tag)
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U32(u32),
    I32(i32),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Returns the type tag of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::U8(_) => FieldType::U8,
            Value::U32(_) => FieldType::U32,
            Value::I32(_) => FieldType::I32,
            Value::Bool(_) => FieldType::Bool,
            Value::Str(_) => FieldType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Little-endian wire bytes, before escaping.
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::U8(value) => vec![*value],
            Value::U32(value) => value.to_le_bytes().to_vec(),
            Value::I32(value) => value.to_le_bytes().to_vec(),
            Value::Bool(value) => vec![u8::from(*value)],
            Value::Str(value) => value.as_bytes().to_vec(),
        }
    }

    fn from_bytes(field_type: FieldType, bytes: &[u8]) -> Result<Value, String> {
        if let Some(width) = field_type.width() {
            if bytes.len() != width {
                return Err(format!(
                    "{} field must be {} byte(s), got {}",
                    field_type,
                    width,
                    bytes.len()
                ));
            }
        }

        Ok(match field_type {
            FieldType::U8 => Value::U8(bytes[0]),
            FieldType::U32 => {
                Value::U32(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            FieldType::I32 => {
                Value::I32(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            FieldType::Bool => Value::Bool(bytes[0] != 0),
            FieldType::Str => {
                // The firmware library terminates strings with a NUL.
                let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                Value::Str(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(value) => write!(f, "{}", value),
            Value::U32(value) => write!(f, "{}", value),
            Value::I32(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{:?}", value),
        }
    }
}

/// The registered field layout of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    fields: Vec<FieldType>,
}

impl Signature {
    pub fn new(name: &str, fields: &[FieldType]) -> Signature {
        Signature {
            name: name.to_string(),
            fields: fields.to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }
}

/// One decoded command or acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    name: String,
    values: Vec<Value>,
}

impl Frame {
    pub fn new(name: &str, values: Vec<Value>) -> Frame {
        Frame {
            name: name.to_string(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Encodes and decodes frames against a fixed set of command signatures. A command's wire
/// identifier is its registration index, written as ASCII decimal.
#[derive(Debug, Clone)]
pub struct Codec {
    signatures: Vec<Signature>,
    ids: HashMap<String, usize>,
}

impl Codec {
    /// Creates a codec from the given signatures. Names must be unique.
    pub fn new(signatures: Vec<Signature>) -> Result<Codec, ProtocolError> {
        let mut ids = HashMap::new();
        for (id, signature) in signatures.iter().enumerate() {
            if ids.insert(signature.name.clone(), id).is_some() {
                return Err(ProtocolError::DuplicateCommand(signature.name.clone()));
            }
        }

        Ok(Codec { signatures, ids })
    }

    /// Gets the wire identifier of the given command.
    pub fn id(&self, name: &str) -> Result<usize, ProtocolError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))
    }

    /// Encodes a command into a complete, terminated frame.
    pub fn encode(&self, name: &str, values: &[Value]) -> Result<Vec<u8>, ProtocolError> {
        let id = self.id(name)?;
        let signature = &self.signatures[id];

        if signature.fields.len() != values.len() {
            return Err(ProtocolError::ArityMismatch {
                name: name.to_string(),
                reason: format!(
                    "expected {} field(s), got {}",
                    signature.fields.len(),
                    values.len()
                ),
            });
        }
        for (i, (expected, value)) in signature.fields.iter().zip(values).enumerate() {
            if *expected != value.field_type() {
                return Err(ProtocolError::ArityMismatch {
                    name: name.to_string(),
                    reason: format!(
                        "field {} expected {}, got {}",
                        i,
                        expected,
                        value.field_type()
                    ),
                });
            }
        }

        let mut frame = id.to_string().into_bytes();
        for value in values {
            frame.push(FIELD_SEPARATOR);
            for byte in value.to_bytes() {
                if ESCAPED_BYTES.contains(&byte) {
                    frame.push(ESCAPE);
                }
                frame.push(byte);
            }
        }
        frame.push(COMMAND_SEPARATOR);

        Ok(frame)
    }

    /// Decodes a single frame. The trailing command separator is optional.
    pub fn decode(&self, bytes: &[u8]) -> Result<Frame, ProtocolError> {
        let fields = split_fields(bytes)?;

        let id_field = &fields[0];
        if fields.len() == 1 && id_field.is_empty() {
            return Err(ProtocolError::MalformedFrame("empty frame".to_string()));
        }
        let id_text = std::str::from_utf8(id_field).map_err(|_| {
            ProtocolError::MalformedFrame("non-ASCII command identifier".to_string())
        })?;
        let id: usize = id_text.trim().parse().map_err(|_| {
            ProtocolError::MalformedFrame(format!("invalid command identifier '{}'", id_text))
        })?;
        let signature = self
            .signatures
            .get(id)
            .ok_or_else(|| ProtocolError::UnknownCommand(id.to_string()))?;

        let raw_values = &fields[1..];
        if raw_values.len() != signature.fields.len() {
            return Err(ProtocolError::MalformedFrame(format!(
                "{} expects {} field(s), got {}",
                signature.name,
                signature.fields.len(),
                raw_values.len()
            )));
        }

        let values = signature
            .fields
            .iter()
            .zip(raw_values)
            .map(|(field_type, raw)| Value::from_bytes(*field_type, raw))
            .collect::<Result<Vec<Value>, String>>()
            .map_err(|reason| {
                ProtocolError::MalformedFrame(format!("{}: {}", signature.name, reason))
            })?;

        Ok(Frame {
            name: signature.name.clone(),
            values,
        })
    }
}

/// Splits a frame into unescaped fields, stopping at the first unescaped command separator.
fn split_fields(bytes: &[u8]) -> Result<Vec<Vec<u8>>, ProtocolError> {
    let mut fields: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut escaped = false;

    for (i, byte) in bytes.iter().copied().enumerate() {
        if escaped {
            if !ESCAPED_BYTES.contains(&byte) {
                current.push(ESCAPE);
            }
            current.push(byte);
            escaped = false;
            continue;
        }

        match byte {
            ESCAPE => escaped = true,
            FIELD_SEPARATOR => fields.push(std::mem::take(&mut current)),
            COMMAND_SEPARATOR => {
                if i + 1 != bytes.len() {
                    return Err(ProtocolError::MalformedFrame(
                        "trailing bytes after command separator".to_string(),
                    ));
                }
                break;
            }
            _ => current.push(byte),
        }
    }

    if escaped {
        return Err(ProtocolError::MalformedFrame(
            "frame ends inside an escape sequence".to_string(),
        ));
    }
    fields.push(current);
    Ok(fields)
}

/// Accumulates bytes read from the link and hands out complete frames. A frame that fails to
/// decode has still been fully consumed, so the next frame starts cleanly.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        FrameBuffer::default()
    }

    /// Appends freshly read bytes. Unterminated input beyond MAX_PENDING is dropped.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > MAX_PENDING && !self.has_complete_frame() {
            warn!(
                dropped = self.pending.len(),
                "Dropping unterminated input."
            );
            self.pending.clear();
        }
    }

    /// Returns true if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns true if at least one terminated frame is buffered.
    pub fn has_complete_frame(&self) -> bool {
        self.frame_end().is_some()
    }

    /// Removes and returns the next terminated frame, including its separator.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let end = self.frame_end()?;
        Some(self.pending.drain(..=end).collect())
    }

    fn frame_end(&self) -> Option<usize> {
        let mut escaped = false;
        for (i, byte) in self.pending.iter().enumerate() {
            if escaped {
                escaped = false;
            } else if *byte == ESCAPE {
                escaped = true;
            } else if *byte == COMMAND_SEPARATOR {
                return Some(i);
            }
        }
        None
    }
}
