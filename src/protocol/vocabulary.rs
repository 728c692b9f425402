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
//! The fixed command vocabulary shared with the strip firmware. Registration order is the
//! wire identifier, so entries must never be reordered.

use super::codec::{Codec, FieldType, Signature};
use super::ProtocolError;

pub const CMD_ERROR: &str = "CMDERROR";
pub const SET_COLOR_ALL: &str = "SETCOLORALL";
pub const SET_COLOR_SINGLE: &str = "SETCOLORSINGLE";
pub const SET_COLOR_RANGE: &str = "SETCOLORRANGE";
pub const SET_PATTERN_RAINBOW: &str = "SETPATTERNRAINBOW";
pub const SET_PATTERN_THEATER: &str = "SETPATTERNTHEATER";
pub const SET_PATTERN_WIPE: &str = "SETPATTERNWIPE";
pub const SET_PATTERN_SCANNER: &str = "SETPATTERNSCANNER";
pub const SET_PATTERN_FADE: &str = "SETPATTERNFADE";
pub const SET_BRIGHTNESS_ALL: &str = "SETBRIGHTNESSALL";
pub const SET_LEDS_OFF: &str = "SETLEDSOFF";
pub const ARDUINO_BUSY: &str = "ARDUINOBUSY";
pub const NO_COMMAND: &str = "NOCOMMAND";
pub const CMD_CONF: &str = "CMDCONF";

/// Returns the signatures of every command the device sends or receives.
pub fn signatures() -> Vec<Signature> {
    use FieldType::*;

    vec![
        Signature::new(CMD_ERROR, &[Str]),
        Signature::new(SET_COLOR_ALL, &[U32, U32]),
        Signature::new(SET_COLOR_SINGLE, &[U8, U32, U32]),
        Signature::new(SET_COLOR_RANGE, &[U8, U8, U32, U32]),
        Signature::new(SET_PATTERN_RAINBOW, &[U32]),
        Signature::new(SET_PATTERN_THEATER, &[U32, U32, U32]),
        Signature::new(SET_PATTERN_WIPE, &[U32, U32]),
        Signature::new(SET_PATTERN_SCANNER, &[U32, U32]),
        Signature::new(SET_PATTERN_FADE, &[U32, U32, I32, U32]),
        Signature::new(SET_BRIGHTNESS_ALL, &[U8]),
        Signature::new(SET_LEDS_OFF, &[U32]),
        Signature::new(ARDUINO_BUSY, &[Bool]),
        Signature::new(NO_COMMAND, &[Bool]),
        Signature::new(CMD_CONF, &[U32]),
    ]
}

/// Builds a codec for the device vocabulary.
pub fn codec() -> Result<Codec, ProtocolError> {
    Codec::new(signatures())
}
