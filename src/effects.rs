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
//! Effect state owned by the controller: the parameter store, the kinds of effect that can be
//! made active and the composite effects built from catalog operations.

mod breathe;
mod kind;
mod params;

pub use breathe::{Breathe, Phase};
pub use kind::EffectKind;
pub use params::{
    parse_hex_color, ColorSlot, EffectParameters, DEFAULT_INTERVAL_MS, DEFAULT_STEP_COUNT,
    MAX_INTERVAL_MS,
};

/// Errors raised while interpreting effect settings from a collaborator.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("invalid color '{0}', expected a hex value such as #FF8800")]
    InvalidColor(String),

    #[error("unknown color slot '{0}'")]
    UnknownSlot(String),

    #[error("unknown effect '{0}'")]
    UnknownEffect(String),
}
