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
use std::{fmt, str::FromStr};

use crate::protocol::vocabulary;

use super::ParameterError;

/// The effect the scheduler repeats on every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    SetAll,
    SetSingle,
    SetRange,
    Rainbow,
    Theater,
    Wipe,
    Scanner,
    Fade,
    /// Alternating fade between the two colors.
    Breathe,
    Off,
    Keepalive,
}

impl EffectKind {
    /// All of the effect kinds, in display order.
    pub const ALL: [EffectKind; 11] = [
        EffectKind::SetAll,
        EffectKind::SetSingle,
        EffectKind::SetRange,
        EffectKind::Rainbow,
        EffectKind::Theater,
        EffectKind::Wipe,
        EffectKind::Scanner,
        EffectKind::Fade,
        EffectKind::Breathe,
        EffectKind::Off,
        EffectKind::Keepalive,
    ];

    /// The short name used in configuration and on the keyboard.
    pub fn short_name(&self) -> &'static str {
        match self {
            EffectKind::SetAll => "all",
            EffectKind::SetSingle => "single",
            EffectKind::SetRange => "range",
            EffectKind::Rainbow => "rainbow",
            EffectKind::Theater => "theater",
            EffectKind::Wipe => "wipe",
            EffectKind::Scanner => "scanner",
            EffectKind::Fade => "fade",
            EffectKind::Breathe => "breathe",
            EffectKind::Off => "off",
            EffectKind::Keepalive => "keepalive",
        }
    }

    /// The wire command this effect issues, if it maps onto exactly one.
    pub fn command_name(&self) -> Option<&'static str> {
        match self {
            EffectKind::SetAll => Some(vocabulary::SET_COLOR_ALL),
            EffectKind::SetSingle => Some(vocabulary::SET_COLOR_SINGLE),
            EffectKind::SetRange => Some(vocabulary::SET_COLOR_RANGE),
            EffectKind::Rainbow => Some(vocabulary::SET_PATTERN_RAINBOW),
            EffectKind::Theater => Some(vocabulary::SET_PATTERN_THEATER),
            EffectKind::Wipe => Some(vocabulary::SET_PATTERN_WIPE),
            EffectKind::Scanner => Some(vocabulary::SET_PATTERN_SCANNER),
            EffectKind::Fade => Some(vocabulary::SET_PATTERN_FADE),
            EffectKind::Breathe => None,
            EffectKind::Off => Some(vocabulary::SET_LEDS_OFF),
            EffectKind::Keepalive => Some(vocabulary::NO_COMMAND),
        }
    }
}

impl FromStr for EffectKind {
    type Err = ParameterError;

    /// Accepts either the short name or the wire command name, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EffectKind::ALL
            .into_iter()
            .find(|kind| {
                wanted.eq_ignore_ascii_case(kind.short_name())
                    || kind
                        .command_name()
                        .is_some_and(|name| wanted.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| ParameterError::UnknownEffect(wanted.to_string()))
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_effect_kind() {
        assert_eq!(Ok(EffectKind::Rainbow), "rainbow".parse());
        assert_eq!(Ok(EffectKind::Rainbow), "SETPATTERNRAINBOW".parse());
        assert_eq!(Ok(EffectKind::Breathe), " Breathe ".parse());
        assert_eq!(Ok(EffectKind::Off), "setledsoff".parse());
        assert_eq!(
            Err(ParameterError::UnknownEffect("strobe".to_string())),
            "strobe".parse::<EffectKind>()
        );
        // Brightness is an override, not something to repeat.
        assert!("SETBRIGHTNESSALL".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(Ok(kind), kind.to_string().parse());
        }
    }
}
