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
use crate::catalog::Command;

use super::EffectParameters;

/// Which half of the breathe cycle runs next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Fade from the first color to the second.
    #[default]
    Inhale,
    /// Fade from the second color back to the first.
    Exhale,
}

/// A breathing effect: fades back and forth between the two configured colors, one half of
/// the cycle per invocation.
#[derive(Debug, Default)]
pub struct Breathe {
    phase: Phase,
}

impl Breathe {
    pub fn new() -> Breathe {
        Breathe::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The fade for the current phase.
    pub fn command(&self, params: &EffectParameters) -> Command {
        let (from, to) = match self.phase {
            Phase::Inhale => (params.color1(), params.color2()),
            Phase::Exhale => (params.color2(), params.color1()),
        };

        Command::Fade {
            from,
            to,
            steps: params.step_count(),
            duration_ms: params.interval_ms(),
        }
    }

    /// Moves to the other half of the cycle. Call once the fade has been acknowledged.
    pub fn advance(&mut self) {
        self.phase = match self.phase {
            Phase::Inhale => Phase::Exhale,
            Phase::Exhale => Phase::Inhale,
        };
    }

    /// Starts again from the first half of the cycle.
    pub fn reset(&mut self) {
        self.phase = Phase::Inhale;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_breathe_alternates() {
        let params = EffectParameters::new(60, 255);
        let mut breathe = Breathe::new();
        assert_eq!(Phase::Inhale, breathe.phase());

        let first = breathe.command(&params);
        breathe.advance();
        let second = breathe.command(&params);
        breathe.advance();

        assert_eq!(
            Command::Fade {
                from: 0xFFFFFF,
                to: 0x000000,
                steps: params.step_count(),
                duration_ms: params.interval_ms(),
            },
            first
        );
        assert_eq!(
            Command::Fade {
                from: 0x000000,
                to: 0xFFFFFF,
                steps: params.step_count(),
                duration_ms: params.interval_ms(),
            },
            second
        );
        assert_eq!(Phase::Inhale, breathe.phase());
        assert_eq!(first, breathe.command(&params));
    }

    #[test]
    fn test_breathe_reset() {
        let mut breathe = Breathe::new();
        breathe.advance();
        assert_eq!(Phase::Exhale, breathe.phase());
        breathe.reset();
        assert_eq!(Phase::Inhale, breathe.phase());
    }
}
