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
//! The repeat scheduler's state machine. Each cycle either repeats the active effect or, once,
//! applies a pending brightness change before handing back to the effect it interrupted.

use tracing::debug;

use crate::effects::EffectKind;

/// The scheduler's state between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Repeat the active effect.
    Normal { active: EffectKind },

    /// Apply the brightness on the next ready cycle, then go back to `resume`.
    OverridePending { resume: EffectKind },
}

/// What the next cycle should invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Effect(EffectKind),
    Brightness,
}

/// Decides what each scheduler cycle invokes.
#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
}

impl Scheduler {
    /// Creates a scheduler repeating the given effect.
    pub fn new(active: EffectKind) -> Scheduler {
        Scheduler {
            state: SchedulerState::Normal { active },
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The effect being repeated, or the one that resumes after a pending override.
    pub fn active(&self) -> EffectKind {
        match self.state {
            SchedulerState::Normal { active } => active,
            SchedulerState::OverridePending { resume } => resume,
        }
    }

    pub fn is_override_pending(&self) -> bool {
        matches!(self.state, SchedulerState::OverridePending { .. })
    }

    /// Changes the repeated effect. A pending override still runs first.
    pub fn set_active(&mut self, kind: EffectKind) {
        self.state = match self.state {
            SchedulerState::Normal { .. } => SchedulerState::Normal { active: kind },
            SchedulerState::OverridePending { .. } => {
                SchedulerState::OverridePending { resume: kind }
            }
        };
    }

    /// Schedules a brightness change for the next cycle, remembering the current effect.
    pub fn request_override(&mut self) {
        if let SchedulerState::Normal { active } = self.state {
            debug!(resume = %active, "Brightness override pending.");
            self.state = SchedulerState::OverridePending { resume: active };
        }
    }

    /// The invocation for the next cycle.
    pub fn select(&self) -> Selection {
        match self.state {
            SchedulerState::Normal { active } => Selection::Effect(active),
            SchedulerState::OverridePending { .. } => Selection::Brightness,
        }
    }

    /// Records that the selected invocation was acknowledged by the device.
    pub fn complete(&mut self, selection: Selection) {
        if let (Selection::Brightness, SchedulerState::OverridePending { resume }) =
            (selection, self.state)
        {
            debug!(resume = %resume, "Brightness applied, resuming effect.");
            self.state = SchedulerState::Normal { active: resume };
        }
    }
}
