// Tournament draft order: the fixed 20-step ban/pick table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of steps in a full draft.
pub const TOTAL_STEPS: usize = 20;

/// One side of the draft. Blue is "team A" and drafts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// Parse a side name. Accepts "blue"/"red" and the "a"/"b" aliases.
    pub fn from_str_team(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blue" | "a" => Some(Team::Blue),
            "red" | "b" => Some(Team::Red),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Team::Blue => "Blue",
            Team::Red => "Red",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// What a draft step does with the selected entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Ban,
    Pick,
}

impl Action {
    pub fn from_str_action(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ban" => Some(Action::Ban),
            "pick" => Some(Action::Pick),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Action::Ban => "Ban",
            Action::Pick => "Pick",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A single entry of the draft table: which side acts, how, and into which
/// slot of that side's ban or pick row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftStep {
    pub team: Team,
    pub action: Action,
    pub slot: usize,
}

impl fmt::Display for DraftStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.team, self.action)
    }
}

const fn step(team: Team, action: Action, slot: usize) -> DraftStep {
    DraftStep { team, action, slot }
}

/// The canonical tournament order. The pick phases snake (B R R B B R, then
/// R B B R) and must not be re-derived from a formula.
pub const SEQUENCE: [DraftStep; TOTAL_STEPS] = [
    // Ban phase 1
    step(Team::Blue, Action::Ban, 0),
    step(Team::Red, Action::Ban, 0),
    step(Team::Blue, Action::Ban, 1),
    step(Team::Red, Action::Ban, 1),
    step(Team::Blue, Action::Ban, 2),
    step(Team::Red, Action::Ban, 2),
    // Pick phase 1
    step(Team::Blue, Action::Pick, 0),
    step(Team::Red, Action::Pick, 0),
    step(Team::Red, Action::Pick, 1),
    step(Team::Blue, Action::Pick, 1),
    step(Team::Blue, Action::Pick, 2),
    step(Team::Red, Action::Pick, 2),
    // Ban phase 2
    step(Team::Red, Action::Ban, 3),
    step(Team::Blue, Action::Ban, 3),
    step(Team::Red, Action::Ban, 4),
    step(Team::Blue, Action::Ban, 4),
    // Pick phase 2
    step(Team::Red, Action::Pick, 3),
    step(Team::Blue, Action::Pick, 3),
    step(Team::Blue, Action::Pick, 4),
    step(Team::Red, Action::Pick, 4),
];

/// Look up the step at `cursor`. Returns `None` once the draft is complete.
pub fn step_at(cursor: usize) -> Option<DraftStep> {
    SEQUENCE.get(cursor).copied()
}

/// Coarse draft phase, used for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Ban1,
    Pick1,
    Ban2,
    Pick2,
    Complete,
}

impl Phase {
    pub fn display_str(&self) -> &'static str {
        match self {
            Phase::Ban1 => "Ban Phase 1",
            Phase::Pick1 => "Pick Phase 1",
            Phase::Ban2 => "Ban Phase 2",
            Phase::Pick2 => "Pick Phase 2",
            Phase::Complete => "Draft Complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Map a cursor position to its phase.
pub fn phase_at(cursor: usize) -> Phase {
    match cursor {
        0..=5 => Phase::Ban1,
        6..=11 => Phase::Pick1,
        12..=15 => Phase::Ban2,
        16..=19 => Phase::Pick2,
        _ => Phase::Complete,
    }
}
