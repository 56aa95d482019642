pub mod sequence;
pub mod state;

pub use sequence::{phase_at, step_at, Action, DraftStep, Phase, Team, SEQUENCE, TOTAL_STEPS};
pub use state::{DraftState, EntityId, HistoryEntry, SLOTS_PER_ROW};
