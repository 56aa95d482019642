// Per-game draft state: slot rows, selection history, and the apply/undo
// transitions along the sequence table.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::sequence::{step_at, Action, DraftStep, Team, TOTAL_STEPS};

/// Slots per ban or pick row.
pub const SLOTS_PER_ROW: usize = 5;

type SlotRow = [Option<EntityId>; SLOTS_PER_ROW];

/// Stable identifier of a selectable entity (e.g. "Aatrox").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(s)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One applied selection, recorded for undo and for crash recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Cursor value at the time the selection was applied.
    pub cursor: usize,
    pub entity_id: EntityId,
    pub team: Team,
    pub action: Action,
}

/// The state of a single game's draft.
///
/// Transitions never mutate `self`; they return a new value. Slot rows are
/// reference-counted so rows untouched by a transition are shared between
/// the old and the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftState {
    cursor: usize,
    blue_bans: Arc<SlotRow>,
    red_bans: Arc<SlotRow>,
    blue_picks: Arc<SlotRow>,
    red_picks: Arc<SlotRow>,
    history: Vec<HistoryEntry>,
}

impl Default for DraftState {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftState {
    /// A fresh draft: every slot empty, cursor at 0.
    pub fn new() -> Self {
        DraftState {
            cursor: 0,
            blue_bans: Arc::new(Default::default()),
            red_bans: Arc::new(Default::default()),
            blue_picks: Arc::new(Default::default()),
            red_picks: Arc::new(Default::default()),
            history: Vec::new(),
        }
    }

    /// Discard everything and start over.
    pub fn reset() -> Self {
        Self::new()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == TOTAL_STEPS
    }

    /// The step waiting to be filled, or `None` once complete.
    pub fn current_step(&self) -> Option<DraftStep> {
        step_at(self.cursor)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The slot row for one side and action.
    pub fn row(&self, team: Team, action: Action) -> &[Option<EntityId>; SLOTS_PER_ROW] {
        match (team, action) {
            (Team::Blue, Action::Ban) => &*self.blue_bans,
            (Team::Red, Action::Ban) => &*self.red_bans,
            (Team::Blue, Action::Pick) => &*self.blue_picks,
            (Team::Red, Action::Pick) => &*self.red_picks,
        }
    }

    pub fn bans(&self, team: Team) -> &[Option<EntityId>; SLOTS_PER_ROW] {
        self.row(team, Action::Ban)
    }

    pub fn picks(&self, team: Team) -> &[Option<EntityId>; SLOTS_PER_ROW] {
        self.row(team, Action::Pick)
    }

    /// Filled picks for a side, in slot order.
    pub fn picked(&self, team: Team) -> Vec<EntityId> {
        self.picks(team).iter().flatten().cloned().collect()
    }

    fn row_mut(&mut self, team: Team, action: Action) -> &mut SlotRow {
        let row = match (team, action) {
            (Team::Blue, Action::Ban) => &mut self.blue_bans,
            (Team::Red, Action::Ban) => &mut self.red_bans,
            (Team::Blue, Action::Pick) => &mut self.blue_picks,
            (Team::Red, Action::Pick) => &mut self.red_picks,
        };
        Arc::make_mut(row)
    }

    fn rows(&self) -> [&SlotRow; 4] {
        [
            &*self.blue_bans,
            &*self.red_bans,
            &*self.blue_picks,
            &*self.red_picks,
        ]
    }

    /// Every entity consumed this game, derived from the slot rows.
    pub fn used_entities(&self) -> BTreeSet<EntityId> {
        self.rows()
            .into_iter()
            .flat_map(|row| row.iter().flatten().cloned())
            .collect()
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.rows()
            .into_iter()
            .any(|row| row.iter().flatten().any(|e| e.as_str() == id))
    }

    /// Fill the current step with `entity_id`.
    ///
    /// Returns an unchanged copy if the draft is complete or the entity has
    /// already been used this game.
    pub fn apply_selection(&self, entity_id: &EntityId) -> DraftState {
        self.apply_selection_excluding(entity_id, &BTreeSet::new())
    }

    /// Like [`apply_selection`](Self::apply_selection), but also ignores
    /// entities in `excluded` (the fearless pool when that mode is on).
    pub fn apply_selection_excluding(
        &self,
        entity_id: &EntityId,
        excluded: &BTreeSet<EntityId>,
    ) -> DraftState {
        let Some(step) = self.current_step() else {
            debug!("Ignoring selection of {}: draft complete", entity_id);
            return self.clone();
        };
        if self.is_used(entity_id.as_str()) {
            debug!("Ignoring selection of {}: already used this game", entity_id);
            return self.clone();
        }
        if excluded.contains(entity_id) {
            debug!("Ignoring selection of {}: excluded", entity_id);
            return self.clone();
        }

        let mut next = self.clone();
        next.row_mut(step.team, step.action)[step.slot] = Some(entity_id.clone());
        next.history.push(HistoryEntry {
            cursor: self.cursor,
            entity_id: entity_id.clone(),
            team: step.team,
            action: step.action,
        });
        next.cursor += 1;
        debug!("Step {}: {} -> {}", self.cursor, step, entity_id);
        next
    }

    /// Revert the most recent selection. No-op on an empty history.
    pub fn undo(&self) -> DraftState {
        let Some(last) = self.history.last() else {
            return self.clone();
        };
        let mut next = self.clone();
        next.history.pop();
        next.cursor = last.cursor;
        if let Some(step) = step_at(last.cursor) {
            next.row_mut(last.team, last.action)[step.slot] = None;
        }
        debug!("Undo step {}: {} {} {}", last.cursor, last.team, last.action, last.entity_id);
        next
    }

    /// Rebuild a state by re-applying a recorded history from scratch.
    ///
    /// Replay stops at the first entry that does not line up with the
    /// sequence table (wrong cursor, side or action, or a repeated entity).
    pub fn replay(entries: &[HistoryEntry]) -> DraftState {
        let mut state = DraftState::new();
        for entry in entries {
            let aligned = entry.cursor == state.cursor
                && state
                    .current_step()
                    .is_some_and(|s| s.team == entry.team && s.action == entry.action);
            let next = if aligned {
                state.apply_selection(&entry.entity_id)
            } else {
                state.clone()
            };
            if next.cursor == state.cursor {
                warn!(
                    "Stopping replay at cursor {}: entry {:?} does not match the draft order",
                    state.cursor, entry
                );
                break;
            }
            state = next;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn full_draft() -> DraftState {
        (0..TOTAL_STEPS).fold(DraftState::new(), |s, i| {
            s.apply_selection(&id(&format!("champ_{i}")))
        })
    }

    #[test]
    fn first_ban_fills_blue_slot_zero() {
        let state = DraftState::new().apply_selection(&id("X"));
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.bans(Team::Blue)[0], Some(id("X")));
        assert_eq!(state.used_entities(), BTreeSet::from([id("X")]));
        assert_eq!(state.history().len(), 1);
        assert_eq!(
            state.history()[0],
            HistoryEntry {
                cursor: 0,
                entity_id: id("X"),
                team: Team::Blue,
                action: Action::Ban,
            }
        );
    }

    #[test]
    fn apply_does_not_mutate_input() {
        let before = DraftState::new();
        let after = before.apply_selection(&id("X"));
        assert_eq!(before, DraftState::new());
        assert_ne!(before, after);
    }

    #[test]
    fn untouched_rows_are_shared() {
        let before = DraftState::new().apply_selection(&id("X"));
        let after = before.apply_selection(&id("Y"));
        // Step 1 writes red bans; blue rows must be the same allocation.
        assert!(Arc::ptr_eq(&before.blue_bans, &after.blue_bans));
        assert!(Arc::ptr_eq(&before.blue_picks, &after.blue_picks));
        assert!(!Arc::ptr_eq(&before.red_bans, &after.red_bans));
    }

    #[test]
    fn twenty_selections_complete_the_draft() {
        let state = full_draft();
        assert!(state.is_complete());
        assert!(state.current_step().is_none());
        assert_eq!(state.used_entities().len(), TOTAL_STEPS);
        for team in [Team::Blue, Team::Red] {
            for action in [Action::Ban, Action::Pick] {
                assert!(state.row(team, action).iter().all(Option::is_some));
            }
        }
        assert_eq!(state.picked(Team::Blue).len(), 5);
    }

    #[test]
    fn selecting_used_entity_is_noop() {
        let state = DraftState::new().apply_selection(&id("X"));
        let again = state.apply_selection(&id("X"));
        assert_eq!(state, again);
        assert_eq!(again.cursor(), 1);
    }

    #[test]
    fn selecting_after_complete_is_noop() {
        let state = full_draft();
        assert_eq!(state.apply_selection(&id("late")), state);
    }

    #[test]
    fn excluded_entity_is_noop() {
        let excluded = BTreeSet::from([id("Ahri")]);
        let state = DraftState::new().apply_selection_excluding(&id("Ahri"), &excluded);
        assert_eq!(state, DraftState::new());
        let state = state.apply_selection_excluding(&id("Zed"), &excluded);
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        assert_eq!(DraftState::new().undo(), DraftState::new());
    }

    #[test]
    fn undo_clears_the_right_slot() {
        // Steps 0..=7 leave red pick slot 0 as the last write.
        let state = (0..8).fold(DraftState::new(), |s, i| s.apply_selection(&id(&format!("c{i}"))));
        assert_eq!(state.picks(Team::Red)[0], Some(id("c7")));
        let undone = state.undo();
        assert_eq!(undone.picks(Team::Red)[0], None);
        assert_eq!(undone.cursor(), 7);
        assert!(!undone.is_used("c7"));
    }

    #[test]
    fn twenty_undos_return_to_initial_state() {
        let state = (0..TOTAL_STEPS).fold(full_draft(), |s, _| s.undo());
        assert_eq!(state, DraftState::new());
        assert!(state.used_entities().is_empty());
    }

    #[test]
    fn replay_rebuilds_state() {
        let original = full_draft();
        let restored = DraftState::replay(original.history());
        assert_eq!(restored, original);
    }

    #[test]
    fn replay_stops_at_misaligned_entry() {
        let original = DraftState::new().apply_selection(&id("A")).apply_selection(&id("B"));
        let mut entries = original.history().to_vec();
        entries.push(HistoryEntry {
            cursor: 5,
            entity_id: id("C"),
            team: Team::Red,
            action: Action::Pick,
        });
        let restored = DraftState::replay(&entries);
        assert_eq!(restored, original);
    }

    proptest! {
        #[test]
        fn undo_inverts_apply(prefix in 0usize..TOTAL_STEPS, pick in "[a-z]{1,8}") {
            let state = (0..prefix).fold(DraftState::new(), |s, i| {
                s.apply_selection(&id(&format!("PREFIX{i}")))
            });
            let applied = state.apply_selection(&id(&pick));
            prop_assert_eq!(applied.cursor(), state.cursor() + 1);
            prop_assert_eq!(applied.undo(), state);
        }

        #[test]
        fn counts_stay_in_lockstep(ids in prop::collection::vec("[a-e]", 0..40)) {
            let state = ids.iter().fold(DraftState::new(), |s, e| s.apply_selection(&id(e)));
            prop_assert_eq!(state.used_entities().len(), state.cursor());
            prop_assert_eq!(state.history().len(), state.cursor());
        }
    }
}
