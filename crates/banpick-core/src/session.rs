// A single draft session: the live game's draft, the surrounding series,
// and whether fearless exclusions apply.

use std::collections::BTreeSet;

use tracing::info;

use crate::draft::{DraftState, EntityId, HistoryEntry, Team};
use crate::series::{GameRecord, SeriesFormat, SeriesState};

/// Value type tying the current game's draft to its series.
///
/// Like its parts, every operation returns a new session and leaves `self`
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftSession {
    pub draft: DraftState,
    pub series: SeriesState,
    pub fearless: bool,
}

impl DraftSession {
    pub fn new(format: SeriesFormat, fearless: bool) -> Self {
        DraftSession {
            draft: DraftState::new(),
            series: SeriesState::new(format),
            fearless,
        }
    }

    /// Entities that cannot be selected right now: those used this game, plus
    /// the fearless pool when fearless mode is on.
    pub fn effective_exclusions(&self) -> BTreeSet<EntityId> {
        let mut excluded = self.draft.used_entities();
        if self.fearless {
            excluded.extend(self.series.fearless_pool().iter().cloned());
        }
        excluded
    }

    pub fn is_available(&self, id: &str) -> bool {
        !(self.draft.is_used(id) || (self.fearless && self.series.fearless_pool().contains(id)))
    }

    /// Apply a selection, honoring the fearless pool when enabled.
    pub fn select(&self, entity_id: &EntityId) -> DraftSession {
        let excluded = if self.fearless {
            self.series.fearless_pool().clone()
        } else {
            BTreeSet::new()
        };
        DraftSession {
            draft: self.draft.apply_selection_excluding(entity_id, &excluded),
            ..self.clone()
        }
    }

    pub fn undo(&self) -> DraftSession {
        DraftSession {
            draft: self.draft.undo(),
            ..self.clone()
        }
    }

    pub fn reset_draft(&self) -> DraftSession {
        DraftSession {
            draft: DraftState::reset(),
            ..self.clone()
        }
    }

    /// Commit a completed draft's picks as the current game's record, move
    /// to the next game when one remains, and start a fresh draft.
    ///
    /// Ignored while the draft is still in progress.
    pub fn finish_game(&self) -> DraftSession {
        if !self.draft.is_complete() {
            return self.clone();
        }
        let game = self.series.current_game();
        let series = self.series.commit_game(
            game,
            self.draft.picked(Team::Blue),
            self.draft.picked(Team::Red),
        );
        let series = if game < series.max_games() {
            series.set_current_game(game + 1)
        } else {
            series
        };
        info!("Game {} finished, series now at game {}", game, series.current_game());
        DraftSession {
            draft: DraftState::new(),
            series,
            fearless: self.fearless,
        }
    }

    pub fn set_fearless(&self, enabled: bool) -> DraftSession {
        DraftSession {
            fearless: enabled,
            ..self.clone()
        }
    }

    pub fn set_format(&self, format: SeriesFormat) -> DraftSession {
        DraftSession {
            series: self.series.set_format(format),
            ..self.clone()
        }
    }

    pub fn set_current_game(&self, game_number: u32) -> DraftSession {
        DraftSession {
            series: self.series.set_current_game(game_number),
            ..self.clone()
        }
    }

    pub fn backfill_pick(
        &self,
        game_number: u32,
        team: Team,
        entity_id: &EntityId,
    ) -> DraftSession {
        DraftSession {
            series: self.series.backfill_pick(game_number, team, entity_id),
            ..self.clone()
        }
    }

    pub fn remove_pick(&self, game_number: u32, team: Team, entity_id: &EntityId) -> DraftSession {
        DraftSession {
            series: self.series.remove_pick(game_number, team, entity_id),
            ..self.clone()
        }
    }

    pub fn reset_series(&self) -> DraftSession {
        DraftSession {
            series: self.series.reset(),
            ..self.clone()
        }
    }

    pub fn replace_series(&self, series: SeriesState) -> DraftSession {
        DraftSession {
            series,
            ..self.clone()
        }
    }

    /// Rewrite every entity id through `canonical`, replaying the draft and
    /// re-deriving the pool from the rewritten records.
    ///
    /// Ids typed while no catalog was loaded are folded onto the catalog's
    /// spelling this way. A draft entry that collapses onto an id already
    /// used this game ends the replay there.
    pub fn map_ids(&self, canonical: impl Fn(&EntityId) -> EntityId) -> DraftSession {
        let history: Vec<HistoryEntry> = self
            .draft
            .history()
            .iter()
            .map(|e| HistoryEntry {
                entity_id: canonical(&e.entity_id),
                ..e.clone()
            })
            .collect();
        let records = self
            .series
            .records()
            .iter()
            .map(|r| GameRecord {
                game_number: r.game_number,
                blue_picks: r.blue_picks.iter().map(&canonical).collect(),
                red_picks: r.red_picks.iter().map(&canonical).collect(),
            })
            .collect();
        let series = SeriesState::from_parts(
            self.series.format(),
            self.series.current_game(),
            records,
        )
        .unwrap_or_else(|| self.series.clone());

        DraftSession {
            draft: DraftState::replay(&history),
            series,
            fearless: self.fearless,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::TOTAL_STEPS;

    fn id(s: &str) -> EntityId {
        EntityId::from(s)
    }

    fn drafted(session: DraftSession, prefix: &str) -> DraftSession {
        (0..TOTAL_STEPS).fold(session, |s, i| s.select(&id(&format!("{prefix}{i}"))))
    }

    #[test]
    fn fearless_pool_blocks_selection_only_when_enabled() {
        let series = SeriesState::new(SeriesFormat::Bo3).commit_game(1, vec![id("Ahri")], vec![]);
        let on = DraftSession::new(SeriesFormat::Bo3, true).replace_series(series.clone());
        let off = on.set_fearless(false);

        assert_eq!(on.select(&id("Ahri")).draft.cursor(), 0);
        assert!(!on.is_available("Ahri"));
        assert!(on.effective_exclusions().contains("Ahri"));

        assert_eq!(off.select(&id("Ahri")).draft.cursor(), 1);
        assert!(off.is_available("Ahri"));
        assert!(!off.effective_exclusions().contains("Ahri"));
    }

    #[test]
    fn effective_exclusions_include_used_entities() {
        let s = DraftSession::new(SeriesFormat::Bo3, true).select(&id("Zed"));
        assert!(s.effective_exclusions().contains("Zed"));
        assert!(!s.is_available("Zed"));
    }

    #[test]
    fn finish_game_commits_and_advances() {
        let s = drafted(DraftSession::new(SeriesFormat::Bo3, true), "g1_");
        let blue = s.draft.picked(Team::Blue);
        let s = s.finish_game();

        assert_eq!(s.series.current_game(), 2);
        assert_eq!(s.draft, DraftState::new());
        assert_eq!(s.series.record(1).unwrap().blue_picks, blue);
        assert_eq!(s.series.fearless_pool().len(), 10);
        // Bans do not enter the pool.
        assert!(!s.series.fearless_pool().contains("g1_0"));
        // Picks of game 1 are now blocked.
        assert_eq!(s.select(&blue[0]).draft.cursor(), 0);
    }

    #[test]
    fn finish_game_ignored_while_in_progress() {
        let s = DraftSession::new(SeriesFormat::Bo3, true).select(&id("A"));
        assert_eq!(s.finish_game(), s);
    }

    #[test]
    fn finish_last_game_stays_on_it() {
        let s = drafted(DraftSession::new(SeriesFormat::Bo1, true), "x").finish_game();
        assert_eq!(s.series.current_game(), 1);
        assert_eq!(s.series.records().len(), 1);
    }

    #[test]
    fn format_change_discards_series_but_keeps_draft() {
        let s = drafted(DraftSession::new(SeriesFormat::Bo5, true), "a")
            .finish_game()
            .select(&id("q"));
        let s = s.set_format(SeriesFormat::Bo3);
        assert_eq!(s.series, SeriesState::new(SeriesFormat::Bo3));
        assert_eq!(s.draft.cursor(), 1);
    }

    #[test]
    fn map_ids_folds_spellings_onto_one_id() {
        let canonical = |e: &EntityId| match e.as_str().to_lowercase().as_str() {
            "ahri" => id("Ahri"),
            "zed" => id("Zed"),
            _ => e.clone(),
        };
        let s = DraftSession::new(SeriesFormat::Bo3, true)
            .backfill_pick(1, Team::Blue, &id("ahri"))
            .select(&id("zed"))
            .select(&id("Lux"));

        let mapped = s.map_ids(canonical);
        assert_eq!(mapped.draft.cursor(), 2);
        assert_eq!(mapped.draft.bans(Team::Blue)[0], Some(id("Zed")));
        assert!(mapped.draft.is_used("Lux"));
        assert!(!mapped.draft.is_used("zed"));
        assert!(mapped.series.fearless_pool().contains("Ahri"));
        assert!(!mapped.series.fearless_pool().contains("ahri"));
        // The catalog spelling is now locked by the pool.
        assert!(!mapped.is_available("Ahri"));
        assert_eq!(mapped.select(&id("Zed")), mapped);
    }

    #[test]
    fn map_ids_identity_keeps_session() {
        let s = drafted(DraftSession::new(SeriesFormat::Bo3, true), "m")
            .finish_game()
            .select(&id("q"));
        assert_eq!(s.map_ids(|e| e.clone()), s);
    }
}
