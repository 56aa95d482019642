// Best-of-N series tracking and the fearless exclusion pool.
//
// Every entity picked in any recorded game of the series lands in the
// fearless pool and may not be selected again. The pool is always rebuilt
// from the game records after a mutation; it is never edited directly.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::draft::{EntityId, Team, SLOTS_PER_ROW};

/// Series length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFormat {
    Bo1,
    Bo3,
    Bo5,
}

impl SeriesFormat {
    pub fn max_games(&self) -> u32 {
        match self {
            SeriesFormat::Bo1 => 1,
            SeriesFormat::Bo3 => 3,
            SeriesFormat::Bo5 => 5,
        }
    }

    pub fn from_str_format(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bo1" => Some(SeriesFormat::Bo1),
            "bo3" => Some(SeriesFormat::Bo3),
            "bo5" => Some(SeriesFormat::Bo5),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            SeriesFormat::Bo1 => "BO1",
            SeriesFormat::Bo3 => "BO3",
            SeriesFormat::Bo5 => "BO5",
        }
    }
}

impl fmt::Display for SeriesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// The picks of one finished (or manually reconstructed) game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_number: u32,
    pub blue_picks: Vec<EntityId>,
    pub red_picks: Vec<EntityId>,
}

impl GameRecord {
    pub fn new(game_number: u32) -> Self {
        GameRecord {
            game_number,
            blue_picks: Vec::new(),
            red_picks: Vec::new(),
        }
    }

    pub fn picks(&self, team: Team) -> &[EntityId] {
        match team {
            Team::Blue => &self.blue_picks,
            Team::Red => &self.red_picks,
        }
    }

    fn picks_mut(&mut self, team: Team) -> &mut Vec<EntityId> {
        match team {
            Team::Blue => &mut self.blue_picks,
            Team::Red => &mut self.red_picks,
        }
    }
}

/// State of a best-of-N series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesState {
    format: SeriesFormat,
    current_game: u32,
    records: Vec<GameRecord>,
    fearless_pool: BTreeSet<EntityId>,
}

impl Default for SeriesState {
    fn default() -> Self {
        Self::new(SeriesFormat::Bo3)
    }
}

impl SeriesState {
    /// A fresh series at game 1 with no records.
    pub fn new(format: SeriesFormat) -> Self {
        SeriesState {
            format,
            current_game: 1,
            records: Vec::new(),
            fearless_pool: BTreeSet::new(),
        }
    }

    /// Rebuild a series from persisted parts. Records are re-sorted by game
    /// number and the pool is derived from them. Returns `None` when the
    /// parts violate the series invariants.
    pub fn from_parts(
        format: SeriesFormat,
        current_game: u32,
        mut records: Vec<GameRecord>,
    ) -> Option<Self> {
        let max = format.max_games();
        if current_game == 0 || current_game > max {
            return None;
        }
        records.sort_by_key(|r| r.game_number);
        let numbers_ok = records.iter().all(|r| (1..=max).contains(&r.game_number))
            && records.windows(2).all(|w| w[0].game_number != w[1].game_number);
        let sizes_ok = records
            .iter()
            .all(|r| r.blue_picks.len() <= SLOTS_PER_ROW && r.red_picks.len() <= SLOTS_PER_ROW);
        if !numbers_ok || !sizes_ok {
            return None;
        }
        let mut series = SeriesState {
            format,
            current_game,
            records,
            fearless_pool: BTreeSet::new(),
        };
        series.recompute_pool();
        Some(series)
    }

    pub fn format(&self) -> SeriesFormat {
        self.format
    }

    pub fn current_game(&self) -> u32 {
        self.current_game
    }

    pub fn max_games(&self) -> u32 {
        self.format.max_games()
    }

    /// Game records ordered by game number.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn record(&self, game_number: u32) -> Option<&GameRecord> {
        self.records.iter().find(|r| r.game_number == game_number)
    }

    pub fn fearless_pool(&self) -> &BTreeSet<EntityId> {
        &self.fearless_pool
    }

    fn in_range(&self, game_number: u32) -> bool {
        (1..=self.max_games()).contains(&game_number)
    }

    fn recompute_pool(&mut self) {
        self.fearless_pool = self
            .records
            .iter()
            .flat_map(|r| r.blue_picks.iter().chain(r.red_picks.iter()).cloned())
            .collect();
    }

    fn record_mut_or_insert(&mut self, game_number: u32) -> &mut GameRecord {
        let idx = match self
            .records
            .binary_search_by_key(&game_number, |r| r.game_number)
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.records.insert(idx, GameRecord::new(game_number));
                idx
            }
        };
        &mut self.records[idx]
    }

    /// Store the picks of `game_number`, replacing any earlier record for the
    /// same game. Ignored when the game number is out of range or a side
    /// carries more than five picks.
    pub fn commit_game(
        &self,
        game_number: u32,
        blue_picks: Vec<EntityId>,
        red_picks: Vec<EntityId>,
    ) -> SeriesState {
        if !self.in_range(game_number)
            || blue_picks.len() > SLOTS_PER_ROW
            || red_picks.len() > SLOTS_PER_ROW
        {
            debug!("Ignoring commit for game {}", game_number);
            return self.clone();
        }
        let mut next = self.clone();
        let record = next.record_mut_or_insert(game_number);
        record.blue_picks = blue_picks;
        record.red_picks = red_picks;
        next.recompute_pool();
        info!(
            "Committed game {} ({} entities in fearless pool)",
            game_number,
            next.fearless_pool.len()
        );
        next
    }

    /// Remove one occurrence of `entity_id` from a side's picks in a record.
    pub fn remove_pick(&self, game_number: u32, team: Team, entity_id: &EntityId) -> SeriesState {
        let Some(idx) = self.records.iter().position(|r| r.game_number == game_number) else {
            return self.clone();
        };
        let Some(pos) = self.records[idx].picks(team).iter().position(|e| e == entity_id) else {
            return self.clone();
        };
        let mut next = self.clone();
        next.records[idx].picks_mut(team).remove(pos);
        next.recompute_pool();
        debug!("Removed {} from game {} ({})", entity_id, game_number, team);
        next
    }

    /// Manually add a pick to a game played outside the tool.
    ///
    /// Ignored when the entity is already in the fearless pool, the side
    /// already has five picks, or the game number is out of range. Creates
    /// the record when the game has none yet.
    pub fn backfill_pick(&self, game_number: u32, team: Team, entity_id: &EntityId) -> SeriesState {
        if !self.in_range(game_number) || self.fearless_pool.contains(entity_id) {
            debug!("Ignoring backfill of {} into game {}", entity_id, game_number);
            return self.clone();
        }
        let full = self
            .record(game_number)
            .is_some_and(|r| r.picks(team).len() >= SLOTS_PER_ROW);
        if full {
            debug!("Ignoring backfill of {}: game {} {} picks full", entity_id, game_number, team);
            return self.clone();
        }
        let mut next = self.clone();
        next.record_mut_or_insert(game_number)
            .picks_mut(team)
            .push(entity_id.clone());
        next.recompute_pool();
        next
    }

    /// Switch format. Always discards series progress, even when the format
    /// is unchanged.
    pub fn set_format(&self, format: SeriesFormat) -> SeriesState {
        info!("Series format set to {}, progress cleared", format);
        SeriesState::new(format)
    }

    /// Move to another game of the series. Ignored when out of range.
    pub fn set_current_game(&self, game_number: u32) -> SeriesState {
        if !self.in_range(game_number) {
            return self.clone();
        }
        SeriesState {
            current_game: game_number,
            ..self.clone()
        }
    }

    /// Clear progress, keeping the format.
    pub fn reset(&self) -> SeriesState {
        SeriesState::new(self.format)
    }
}
