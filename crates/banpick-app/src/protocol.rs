// Message types passed between the event loop, background tasks and the TUI.

use std::collections::HashMap;

use banpick_core::catalog::{Catalog, Role};
use banpick_core::draft::{EntityId, Phase, Team};
use banpick_core::recommend::{Analysis, ControllerScope};
use banpick_core::series::SeriesFormat;
use banpick_core::session::DraftSession;

// ---------------------------------------------------------------------------
// Front-end -> app
// ---------------------------------------------------------------------------

/// Commands from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Select an entity for the pending step. Resolved against the catalog
    /// by id or display name.
    Select(String),
    /// Select the top suggestion of the current analysis.
    AcceptSuggestion,
    Undo,
    ResetDraft,
    /// Commit the finished draft to the series and start the next game.
    NextGame,
    SetFormat(SeriesFormat),
    SetGame(u32),
    BackfillPick {
        game: u32,
        team: Team,
        entity: String,
    },
    RemovePick {
        game: u32,
        team: Team,
        entity: String,
    },
    SetFearless(bool),
    SetScope(ControllerScope),
    SetAutoApply(bool),
    SaveSeries,
    LoadSeries,
    ResetSeries,
    ReloadCatalog,
    /// Narrow the entity browser by name; empty clears.
    Search(String),
    /// Narrow the entity browser by role; `None` clears.
    RoleFilter(Option<Role>),
    Quit,
}

// ---------------------------------------------------------------------------
// Background tasks -> app
// ---------------------------------------------------------------------------

/// Result of a catalog load task, tagged with the load generation.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    Loaded { catalog: Catalog, generation: u64 },
    Failed { message: String, generation: u64 },
}

/// The automated controller's thinking delay elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerFire {
    /// State version the decision was made against.
    pub version: u64,
    pub entity_id: EntityId,
}

// ---------------------------------------------------------------------------
// App -> front-end
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogStatus {
    #[default]
    Loading,
    Ready {
        version: String,
        count: usize,
    },
    /// Loading failed; selections fall back to raw identifiers.
    Offline(String),
}

/// One row of the entity browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRow {
    pub id: EntityId,
    pub name: String,
    pub roles: Vec<Role>,
    /// False when the entity is used this game or in the fearless pool.
    pub available: bool,
}

/// A full render snapshot of the app state.
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    pub session: DraftSession,
    pub phase: Phase,
    pub scope: ControllerScope,
    pub auto_apply: bool,
    /// True while a controller decision is waiting on its thinking delay.
    pub controller_pending: bool,
    pub catalog_status: CatalogStatus,
    pub entities: Vec<EntityRow>,
    pub filter_term: String,
    pub role_filter: Option<Role>,
    pub analysis: Option<Analysis>,
    /// Display names for every known entity, keyed by id.
    pub names: HashMap<EntityId, String>,
}

impl AppSnapshot {
    /// Display name for `id`, or the id itself when unknown.
    pub fn name_of<'a>(&'a self, id: &'a EntityId) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id.as_str())
    }
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    StateSnapshot(Box<AppSnapshot>),
    /// A one-line message for the status area.
    Notice(String),
}
