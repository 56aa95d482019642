// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI,
// catalog load results and automated controller decisions. Owns the draft
// session, persists it after every transition and pushes snapshots to the
// TUI render loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use banpick_core::catalog::{CachedCatalog, Catalog, CatalogSource, Role};
use banpick_core::config::Config;
use banpick_core::db::{Database, PersistError};
use banpick_core::draft::{phase_at, DraftState, EntityId, Team};
use banpick_core::recommend::{Analysis, Recommender};
use banpick_core::session::DraftSession;

use crate::controller::Controller;
use crate::protocol::{
    AppSnapshot, CatalogEvent, CatalogStatus, ControllerFire, EntityRow, UiUpdate, UserCommand,
};

/// Catalog source shared with the background load task.
pub type SharedCatalog = Arc<CachedCatalog<Arc<dyn CatalogSource>>>;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub session: DraftSession,
    pub db: Database,
    /// Identifies the autosaved draft so a restart resumes the same one.
    pub draft_id: String,
    /// Bumped on every state transition. Controller decisions carry the
    /// version they were made against and are dropped once it moves on.
    pub version: u64,
    pub catalog: Option<Catalog>,
    pub catalog_status: CatalogStatus,
    pub catalog_source: SharedCatalog,
    pub catalog_task: Option<JoinHandle<()>>,
    /// Incremented per catalog load so results of an aborted load that were
    /// already queued are ignored.
    pub catalog_generation: u64,
    pub catalog_tx: mpsc::Sender<CatalogEvent>,
    pub controller: Controller,
    pub recommender: Box<dyn Recommender + Sync>,
    pub analysis: Option<Analysis>,
    pub filter_term: String,
    pub role_filter: Option<Role>,
    /// Locale used for display names.
    pub locale: String,
}

impl AppState {
    /// Create the application state with a fresh session built from config.
    pub fn new(
        config: Config,
        db: Database,
        draft_id: String,
        source: Arc<dyn CatalogSource>,
        recommender: Box<dyn Recommender + Sync>,
        catalog_tx: mpsc::Sender<CatalogEvent>,
        controller_tx: mpsc::Sender<ControllerFire>,
    ) -> Self {
        let session = DraftSession::new(config.series.default_format, config.series.fearless);
        let controller = Controller::new(&config.controller, controller_tx);
        let locale = config.catalog.display_locale().to_string();

        AppState {
            config,
            session,
            db,
            draft_id,
            version: 0,
            catalog: None,
            catalog_status: CatalogStatus::Loading,
            catalog_source: Arc::new(CachedCatalog::new(source)),
            catalog_task: None,
            catalog_generation: 0,
            catalog_tx,
            controller,
            recommender,
            analysis: None,
            filter_term: String::new(),
            role_filter: None,
            locale,
        }
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Start (or restart) loading the newest catalog in the background.
    pub fn start_catalog_load(&mut self) {
        if let Some(handle) = self.catalog_task.take() {
            handle.abort();
        }
        self.catalog_generation += 1;
        let generation = self.catalog_generation;
        self.catalog_status = CatalogStatus::Loading;

        let cached = Arc::clone(&self.catalog_source);
        let tx = self.catalog_tx.clone();
        self.catalog_task = Some(tokio::spawn(async move {
            let event = match cached.latest().await {
                Ok(catalog) => CatalogEvent::Loaded {
                    catalog,
                    generation,
                },
                Err(e) => CatalogEvent::Failed {
                    message: e.to_string(),
                    generation,
                },
            };
            let _ = tx.send(event).await;
        }));
        info!("Catalog load started (gen: {})", generation);
    }

    /// Apply a catalog load result. Returns false for stale results.
    pub fn handle_catalog_event(&mut self, event: CatalogEvent) -> bool {
        let generation = match &event {
            CatalogEvent::Loaded { generation, .. } | CatalogEvent::Failed { generation, .. } => {
                *generation
            }
        };
        if generation != self.catalog_generation {
            debug!(
                "Discarding stale catalog event (event gen: {}, current gen: {})",
                generation, self.catalog_generation
            );
            return false;
        }
        self.catalog_task = None;

        match event {
            CatalogEvent::Loaded { catalog, .. } => {
                info!(
                    "Catalog {} ready with {} entities",
                    catalog.version(),
                    catalog.len()
                );
                self.catalog_status = CatalogStatus::Ready {
                    version: catalog.version().to_string(),
                    count: catalog.len(),
                };
                // Ids typed offline take the catalog's spelling.
                let canonical = self.session.map_ids(|id| {
                    catalog
                        .resolve(id.as_str())
                        .map_or_else(|| id.clone(), |e| e.id.clone())
                });
                if canonical != self.session {
                    info!("Resolved offline ids against catalog {}", catalog.version());
                    self.session = canonical;
                    if let Err(e) = self.autosave() {
                        warn!("Autosave failed: {:#}", e);
                    }
                }
                self.catalog = Some(catalog);
            }
            CatalogEvent::Failed { message, .. } => {
                warn!("Catalog load failed: {}", message);
                self.catalog_status = CatalogStatus::Offline(message);
            }
        }
        self.transition();
        true
    }

    /// Map user input to an entity id. With a catalog loaded the input must
    /// match an id or display name; offline, the input is taken as the id.
    pub fn resolve(&self, input: &str) -> Option<EntityId> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        match &self.catalog {
            Some(catalog) => catalog.resolve(input).map(|e| e.id.clone()),
            None => Some(EntityId::from(input)),
        }
    }

    pub fn display_name<'a>(&'a self, id: &'a EntityId) -> &'a str {
        self.catalog
            .as_ref()
            .and_then(|c| c.get(id.as_str()))
            .map(|e| e.name(&self.locale))
            .unwrap_or(id.as_str())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Replace the session. Returns false, and changes nothing, when `next`
    /// equals the current session.
    pub fn apply_session(&mut self, next: DraftSession) -> bool {
        if next == self.session {
            return false;
        }
        self.session = next;
        if let Err(e) = self.autosave() {
            warn!("Autosave failed: {:#}", e);
        }
        self.transition();
        true
    }

    /// Start a new decision cycle: bump the version, drop any pending
    /// controller decision and recompute the analysis.
    pub fn transition(&mut self) {
        self.version += 1;
        self.controller.cancel();
        self.refresh_decision();
    }

    /// Recompute the analysis for the pending step and, when the controller
    /// covers the acting side, schedule its top suggestion.
    fn refresh_decision(&mut self) {
        self.analysis = None;
        let (Some(catalog), Some(step)) = (&self.catalog, self.session.draft.current_step())
        else {
            return;
        };
        let excluded = self.session.effective_exclusions();
        let available = catalog.available(&excluded);
        let analysis =
            self.recommender
                .recommend(&self.session.draft, &available, step.action, step.team);

        if self.controller.acts_for(step.team) {
            if let Some(top) = analysis.top() {
                self.controller.schedule(self.version, top.entity_id.clone());
            }
        }
        self.analysis = Some(analysis);
    }

    /// Persist the in-progress draft, the series and the fearless toggle.
    pub fn autosave(&self) -> anyhow::Result<()> {
        self.db.set_draft_id(&self.draft_id)?;
        self.db
            .save_draft_history(&self.draft_id, self.session.draft.history())?;
        self.db
            .save_series(Database::AUTOSAVE_SERIES_KEY, &self.session.series)?;
        self.db.save_state(
            Database::AUTOSAVE_FEARLESS_KEY,
            &serde_json::Value::Bool(self.session.fearless),
        )?;
        Ok(())
    }

    /// Select `id` for the pending step, explaining a refusal.
    fn select(&mut self, id: &EntityId) -> Result<(), String> {
        let name = self.display_name(id).to_string();
        if self.session.draft.is_complete() {
            return Err("Draft complete; use `next` to start the next game".into());
        }
        if self.session.draft.is_used(id.as_str()) {
            return Err(format!("{name} was already picked or banned this game"));
        }
        if !self.session.is_available(id.as_str()) {
            return Err(format!("{name} is locked by the fearless pool"));
        }
        let step = self.session.draft.current_step();
        let next = self.session.select(id);
        if self.apply_session(next) {
            if let Some(step) = step {
                info!("{} {}: {}", step.team, step.action, id);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    pub fn build_snapshot(&self) -> AppSnapshot {
        let (entities, names) = match &self.catalog {
            Some(catalog) => {
                let entities = catalog
                    .filter(&self.filter_term, self.role_filter)
                    .into_iter()
                    .map(|e| EntityRow {
                        id: e.id.clone(),
                        name: e.name(&self.locale).to_string(),
                        roles: e.roles.iter().copied().collect(),
                        available: self.session.is_available(e.id.as_str()),
                    })
                    .collect();
                let names = catalog
                    .entities()
                    .iter()
                    .map(|e| (e.id.clone(), e.name(&self.locale).to_string()))
                    .collect();
                (entities, names)
            }
            None => (Vec::new(), HashMap::new()),
        };

        AppSnapshot {
            session: self.session.clone(),
            phase: phase_at(self.session.draft.cursor()),
            scope: self.controller.scope,
            auto_apply: self.controller.auto_apply,
            controller_pending: self.controller.is_pending(),
            catalog_status: self.catalog_status.clone(),
            entities,
            filter_term: self.filter_term.clone(),
            role_filter: self.role_filter,
            analysis: self.analysis.clone(),
            names,
        }
    }

    /// Stop background work before shutdown.
    pub fn shutdown(&mut self) {
        self.controller.cancel();
        if let Some(handle) = self.catalog_task.take() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on three channels using `tokio::select!`:
/// 1. User commands from the TUI
/// 2. Catalog load results
/// 3. Controller decisions whose thinking delay elapsed
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut catalog_rx: mpsc::Receiver<CatalogEvent>,
    mut controller_rx: mpsc::Receiver<ControllerFire>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut catalog_open = true;
    let mut controller_open = true;

    state.start_catalog_load();
    send_snapshot(&state, &ui_tx).await;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Catalog results ---
            event = catalog_rx.recv(), if catalog_open => {
                match event {
                    Some(event) => {
                        let failed = match &event {
                            CatalogEvent::Failed { message, .. } => Some(message.clone()),
                            CatalogEvent::Loaded { .. } => None,
                        };
                        if state.handle_catalog_event(event) {
                            if let Some(message) = failed {
                                let text = format!("Catalog unavailable, using raw ids: {message}");
                                notice(&ui_tx, text).await;
                            }
                            send_snapshot(&state, &ui_tx).await;
                        }
                    }
                    None => {
                        info!("Catalog channel closed");
                        catalog_open = false;
                    }
                }
            }

            // --- Controller decisions ---
            fire = controller_rx.recv(), if controller_open => {
                match fire {
                    Some(fire) => handle_controller_fire(&mut state, fire, &ui_tx).await,
                    None => {
                        info!("Controller channel closed");
                        controller_open = false;
                    }
                }
            }
        }
    }

    state.shutdown();
    if let Err(e) = state.autosave() {
        warn!("Final autosave failed: {:#}", e);
    }
    info!("Application event loop exiting");
    Ok(())
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::StateSnapshot(Box::new(state.build_snapshot())))
        .await;
}

async fn notice(ui_tx: &mpsc::Sender<UiUpdate>, message: impl Into<String>) {
    let _ = ui_tx.send(UiUpdate::Notice(message.into())).await;
}

/// Apply a controller decision if it still matches the current state.
async fn handle_controller_fire(
    state: &mut AppState,
    fire: ControllerFire,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if fire.version != state.version {
        debug!(
            "Discarding stale controller decision (decision version: {}, current: {})",
            fire.version, state.version
        );
        return;
    }
    let Some(step) = state.session.draft.current_step() else {
        return;
    };
    if !state.controller.acts_for(step.team) {
        return;
    }
    match state.select(&fire.entity_id) {
        Ok(()) => {
            let name = state.display_name(&fire.entity_id).to_string();
            notice(ui_tx, format!("Controller: {} {} {}", step.team, step.action, name)).await;
        }
        Err(reason) => warn!("Controller decision rejected: {}", reason),
    }
    send_snapshot(state, ui_tx).await;
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Select(input) => match state.resolve(&input) {
            Some(id) => {
                if let Err(reason) = state.select(&id) {
                    notice(ui_tx, reason).await;
                }
            }
            None => notice(ui_tx, format!("Unknown champion: {}", input.trim())).await,
        },
        UserCommand::AcceptSuggestion => {
            match state.analysis.as_ref().and_then(|a| a.top()).map(|s| s.entity_id.clone()) {
                Some(id) => {
                    if let Err(reason) = state.select(&id) {
                        notice(ui_tx, reason).await;
                    }
                }
                None => notice(ui_tx, "No suggestion available").await,
            }
        }
        UserCommand::Undo => {
            let next = state.session.undo();
            if !state.apply_session(next) {
                notice(ui_tx, "Nothing to undo").await;
            }
        }
        UserCommand::ResetDraft => {
            let next = state.session.reset_draft();
            state.apply_session(next);
        }
        UserCommand::NextGame => {
            if !state.session.draft.is_complete() {
                notice(ui_tx, "Finish the current draft first").await;
            } else {
                let game = state.session.series.current_game();
                let next = state.session.finish_game();
                state.apply_session(next);
                notice(ui_tx, format!("Game {game} recorded")).await;
            }
        }
        UserCommand::SetFormat(format) => {
            let next = state.session.set_format(format);
            state.apply_session(next);
            notice(ui_tx, format!("Series reset to {format}")).await;
        }
        UserCommand::SetGame(game) => {
            let max = state.session.series.max_games();
            if game == 0 || game > max {
                notice(ui_tx, format!("Game must be between 1 and {max}")).await;
            } else {
                let next = state.session.set_current_game(game);
                state.apply_session(next);
            }
        }
        UserCommand::BackfillPick { game, team, entity } => {
            let Some(id) = state.resolve(&entity) else {
                notice(ui_tx, format!("Unknown champion: {entity}")).await;
                send_snapshot(state, ui_tx).await;
                return;
            };
            let next = state.session.backfill_pick(game, team, &id);
            if !state.apply_session(next) {
                notice(ui_tx, backfill_refusal(&state.session, game, team, &id)).await;
            }
        }
        UserCommand::RemovePick { game, team, entity } => {
            let Some(id) = state.resolve(&entity) else {
                notice(ui_tx, format!("Unknown champion: {entity}")).await;
                send_snapshot(state, ui_tx).await;
                return;
            };
            let next = state.session.remove_pick(game, team, &id);
            if !state.apply_session(next) {
                notice(ui_tx, format!("Game {game} has no {team} pick {id}")).await;
            }
        }
        UserCommand::SetFearless(enabled) => {
            let next = state.session.set_fearless(enabled);
            state.apply_session(next);
        }
        UserCommand::SetScope(scope) => {
            info!("Controller scope set to {}", scope);
            state.controller.scope = scope;
            state.transition();
        }
        UserCommand::SetAutoApply(enabled) => {
            info!("Controller auto-apply set to {}", enabled);
            state.controller.auto_apply = enabled;
            state.transition();
        }
        UserCommand::SaveSeries => {
            let key = state.config.database.series_key.clone();
            match state.db.save_series(&key, &state.session.series) {
                Ok(()) => match saved_time(state, &key) {
                    Some(at) => notice(ui_tx, format!("Series saved at {at}")).await,
                    None => notice(ui_tx, "Series saved").await,
                },
                Err(e) => {
                    warn!("Saving series failed: {:#}", e);
                    notice(ui_tx, format!("Save failed: {e}")).await;
                }
            }
        }
        UserCommand::LoadSeries => {
            let key = state.config.database.series_key.clone();
            match state.db.load_series(&key) {
                Ok(series) => {
                    let next = state.session.replace_series(series);
                    state.apply_session(next);
                    match saved_time(state, &key) {
                        Some(at) => notice(ui_tx, format!("Series loaded (saved {at})")).await,
                        None => notice(ui_tx, "Series loaded").await,
                    }
                }
                Err(PersistError::NoSavedData { .. }) => {
                    notice(ui_tx, "No saved series").await;
                }
                Err(e) => {
                    warn!("Loading series failed: {}", e);
                    notice(ui_tx, format!("Load failed: {e}")).await;
                }
            }
        }
        UserCommand::ResetSeries => {
            let next = state.session.reset_series();
            state.apply_session(next);
        }
        UserCommand::ReloadCatalog => {
            state.start_catalog_load();
        }
        UserCommand::Search(term) => {
            state.filter_term = term;
        }
        UserCommand::RoleFilter(role) => {
            state.role_filter = role;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
    send_snapshot(state, ui_tx).await;
}

/// When the series under `key` was saved, e.g. `2026-03-01 18:04 UTC`.
fn saved_time(state: &AppState, key: &str) -> Option<String> {
    match state.db.series_saved_at(key) {
        Ok(at) => at.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
        Err(e) => {
            warn!("Reading save time failed: {:#}", e);
            None
        }
    }
}

/// Explain why a backfill was refused.
fn backfill_refusal(session: &DraftSession, game: u32, team: Team, id: &EntityId) -> String {
    let series = &session.series;
    if game == 0 || game > series.max_games() {
        format!("Game must be between 1 and {}", series.max_games())
    } else if series.fearless_pool().contains(id) {
        format!("{id} is already in the fearless pool")
    } else {
        format!("Game {game} {team} already has five picks")
    }
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

/// Restore the autosaved session after a crash or restart.
///
/// Replays the stored selection history of `state.draft_id` and restores the
/// autosaved series and fearless toggle. Returns whether anything was
/// restored.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    let history = state.db.load_draft_history(&state.draft_id)?;
    let series = match state.db.load_series(Database::AUTOSAVE_SERIES_KEY) {
        Ok(series) => Some(series),
        Err(PersistError::NoSavedData { .. }) => None,
        Err(e @ PersistError::Corrupt { .. }) => {
            warn!("Ignoring autosaved series: {}", e);
            None
        }
        Err(e @ PersistError::Storage { .. }) => return Err(e.into()),
    };
    let fearless = state
        .db
        .load_state(Database::AUTOSAVE_FEARLESS_KEY)?
        .and_then(|v| v.as_bool());

    if history.is_empty() && series.is_none() {
        info!("No autosave for draft_id={}, starting fresh", state.draft_id);
        return Ok(false);
    }

    let mut session = state.session.clone();
    if let Some(series) = series {
        session = session.replace_series(series);
    }
    if let Some(fearless) = fearless {
        session = session.set_fearless(fearless);
    }
    session.draft = DraftState::replay(&history);

    info!(
        "Crash recovery: restored {} of {} selections, game {}/{}",
        session.draft.cursor(),
        history.len(),
        session.series.current_game(),
        session.series.max_games()
    );
    state.session = session;
    state.version += 1;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
