// Integration tests for the ban/pick board.
//
// These drive the application event loop through its channels, the same way
// the TUI does, with an in-memory catalog source standing in for the CDN.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use banpick_app::app::{self, AppState};
use banpick_app::protocol::{AppSnapshot, CatalogStatus, UiUpdate, UserCommand};
use banpick_core::catalog::{CatalogError, CatalogSource, Entity, Role};
use banpick_core::config::{CatalogConfig, Config, ControllerConfig, DatabaseConfig, SeriesConfig};
use banpick_core::db::Database;
use banpick_core::draft::{EntityId, Team, TOTAL_STEPS};
use banpick_core::recommend::{ControllerScope, Language, RandomRecommender};
use banpick_core::series::SeriesFormat;

// ===========================================================================
// Test helpers
// ===========================================================================

struct FakeSource {
    fail: bool,
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn latest_version(&self) -> Result<String, CatalogError> {
        if self.fail {
            Err(CatalogError::Request("connection refused".into()))
        } else {
            Ok("14.5.1".into())
        }
    }

    async fn fetch_catalog(&self, _version: &str) -> Result<Vec<Entity>, CatalogError> {
        Ok((0..40)
            .map(|i| Entity {
                id: EntityId::new(format!("C{i:02}")),
                key: i.to_string(),
                names: BTreeMap::from([("en_US".to_string(), format!("Champ {i:02}"))]),
                roles: BTreeSet::from([Role::ALL[i % Role::ALL.len()]]),
            })
            .collect())
    }
}

fn test_config() -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: "https://cdn.invalid".into(),
            locales: vec!["en_US".into()],
            request_timeout_secs: 5,
        },
        series: SeriesConfig {
            default_format: SeriesFormat::Bo3,
            fearless: true,
        },
        controller: ControllerConfig {
            scope: ControllerScope::Off,
            auto_apply: false,
            thinking_delay_ms: 1500,
        },
        database: DatabaseConfig {
            path: String::new(),
            series_key: "fearless_series".into(),
        },
        roles: HashMap::new(),
    }
}

struct Running {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

/// An app state whose background channels go nowhere.
fn build_state(db: Database, draft_id: &str, fail: bool) -> AppState {
    let (catalog_tx, _) = mpsc::channel(8);
    let (controller_tx, _) = mpsc::channel(8);
    AppState::new(
        test_config(),
        db,
        draft_id.to_string(),
        Arc::new(FakeSource { fail }),
        Box::new(RandomRecommender::with_seed(7, Language::En)),
        catalog_tx,
        controller_tx,
    )
}

/// Build an app state wired to fresh channels and spawn its event loop.
fn start(db: Database, draft_id: &str, fail: bool, recover: bool) -> Running {
    let (catalog_tx, catalog_rx) = mpsc::channel(8);
    let (controller_tx, controller_rx) = mpsc::channel(8);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(1024);

    let mut state = AppState::new(
        test_config(),
        db,
        draft_id.to_string(),
        Arc::new(FakeSource { fail }),
        Box::new(RandomRecommender::with_seed(7, Language::En)),
        catalog_tx,
        controller_tx,
    );
    if recover {
        app::recover_from_db(&mut state).unwrap();
    }
    let handle = tokio::spawn(app::run(cmd_rx, catalog_rx, controller_rx, ui_tx, state));
    Running {
        cmd_tx,
        ui_rx,
        handle,
    }
}

impl Running {
    async fn send(&self, cmd: UserCommand) {
        self.cmd_tx.send(cmd).await.unwrap();
    }

    /// Receive updates until a snapshot satisfies `pred`.
    async fn snapshot_where(&mut self, pred: impl Fn(&AppSnapshot) -> bool) -> AppSnapshot {
        loop {
            match self.ui_rx.recv().await {
                Some(UiUpdate::StateSnapshot(s)) if pred(&s) => return *s,
                Some(_) => {}
                None => panic!("event loop ended before the expected snapshot"),
            }
        }
    }

    /// Receive updates until a notice containing `text` arrives.
    async fn notice_containing(&mut self, text: &str) -> String {
        loop {
            match self.ui_rx.recv().await {
                Some(UiUpdate::Notice(n)) if n.contains(text) => return n,
                Some(_) => {}
                None => panic!("event loop ended before notice {text:?}"),
            }
        }
    }

    async fn quit(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
        assert!(result.is_ok(), "event loop should exit on Quit");
    }
}

fn catalog_ready(s: &AppSnapshot) -> bool {
    matches!(s.catalog_status, CatalogStatus::Ready { .. })
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn manual_draft_and_next_game() {
    let mut app = start(Database::open(":memory:").unwrap(), "draft_manual", false, false);
    app.snapshot_where(catalog_ready).await;

    for i in 0..TOTAL_STEPS {
        app.send(UserCommand::Select(format!("Champ {i:02}"))).await;
    }
    let done = app
        .snapshot_where(|s| s.session.draft.is_complete())
        .await;
    assert!(done.analysis.is_none());
    assert_eq!(done.session.draft.picked(Team::Blue).len(), 5);

    app.send(UserCommand::NextGame).await;
    let next = app
        .snapshot_where(|s| s.session.series.current_game() == 2)
        .await;
    assert_eq!(next.session.draft.cursor(), 0);
    assert_eq!(next.session.series.fearless_pool().len(), 10);
    // Picks of game 1 are greyed out in the browser; bans are not.
    let row = |id: &str| next.entities.iter().find(|r| r.id.as_str() == id).unwrap();
    assert!(!row("C06").available);
    assert!(row("C00").available);

    app.quit().await;
}

#[tokio::test]
async fn controller_drafts_both_sides() {
    tokio::time::pause();
    let mut app = start(Database::open(":memory:").unwrap(), "draft_auto", false, false);
    app.snapshot_where(catalog_ready).await;

    app.send(UserCommand::SetScope(ControllerScope::Both)).await;
    app.send(UserCommand::SetAutoApply(true)).await;

    let done = app
        .snapshot_where(|s| s.session.draft.is_complete())
        .await;
    assert_eq!(done.session.draft.history().len(), TOTAL_STEPS);
    assert!(!done.controller_pending);
    let used = done.session.draft.used_entities();
    assert_eq!(used.len(), TOTAL_STEPS);

    app.quit().await;
}

#[tokio::test]
async fn manual_selection_preempts_controller() {
    tokio::time::pause();
    let mut app = start(Database::open(":memory:").unwrap(), "draft_preempt", false, false);
    app.snapshot_where(catalog_ready).await;

    // The controller covers red only; blue drafts by hand.
    app.send(UserCommand::SetScope(ControllerScope::Red)).await;
    app.send(UserCommand::SetAutoApply(true)).await;
    app.send(UserCommand::Select("C39".into())).await;

    // Red's ban is applied by the controller after its delay.
    let after = app.snapshot_where(|s| s.session.draft.cursor() == 2).await;
    let red_ban = after.session.draft.bans(Team::Red)[0].clone().unwrap();
    assert_ne!(red_ban.as_str(), "C39");

    // Undo back into red's turn, then take it by hand before the delay ends.
    app.send(UserCommand::Undo).await;
    app.send(UserCommand::Select("C38".into())).await;
    let manual = app
        .snapshot_where(|s| {
            s.session.draft.cursor() == 2
                && s.session.draft.bans(Team::Red)[0] == Some(EntityId::from("C38"))
        })
        .await;
    assert!(!manual.controller_pending);

    app.quit().await;
}

#[tokio::test]
async fn offline_catalog_accepts_raw_ids() {
    let mut app = start(Database::open(":memory:").unwrap(), "draft_offline", true, false);
    app.notice_containing("Catalog unavailable").await;

    app.send(UserCommand::Select("Ahri".into())).await;
    let s = app.snapshot_where(|s| s.session.draft.cursor() == 1).await;
    assert!(matches!(s.catalog_status, CatalogStatus::Offline(_)));
    assert!(s.entities.is_empty());
    assert_eq!(s.name_of(&EntityId::from("Ahri")), "Ahri");

    app.quit().await;
}

#[tokio::test]
async fn restart_restores_draft_and_series() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("banpick.db");
    let path = path.to_str().unwrap().to_string();

    let mut app = start(Database::open(&path).unwrap(), "draft_restart", false, false);
    app.snapshot_where(catalog_ready).await;
    app.send(UserCommand::SetFormat(SeriesFormat::Bo5)).await;
    app.send(UserCommand::BackfillPick {
        game: 1,
        team: Team::Red,
        entity: "Champ 30".into(),
    })
    .await;
    app.send(UserCommand::SetGame(2)).await;
    app.send(UserCommand::Select("C01".into())).await;
    app.send(UserCommand::Select("C02".into())).await;
    app.snapshot_where(|s| s.session.draft.cursor() == 2).await;
    app.quit().await;

    let mut app = start(Database::open(&path).unwrap(), "draft_restart", false, true);
    let s = app.snapshot_where(catalog_ready).await;
    assert_eq!(s.session.series.format(), SeriesFormat::Bo5);
    assert_eq!(s.session.series.current_game(), 2);
    assert!(s.session.series.fearless_pool().contains("C30"));
    assert_eq!(s.session.draft.cursor(), 2);
    assert!(s.session.draft.is_used("C02"));
    app.quit().await;
}

#[tokio::test]
async fn saved_series_survives_reset() {
    let mut app = start(Database::open(":memory:").unwrap(), "draft_save", false, false);
    app.snapshot_where(catalog_ready).await;

    app.send(UserCommand::BackfillPick {
        game: 1,
        team: Team::Blue,
        entity: "C05".into(),
    })
    .await;
    app.send(UserCommand::SaveSeries).await;
    app.notice_containing("Series saved").await;

    app.send(UserCommand::ResetSeries).await;
    app.snapshot_where(|s| s.session.series.fearless_pool().is_empty())
        .await;

    app.send(UserCommand::LoadSeries).await;
    let s = app
        .snapshot_where(|s| s.session.series.fearless_pool().contains("C05"))
        .await;
    assert_eq!(s.session.series.records().len(), 1);

    app.quit().await;
}

#[tokio::test]
async fn browser_filters_apply_to_snapshot() {
    let mut app = start(Database::open(":memory:").unwrap(), "draft_filter", false, false);
    app.snapshot_where(catalog_ready).await;

    app.send(UserCommand::RoleFilter(Some(Role::Support))).await;
    let s = app.snapshot_where(|s| s.role_filter.is_some()).await;
    assert_eq!(s.entities.len(), 8);
    assert!(s.entities.iter().all(|r| r.roles == vec![Role::Support]));

    app.send(UserCommand::Search("champ 0".into())).await;
    let s = app.snapshot_where(|s| !s.filter_term.is_empty()).await;
    // C04 and C09 among C00..C09.
    assert_eq!(s.entities.len(), 2);

    app.quit().await;
}

#[test]
fn build_state_starts_from_config() {
    let state = build_state(Database::open(":memory:").unwrap(), "draft_cfg", false);
    assert_eq!(state.session.series.format(), SeriesFormat::Bo3);
    assert!(state.session.fearless);
    assert_eq!(state.controller.scope, ControllerScope::Off);
    assert_eq!(state.catalog_status, CatalogStatus::Loading);
    assert_eq!(state.locale, "en_US");
}
