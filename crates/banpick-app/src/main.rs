// Ban/pick draft board entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, resolve the draft id, check for crash recovery
// 4. Create mpsc channels
// 5. Spawn app logic task
// 6. Run the TUI until the user quits
// 7. Cleanup on exit

use std::sync::Arc;

use banpick_app::app;
use banpick_app::catalog_client::DataDragonClient;
use banpick_app::tui;
use banpick_core::config;
use banpick_core::db::Database;
use banpick_core::recommend::{Language, RandomRecommender};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Ban/pick board starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} series, fearless={}, controller={} (auto={})",
        config.series.default_format,
        config.series.fearless,
        config.controller.scope,
        config.controller.auto_apply
    );

    // 3. Open database
    let db_path = config.database.resolved_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    let draft_id = match db.get_draft_id()? {
        Some(id) => id,
        None => {
            let id = Database::generate_draft_id();
            db.set_draft_id(&id)?;
            id
        }
    };
    info!("Draft id: {}", draft_id);

    let source = DataDragonClient::new(&config.catalog, config.roles.clone())
        .context("failed to build catalog client")?;
    let language = Language::from_locale(config.catalog.display_locale());
    let recommender = RandomRecommender::new(language);

    // 4. Create mpsc channels
    let (catalog_tx, catalog_rx) = mpsc::channel(8);
    let (controller_tx, controller_rx) = mpsc::channel(8);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let mut app_state = app::AppState::new(
        config,
        db,
        draft_id,
        Arc::new(source),
        Box::new(recommender),
        catalog_tx,
        controller_tx,
    );

    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Draft restored from previous session"),
        Ok(false) => info!("Starting fresh draft session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 5. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, catalog_rx, controller_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 6. Run the TUI until the user quits
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 7. Wait for the app task to save and exit
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Ban/pick board shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("banpick.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("banpick_app=info,banpick_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
