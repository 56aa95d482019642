// Automated drafting controller.
//
// When the pending step belongs to a side the controller covers and
// auto-apply is on, the app hands it the top suggestion. The controller
// waits out its thinking delay on a spawned task and then reports back with
// the state version it decided against; the event loop drops reports whose
// version is no longer current.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use banpick_core::config::ControllerConfig;
use banpick_core::draft::{EntityId, Team};
use banpick_core::recommend::ControllerScope;

use crate::protocol::ControllerFire;

pub struct Controller {
    pub scope: ControllerScope,
    pub auto_apply: bool,
    pub thinking_delay: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::Sender<ControllerFire>,
}

impl Controller {
    pub fn new(config: &ControllerConfig, tx: mpsc::Sender<ControllerFire>) -> Self {
        Controller {
            scope: config.scope,
            auto_apply: config.auto_apply,
            thinking_delay: config.thinking_delay(),
            pending: None,
            tx,
        }
    }

    /// Whether the controller should draft for `team` on its own.
    pub fn acts_for(&self, team: Team) -> bool {
        self.auto_apply && self.scope.covers(team)
    }

    /// True while a scheduled decision has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Schedule `entity_id` to be applied after the thinking delay. Replaces
    /// any decision still pending.
    pub fn schedule(&mut self, version: u64, entity_id: EntityId) {
        self.cancel();
        let tx = self.tx.clone();
        let delay = self.thinking_delay;
        debug!(
            "Controller will select {} in {:?} (version {})",
            entity_id, delay, version
        );
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerFire { version, entity_id }).await;
        }));
    }

    /// Abort the pending decision, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                info!("Cancelled pending controller decision");
            }
            handle.abort();
        }
    }
}
