//! Maintenance action runner.

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::retry::with_retry;
use crate::transport::RemoteStore;
use snipsync_protocol::MaintenanceAction;

/// Outcome of a maintenance run, ready for a success notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// The action that ran.
    pub action: MaintenanceAction,
    /// Notification title (the action label).
    pub title: String,
    /// Notification detail, selected from the reply's removed-count,
    /// cached-count, created-resource flag, or message; first present
    /// wins.
    pub detail: String,
    /// Whether a full resync followed the action.
    pub resynced: bool,
}

impl<T: RemoteStore> SyncEngine<T> {
    /// Runs a backend maintenance action.
    ///
    /// Sets the session to loading with a status line naming the action
    /// and issues the call with retry. Actions that mutate the record set
    /// trigger a full resync on success; others just clear the loading
    /// state. A failure clears loading and is returned without resync.
    pub async fn run_maintenance(&self, action: MaintenanceAction) -> SyncResult<MaintenanceReport> {
        if self.session().state().is_active() {
            return Err(SyncError::Busy);
        }

        let session = self.session();
        session.start_loading();
        session.set_status(format!("Running {}", action.label()));
        tracing::info!(action = action.wire_name(), "maintenance started");

        let transport = self.transport();
        let result = with_retry(&self.config().retry, || async move {
            let reply = transport.maintenance(action).await?;
            if reply.succeeded() {
                Ok(reply)
            } else {
                Err(SyncError::rejected(reply.message.clone()))
            }
        })
        .await;

        let reply = match result {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(action = action.wire_name(), %error, "maintenance failed");
                session.finish_loading();
                return Err(error);
            }
        };

        let detail = reply.detail();
        let resynced = if action.triggers_resync() {
            self.sync().await?;
            true
        } else {
            session.finish_loading();
            false
        };

        Ok(MaintenanceReport {
            action,
            title: action.label().to_string(),
            detail,
            resynced,
        })
    }
}
