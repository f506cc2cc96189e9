//! Optimistic mutations against the local store.
//!
//! Every mutation applies locally first, then confirms with the backend.
//! Rollback restores a full pre-mutation snapshot of the collection,
//! never a partial merge, so a rejected mutation can never leave the
//! store half-written. Whether a rejection rolls back is a per-operation
//! policy choice ([`RollbackPolicy`]); favorite toggles default to
//! fire-and-forget because favorite state is low-stakes and eventually
//! consistent.
//!
//! [`RollbackPolicy`]: crate::config::RollbackPolicy

use crate::config::{SnippetLimits, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::retry::with_retry;
use crate::session::SyncSession;
use crate::store::SnippetStore;
use crate::transport::RemoteStore;
use snipsync_protocol::{BulkImportReply, BulkImportRequest, Snippet};
use std::sync::Arc;
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// A mutation failure, qualified by what happened to the optimistic
/// local change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The mutation failed before any local change was applied
    /// (validation, busy sync session, absent bridge).
    #[error(transparent)]
    NotApplied(SyncError),
    /// The optimistic change was applied, the backend rejected it, and
    /// the local store was restored to its pre-mutation snapshot.
    #[error("{0} (local changes reverted)")]
    Reverted(SyncError),
    /// The optimistic change was applied and the backend rejected it, but
    /// the rollback policy kept the local change.
    #[error("{0} (local changes kept)")]
    Kept(SyncError),
}

impl MutationError {
    /// The underlying sync error.
    pub fn inner(&self) -> &SyncError {
        match self {
            MutationError::NotApplied(e)
            | MutationError::Reverted(e)
            | MutationError::Kept(e) => e,
        }
    }
}

/// Optimistic mutation engine.
///
/// Shares the store, session, and transport with the sync engine.
/// Mutations are refused with [`SyncError::Busy`] while a sync session is
/// actively fetching: a concurrent batch could otherwise overwrite the
/// mutated record with stale server data.
pub struct MutationEngine<T: RemoteStore> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<SnippetStore>,
    session: Arc<SyncSession>,
}

impl<T: RemoteStore> MutationEngine<T> {
    /// Creates a mutation engine over shared state.
    pub fn new(
        config: SyncConfig,
        transport: Arc<T>,
        store: Arc<SnippetStore>,
        session: Arc<SyncSession>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            session,
        }
    }

    /// Creates a mutation engine sharing a sync engine's state.
    pub fn for_engine(engine: &crate::engine::SyncEngine<T>) -> Self {
        Self::new(
            engine.config().clone(),
            Arc::clone(engine.transport()),
            Arc::clone(engine.store()),
            Arc::clone(engine.session()),
        )
    }

    fn ensure_not_syncing(&self) -> Result<(), MutationError> {
        if self.session.state().is_active() {
            Err(MutationError::NotApplied(SyncError::Busy))
        } else {
            Ok(())
        }
    }

    /// Creates or updates a snippet.
    ///
    /// Validates locally first; invalid input never reaches the network.
    /// The store is updated immediately (replace in place if the trigger
    /// exists, else prepend); on remote rejection the store is restored
    /// from the pre-mutation snapshot.
    pub async fn upsert(&self, snippet: Snippet) -> MutationResult<()> {
        validate(&snippet, &self.config.limits).map_err(MutationError::NotApplied)?;
        self.ensure_not_syncing()?;

        let rollback = self.store.snapshot();
        self.store.upsert(snippet.clone());

        let transport = &self.transport;
        let result = with_retry(&self.config.retry, || {
            let snippet = snippet.clone();
            async move {
                let reply = transport.upsert(&snippet).await?;
                if reply.ok {
                    Ok(())
                } else {
                    Err(SyncError::rejected(reply.message))
                }
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(error) => {
                if self.config.rollback.upsert {
                    tracing::warn!(%error, trigger = %snippet.trigger, "upsert rejected, rolling back");
                    self.store.restore(rollback);
                    Err(MutationError::Reverted(error))
                } else {
                    Err(MutationError::Kept(error))
                }
            }
        }
    }

    /// Deletes the snippet with the given trigger.
    ///
    /// Asking the user for confirmation is the caller's responsibility;
    /// this method deletes unconditionally. The record is removed from the
    /// store immediately; on remote rejection the store is restored from
    /// the pre-deletion snapshot, original order included.
    pub async fn delete(&self, trigger: &str) -> MutationResult<()> {
        self.ensure_not_syncing()?;

        let rollback = self.store.snapshot();
        if !self.store.remove(trigger) {
            return Err(MutationError::NotApplied(SyncError::Validation(format!(
                "unknown trigger: {trigger}"
            ))));
        }

        let transport = &self.transport;
        let result = with_retry(&self.config.retry, || async move {
            let reply = transport.delete(trigger).await?;
            if reply.ok {
                Ok(())
            } else {
                Err(SyncError::rejected(reply.message))
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(error) => {
                if self.config.rollback.delete {
                    tracing::warn!(%error, trigger, "delete rejected, rolling back");
                    self.store.restore(rollback);
                    Err(MutationError::Reverted(error))
                } else {
                    Err(MutationError::Kept(error))
                }
            }
        }
    }

    /// Flips the favorite flag on the matching snippet and reports the
    /// new state.
    ///
    /// Fire-and-forget by default: a remote failure is logged and the
    /// local flip stands. Set `rollback.favorite` to make rejections
    /// revert the flip instead.
    pub async fn toggle_favorite(&self, trigger: &str) -> MutationResult<bool> {
        self.ensure_not_syncing()?;

        let Some(favorite) = self.store.toggle_favorite(trigger) else {
            return Err(MutationError::NotApplied(SyncError::Validation(format!(
                "unknown trigger: {trigger}"
            ))));
        };

        let result = match self.transport.toggle_favorite(trigger).await {
            Ok(reply) if reply.ok.unwrap_or(true) => Ok(()),
            Ok(_) => Err(SyncError::Rejected("favorite toggle refused".into())),
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => Ok(favorite),
            Err(error) => {
                if self.config.rollback.favorite {
                    self.store.toggle_favorite(trigger);
                    Err(MutationError::Reverted(error))
                } else {
                    tracing::warn!(%error, trigger, "favorite toggle failed, keeping local state");
                    Ok(favorite)
                }
            }
        }
    }

    /// Imports records in bulk on the backend.
    ///
    /// Nothing is applied locally; callers should run a full sync after a
    /// successful import to pick up the result (the import maintenance
    /// action does this automatically).
    pub async fn bulk_import(&self, request: BulkImportRequest) -> MutationResult<BulkImportReply> {
        self.ensure_not_syncing()?;

        let transport = &self.transport;
        let request = &request;
        with_retry(&self.config.retry, || async move {
            let reply = transport.bulk_import(request).await?;
            if reply.ok {
                Ok(reply)
            } else {
                Err(SyncError::rejected(reply.message))
            }
        })
        .await
        .map_err(MutationError::NotApplied)
    }
}

/// Validates a snippet against the configured limits.
///
/// Checks run locally and a failure is never retried and never sent.
fn validate(snippet: &Snippet, limits: &SnippetLimits) -> SyncResult<()> {
    if snippet.trigger.trim().is_empty() {
        return Err(SyncError::Validation("trigger must not be empty".into()));
    }
    if snippet.expansion.is_empty() {
        return Err(SyncError::Validation("expansion must not be empty".into()));
    }
    check_len("trigger", &snippet.trigger, limits.trigger)?;
    check_len("expansion", &snippet.expansion, limits.expansion)?;
    if let Some(tags) = &snippet.tags {
        check_len("tags", tags, limits.tags)?;
    }
    if let Some(description) = &snippet.description {
        check_len("description", description, limits.description)?;
    }
    if let Some(application) = &snippet.application {
        check_len("application", application, limits.application)?;
    }
    Ok(())
}

fn check_len(field: &str, value: &str, limit: usize) -> SyncResult<()> {
    let length = value.chars().count();
    if length > limit {
        return Err(SyncError::Validation(format!(
            "{field} exceeds {limit} characters (got {length})"
        )));
    }
    Ok(())
}
