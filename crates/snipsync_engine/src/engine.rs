//! Snapshot sync engine.

use crate::classify::classify;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::retry::with_retry;
use crate::session::{SessionState, SyncCursor, SyncSession};
use crate::store::SnippetStore;
use crate::transport::RemoteStore;
use parking_lot::RwLock;
use snipsync_protocol::RawSnippet;
use std::sync::Arc;

/// Counters describing engine activity.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Completed sync runs.
    pub runs_completed: u64,
    /// Batches fetched across all runs (the snapshot's first page
    /// included).
    pub batches_fetched: u64,
    /// Records received across all runs.
    pub records_loaded: u64,
    /// Message of the last failure, if any.
    pub last_error: Option<String>,
}

/// The snapshot sync engine.
///
/// Orchestrates bootstrap → open-snapshot → iterative batch fetch →
/// completion against a [`RemoteStore`], keeping the resumable cursor,
/// progress, and cancellation state in a shared [`SyncSession`].
///
/// The fetch loop is iterative and strictly sequential; the cancellation
/// flag is checked before every remote call, and the cursor is updated
/// unconditionally after every received batch so a failed run can resume
/// from where it stopped instead of restarting.
pub struct SyncEngine<T: RemoteStore> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<SnippetStore>,
    session: Arc<SyncSession>,
    stats: RwLock<EngineStats>,
}

impl<T: RemoteStore> SyncEngine<T> {
    /// Creates an engine with an empty local store.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            store: Arc::new(SnippetStore::new()),
            session: Arc::new(SyncSession::new()),
            stats: RwLock::new(EngineStats::default()),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The shared local store.
    pub fn store(&self) -> &Arc<SnippetStore> {
        &self.store
    }

    /// The shared session state.
    pub fn session(&self) -> &Arc<SyncSession> {
        &self.session
    }

    /// The transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Current engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Requests cancellation of the active run.
    ///
    /// Cooperative: an in-flight remote call is not aborted, but its
    /// result is ignored and no further call is issued. Clears the loading
    /// indicator and any displayed error; nothing is retried
    /// automatically.
    pub fn cancel(&self) {
        tracing::info!("sync cancelled by user");
        self.session.cancel();
    }

    /// Runs a full sync from scratch.
    ///
    /// Starting a run supersedes any previous one: a prior run still
    /// unwinding observes the stale generation at its next checkpoint and
    /// stops quietly.
    pub async fn sync(&self) -> SyncResult<()> {
        let generation = self.session.begin();
        tracing::info!(generation, "sync started");

        match self.run_from_bootstrap(generation).await {
            Ok(()) => Ok(()),
            Err(error) => Err(self.fail(generation, error)),
        }
    }

    /// Retries after an error.
    ///
    /// If the stored cursor holds a snapshot token, fetching resumes from
    /// the stored offset; otherwise the whole sequence restarts from
    /// bootstrap.
    pub async fn resume(&self) -> SyncResult<()> {
        if !self.session.cursor().is_resumable() {
            return self.sync().await;
        }

        let generation = self.session.begin_resume();
        tracing::info!(generation, "sync resumed from cursor");

        match self.fetch_remaining(generation).await {
            Ok(()) => {
                self.complete(generation);
                Ok(())
            }
            Err(error) => Err(self.fail(generation, error)),
        }
    }

    async fn run_from_bootstrap(&self, generation: u64) -> SyncResult<()> {
        let session = &self.session;
        let transport = &self.transport;

        session.set_state(SessionState::Bootstrapping);
        session.set_status("Preparing backend");
        with_retry(&self.config.retry, || async move {
            session.checkpoint(generation)?;
            let reply = transport.bootstrap().await?;
            if reply.ok {
                Ok(())
            } else {
                Err(SyncError::rejected(reply.message))
            }
        })
        .await?;

        session.set_state(SessionState::OpeningSnapshot);
        session.set_status("Opening snapshot");
        let opened = with_retry(&self.config.retry, || async move {
            session.checkpoint(generation)?;
            let reply = transport.open_snapshot().await?;
            if reply.ok {
                Ok(reply)
            } else {
                Err(SyncError::rejected(reply.message))
            }
        })
        .await?;

        if opened.has_more && opened.snapshot_token.is_none() {
            return Err(SyncError::Protocol(
                "snapshot reply has more records but no token".into(),
            ));
        }

        // The snapshot is the authoritative record set; entries the
        // backend dropped since the last run must not survive it.
        self.store.clear();

        let received = opened.records.len() as u64;
        self.apply_batch(opened.records);
        session.record_progress(received, opened.total);
        // The cursor must reflect the continuation point before the next
        // step runs, so a failure there still leaves a resumable position.
        session.set_cursor(SyncCursor {
            token: opened.snapshot_token,
            offset: opened.offset,
            total: opened.total,
        });
        tracing::debug!(received, total = opened.total, "snapshot opened");

        if opened.has_more {
            self.fetch_remaining(generation).await?;
        }

        self.complete(generation);
        Ok(())
    }

    /// Fetches batches from the stored cursor until the backend reports no
    /// more records. Offsets only ever increase; no offset is requested
    /// twice within a run.
    async fn fetch_remaining(&self, generation: u64) -> SyncResult<()> {
        let session = &self.session;
        let transport = &self.transport;
        let limit = self.config.batch_size;

        loop {
            session.set_state(SessionState::FetchingBatch);
            session.checkpoint(generation)?;

            let cursor = session.cursor();
            let token = cursor
                .token
                .clone()
                .ok_or_else(|| SyncError::Protocol("cursor has no snapshot token".into()))?;
            let offset = cursor.offset;
            session.set_status(format!(
                "Loading records {offset} of {total}",
                total = cursor.total
            ));

            let reply = with_retry(&self.config.retry, || {
                let token = token.clone();
                async move {
                    session.checkpoint(generation)?;
                    let reply = transport.fetch_batch(&token, offset, limit).await?;
                    if reply.ok {
                        Ok(reply)
                    } else {
                        Err(SyncError::rejected(reply.message))
                    }
                }
            })
            .await?;

            if reply.has_more && reply.offset <= offset {
                return Err(SyncError::Protocol("batch offset did not advance".into()));
            }

            let received = reply.records.len() as u64;
            self.apply_batch(reply.records);
            let loaded = session.progress().loaded + received;
            session.record_progress(loaded, cursor.total);
            session.set_cursor(SyncCursor {
                token: Some(token),
                offset: reply.offset,
                total: cursor.total,
            });
            tracing::debug!(offset, received, loaded, "batch applied");

            if !reply.has_more {
                return Ok(());
            }
        }
    }

    fn apply_batch(&self, records: Vec<RawSnippet>) {
        let count = records.len() as u64;
        self.store
            .append_batch(records.into_iter().map(RawSnippet::into_snippet).collect());
        let mut stats = self.stats.write();
        stats.batches_fetched += 1;
        stats.records_loaded += count;
    }

    fn complete(&self, generation: u64) {
        if !self.session.is_current(generation) {
            return;
        }
        let progress = self.session.progress();
        self.session.set_state(SessionState::Completed);
        self.session
            .set_status(format!("Loaded {} records", progress.loaded));
        self.session.finish_loading();
        self.stats.write().runs_completed += 1;
        tracing::info!(loaded = progress.loaded, "sync completed");
    }

    fn fail(&self, generation: u64, error: SyncError) -> SyncError {
        if error == SyncError::Cancelled {
            // cancel() already cleared the loading indicator and the
            // displayed error; a superseded run lands here too and must
            // not touch the state of the run that replaced it.
            return error;
        }
        if self.session.is_current(generation) {
            tracing::warn!(%error, "sync failed");
            self.session.record_error(classify(&error));
            self.stats.write().last_error = Some(error.to_string());
        }
        error
    }
}
