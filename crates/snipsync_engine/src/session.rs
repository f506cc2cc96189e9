//! Sync session state.

use crate::classify::ClassifiedError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// The current phase of the snapshot sync state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No sync has run yet.
    Idle,
    /// Waking the backend and verifying it can serve a snapshot.
    Bootstrapping,
    /// Opening the point-in-time snapshot view.
    OpeningSnapshot,
    /// Fetching record batches.
    FetchingBatch,
    /// All records received.
    Completed,
    /// A phase failed; the session is paused with the error displayed.
    Errored,
    /// The user cancelled the session.
    Cancelled,
}

impl SessionState {
    /// Returns true if the session is in an active fetch phase.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Bootstrapping
                | SessionState::OpeningSnapshot
                | SessionState::FetchingBatch
        )
    }

    /// Returns true for states no transition leaves without a new start.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// The resumable position within an in-progress or paused sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCursor {
    /// Opaque snapshot token issued by the backend. `Some` means the
    /// cursor is resumable.
    pub token: Option<String>,
    /// Next record index to fetch.
    pub offset: u64,
    /// Total record count as last reported by the backend.
    pub total: u64,
}

impl SyncCursor {
    /// Returns true if a failed fetch can resume from this cursor instead
    /// of restarting the whole snapshot.
    pub fn is_resumable(&self) -> bool {
        self.token.is_some()
    }

    /// Resets to the pre-bootstrap state.
    pub fn reset(&mut self) {
        *self = SyncCursor::default();
    }
}

/// Progress of the current sync run.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Records loaded so far.
    pub loaded: u64,
    /// Total records expected.
    pub total: u64,
    /// When the session started.
    pub started_at: Instant,
}

impl SyncProgress {
    fn new() -> Self {
        Self {
            loaded: 0,
            total: 0,
            started_at: Instant::now(),
        }
    }

    /// Records per second since the session started, or `None` before any
    /// time has elapsed.
    pub fn throughput(&self) -> Option<f64> {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed <= 0.0 || self.loaded == 0 {
            return None;
        }
        Some(self.loaded as f64 / elapsed)
    }

    /// Estimated time to completion. `None` when the throughput or the
    /// total is unknown.
    pub fn eta(&self) -> Option<Duration> {
        if self.total == 0 {
            return None;
        }
        let throughput = self.throughput()?;
        if throughput <= 0.0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.loaded) as f64;
        Some(Duration::from_secs_f64(remaining / throughput))
    }
}

/// Shared state of one synchronization run.
///
/// Exactly one session is logically active at a time. Each run holds a
/// generation number; starting a new run bumps the generation, which
/// supersedes any prior run still unwinding; its next checkpoint observes
/// the stale generation and stops.
#[derive(Debug)]
pub struct SyncSession {
    state: RwLock<SessionState>,
    cursor: RwLock<SyncCursor>,
    progress: RwLock<SyncProgress>,
    status: RwLock<String>,
    last_error: RwLock<Option<ClassifiedError>>,
    loading: AtomicBool,
    cancelled: AtomicBool,
    generation: AtomicU64,
}

impl SyncSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Idle),
            cursor: RwLock::new(SyncCursor::default()),
            progress: RwLock::new(SyncProgress::new()),
            status: RwLock::new(String::new()),
            last_error: RwLock::new(None),
            loading: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a fresh run: bumps the generation, clears cancellation and
    /// the prior error, resets the cursor and progress. Returns the new
    /// generation token.
    pub fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancelled.store(false, Ordering::SeqCst);
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write() = None;
        self.cursor.write().reset();
        *self.progress.write() = SyncProgress::new();
        *self.state.write() = SessionState::Bootstrapping;
        generation
    }

    /// Resumes a paused run without resetting the cursor. Returns the new
    /// generation token.
    pub fn begin_resume(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancelled.store(false, Ordering::SeqCst);
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write() = None;
        *self.state.write() = SessionState::FetchingBatch;
        generation
    }

    /// Returns true if `generation` is still the live run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Requests cancellation: in-flight work observes the flag at its next
    /// checkpoint. Clears the loading indicator and any displayed error.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.loading.store(false, Ordering::SeqCst);
        *self.last_error.write() = None;
        let mut state = self.state.write();
        if !state.is_terminal() {
            *state = SessionState::Cancelled;
        }
    }

    /// Fails with [`SyncError::Cancelled`] if this run was cancelled or
    /// superseded by a newer one.
    ///
    /// [`SyncError::Cancelled`]: crate::SyncError::Cancelled
    pub fn checkpoint(&self, generation: u64) -> crate::SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) || !self.is_current(generation) {
            Err(crate::SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Sets the state.
    pub fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    /// Current cursor.
    pub fn cursor(&self) -> SyncCursor {
        self.cursor.read().clone()
    }

    /// Updates the cursor. Called unconditionally after every received
    /// batch, before the next step, so retry and resume always see a valid
    /// position.
    pub fn set_cursor(&self, cursor: SyncCursor) {
        *self.cursor.write() = cursor;
    }

    /// Current progress.
    pub fn progress(&self) -> SyncProgress {
        self.progress.read().clone()
    }

    /// Records progress after a batch lands.
    pub fn record_progress(&self, loaded: u64, total: u64) {
        let mut progress = self.progress.write();
        progress.loaded = loaded;
        progress.total = total;
    }

    /// Human-readable status line.
    pub fn status(&self) -> String {
        self.status.read().clone()
    }

    /// Sets the status line.
    pub fn set_status(&self, status: impl Into<String>) {
        *self.status.write() = status.into();
    }

    /// The last classified error, if the session is paused on one.
    pub fn last_error(&self) -> Option<ClassifiedError> {
        self.last_error.read().clone()
    }

    /// Records a classified error and pauses in [`SessionState::Errored`].
    /// The loading indicator intentionally stays on so the caller can
    /// present the error with a retry/cancel choice.
    pub fn record_error(&self, error: ClassifiedError) {
        *self.last_error.write() = Some(error);
        *self.state.write() = SessionState::Errored;
    }

    /// Whether a loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Turns the loading indicator on without starting a sync run.
    pub fn start_loading(&self) {
        self.loading.store(true, Ordering::SeqCst);
    }

    /// Clears the loading indicator.
    pub fn finish_loading(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncError;

    #[test]
    fn state_predicates() {
        assert!(SessionState::Bootstrapping.is_active());
        assert!(SessionState::FetchingBatch.is_active());
        assert!(!SessionState::Idle.is_active());
        assert!(!SessionState::Errored.is_active());
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
        assert!(!SessionState::Errored.is_terminal());
    }

    #[test]
    fn cursor_resumability() {
        let mut cursor = SyncCursor {
            token: Some("T".into()),
            offset: 500,
            total: 2000,
        };
        assert!(cursor.is_resumable());
        cursor.reset();
        assert!(!cursor.is_resumable());
        assert_eq!(cursor.offset, 0);
        assert_eq!(cursor.total, 0);
    }

    #[test]
    fn begin_resets_everything() {
        let session = SyncSession::new();
        session.set_cursor(SyncCursor {
            token: Some("T".into()),
            offset: 10,
            total: 20,
        });
        session.record_error(crate::classify(&SyncError::Timeout));

        let generation = session.begin();
        assert!(session.is_current(generation));
        assert_eq!(session.state(), SessionState::Bootstrapping);
        assert_eq!(session.cursor(), SyncCursor::default());
        assert!(session.last_error().is_none());
        assert!(session.is_loading());
    }

    #[test]
    fn begin_resume_keeps_cursor() {
        let session = SyncSession::new();
        let cursor = SyncCursor {
            token: Some("T".into()),
            offset: 500,
            total: 2000,
        };
        session.set_cursor(cursor.clone());
        session.record_error(crate::classify(&SyncError::Timeout));

        session.begin_resume();
        assert_eq!(session.state(), SessionState::FetchingBatch);
        assert_eq!(session.cursor(), cursor);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn cancel_clears_loading_and_error() {
        let session = SyncSession::new();
        let generation = session.begin();
        session.record_error(crate::classify(&SyncError::Timeout));

        session.cancel();
        assert!(!session.is_loading());
        assert!(session.last_error().is_none());
        assert_eq!(session.state(), SessionState::Cancelled);
        assert_eq!(session.checkpoint(generation), Err(SyncError::Cancelled));
    }

    #[test]
    fn new_generation_supersedes_old() {
        let session = SyncSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert_eq!(session.checkpoint(first), Err(SyncError::Cancelled));
        assert_eq!(session.checkpoint(second), Ok(()));
    }

    #[test]
    fn progress_eta_unknown_without_total() {
        let progress = SyncProgress {
            loaded: 50,
            total: 0,
            started_at: Instant::now(),
        };
        assert!(progress.eta().is_none());
    }

    #[test]
    fn progress_throughput_and_eta() {
        let progress = SyncProgress {
            loaded: 100,
            total: 300,
            started_at: Instant::now() - Duration::from_secs(10),
        };
        let throughput = progress.throughput().unwrap();
        assert!((throughput - 10.0).abs() < 0.5);
        let eta = progress.eta().unwrap();
        assert!(eta >= Duration::from_secs(19) && eta <= Duration::from_secs(21));
    }
}
