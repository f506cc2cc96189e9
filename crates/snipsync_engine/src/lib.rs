//! # snipsync Engine
//!
//! Resumable snapshot sync and optimistic mutation client for a remotely
//! hosted snippet library.
//!
//! This crate provides:
//! - Snapshot sync state machine (bootstrap → open snapshot → batch fetch
//!   → completed) with a resumable cursor and cooperative cancellation
//! - Optimistic create/update/delete with full-snapshot rollback
//! - Retry with exponential backoff
//! - Host-bridge gateway with per-call timeouts
//! - Error classification for user-facing display
//! - Maintenance action runner
//!
//! ## Architecture
//!
//! The backend only exposes request/response calls, with no streaming
//! and no persistent connection, so the full record set is pulled as a
//! **consistent snapshot in sequential batches**: open a snapshot to get
//! a token pinning a point-in-time view, then fetch batches by offset
//! until the backend reports no more. The cursor (token + offset + total)
//! is updated after every batch, unconditionally, so a failed run resumes
//! from where it stopped instead of restarting.
//!
//! Mutations apply locally first and confirm remotely; a rejection
//! restores the pre-mutation snapshot of the whole collection.
//!
//! ## Key Invariants
//!
//! - Batches are appended in increasing offset order, never in parallel
//! - No offset is requested twice within one run
//! - A cursor with a token is always resumable
//! - Rollback restores the exact prior collection, never a merge
//! - Cancellation is cooperative and never reported as a failure

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod classify;
mod config;
mod engine;
mod error;
mod maintenance;
mod mutation;
mod retry;
mod session;
mod store;
mod transport;

pub use bridge::{BridgeClient, BridgeTransport};
pub use classify::{classify, ClassifiedError};
pub use config::{RetryConfig, RollbackPolicy, SnippetLimits, SyncConfig};
pub use engine::{EngineStats, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use maintenance::MaintenanceReport;
pub use mutation::{MutationEngine, MutationError, MutationResult};
pub use retry::with_retry;
pub use session::{SessionState, SyncCursor, SyncProgress, SyncSession};
pub use store::{SnippetStore, StoreSnapshot};
pub use transport::{MockRemote, RemoteStore};
