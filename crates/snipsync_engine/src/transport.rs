//! Transport abstraction for the remote snippet store.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use snipsync_protocol::{
    AckReply, BatchReply, BootstrapReply, BulkImportReply, BulkImportRequest, FavoriteReply,
    MaintenanceAction, MaintenanceReply, SnapshotReply, Snippet,
};
use std::collections::VecDeque;

/// The remote operations the engine consumes.
///
/// This trait abstracts the backend, allowing different implementations
/// (the host-bridge gateway, a mock for testing, an in-process fake).
/// Every reply carries its own success indicator; transport-level success
/// does not imply the operation succeeded.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Wakes the backend and verifies it can serve a snapshot.
    async fn bootstrap(&self) -> SyncResult<BootstrapReply>;

    /// Opens a consistent point-in-time snapshot and returns its first
    /// page.
    async fn open_snapshot(&self) -> SyncResult<SnapshotReply>;

    /// Fetches the batch at `offset` within the snapshot identified by
    /// `token`.
    async fn fetch_batch(&self, token: &str, offset: u64, limit: u32) -> SyncResult<BatchReply>;

    /// Creates or updates a snippet.
    async fn upsert(&self, snippet: &Snippet) -> SyncResult<AckReply>;

    /// Deletes the snippet with the given trigger.
    async fn delete(&self, trigger: &str) -> SyncResult<AckReply>;

    /// Toggles the favorite flag on the given trigger.
    async fn toggle_favorite(&self, trigger: &str) -> SyncResult<FavoriteReply>;

    /// Imports records in bulk.
    async fn bulk_import(&self, request: &BulkImportRequest) -> SyncResult<BulkImportReply>;

    /// Runs a maintenance action.
    async fn maintenance(&self, action: MaintenanceAction) -> SyncResult<MaintenanceReply>;
}

/// A scriptable remote store for testing.
///
/// Replies are queued per operation and consumed in order; an exhausted
/// queue yields a protocol error. Every call is appended to a log so tests
/// can assert on exactly which requests were issued.
#[derive(Debug, Default)]
pub struct MockRemote {
    bootstrap_replies: Mutex<VecDeque<SyncResult<BootstrapReply>>>,
    snapshot_replies: Mutex<VecDeque<SyncResult<SnapshotReply>>>,
    batch_replies: Mutex<VecDeque<SyncResult<BatchReply>>>,
    ack_replies: Mutex<VecDeque<SyncResult<AckReply>>>,
    favorite_replies: Mutex<VecDeque<SyncResult<FavoriteReply>>>,
    import_replies: Mutex<VecDeque<SyncResult<BulkImportReply>>>,
    maintenance_replies: Mutex<VecDeque<SyncResult<MaintenanceReply>>>,
    calls: Mutex<Vec<String>>,
}

impl MockRemote {
    /// Creates a mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a bootstrap reply.
    pub fn push_bootstrap(&self, reply: SyncResult<BootstrapReply>) {
        self.bootstrap_replies.lock().push_back(reply);
    }

    /// Queues an open-snapshot reply.
    pub fn push_snapshot(&self, reply: SyncResult<SnapshotReply>) {
        self.snapshot_replies.lock().push_back(reply);
    }

    /// Queues a batch reply.
    pub fn push_batch(&self, reply: SyncResult<BatchReply>) {
        self.batch_replies.lock().push_back(reply);
    }

    /// Queues an acknowledgement reply (consumed by upsert and delete).
    pub fn push_ack(&self, reply: SyncResult<AckReply>) {
        self.ack_replies.lock().push_back(reply);
    }

    /// Queues a favorite-toggle reply.
    pub fn push_favorite(&self, reply: SyncResult<FavoriteReply>) {
        self.favorite_replies.lock().push_back(reply);
    }

    /// Queues a bulk-import reply.
    pub fn push_import(&self, reply: SyncResult<BulkImportReply>) {
        self.import_replies.lock().push_back(reply);
    }

    /// Queues a maintenance reply.
    pub fn push_maintenance(&self, reply: SyncResult<MaintenanceReply>) {
        self.maintenance_replies.lock().push_back(reply);
    }

    /// Returns the log of issued calls.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn log(&self, entry: String) {
        self.calls.lock().push(entry);
    }

    fn pop<T>(queue: &Mutex<VecDeque<SyncResult<T>>>, operation: &str) -> SyncResult<T> {
        queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Protocol(format!("no scripted {operation} reply"))))
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn bootstrap(&self) -> SyncResult<BootstrapReply> {
        self.log("bootstrap".into());
        Self::pop(&self.bootstrap_replies, "bootstrap")
    }

    async fn open_snapshot(&self) -> SyncResult<SnapshotReply> {
        self.log("openSnapshot".into());
        Self::pop(&self.snapshot_replies, "openSnapshot")
    }

    async fn fetch_batch(&self, token: &str, offset: u64, limit: u32) -> SyncResult<BatchReply> {
        self.log(format!("fetchBatch {token} {offset} {limit}"));
        Self::pop(&self.batch_replies, "fetchBatch")
    }

    async fn upsert(&self, snippet: &Snippet) -> SyncResult<AckReply> {
        self.log(format!("upsert {}", snippet.trigger));
        Self::pop(&self.ack_replies, "upsert")
    }

    async fn delete(&self, trigger: &str) -> SyncResult<AckReply> {
        self.log(format!("delete {trigger}"));
        Self::pop(&self.ack_replies, "delete")
    }

    async fn toggle_favorite(&self, trigger: &str) -> SyncResult<FavoriteReply> {
        self.log(format!("toggleFavorite {trigger}"));
        Self::pop(&self.favorite_replies, "toggleFavorite")
    }

    async fn bulk_import(&self, request: &BulkImportRequest) -> SyncResult<BulkImportReply> {
        self.log(format!("bulkImport {:?}", request.mode));
        Self::pop(&self.import_replies, "bulkImport")
    }

    async fn maintenance(&self, action: MaintenanceAction) -> SyncResult<MaintenanceReply> {
        self.log(format!("maintenance {}", action.wire_name()));
        Self::pop(&self.maintenance_replies, "maintenance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_replies_consumed_in_order() {
        let mock = MockRemote::new();
        mock.push_bootstrap(Ok(BootstrapReply::success()));
        mock.push_bootstrap(Ok(BootstrapReply::error("busy")));

        assert!(mock.bootstrap().await.unwrap().ok);
        assert!(!mock.bootstrap().await.unwrap().ok);
    }

    #[tokio::test]
    async fn exhausted_queue_is_a_protocol_error() {
        let mock = MockRemote::new();
        let result = mock.bootstrap().await;
        assert!(matches!(result, Err(SyncError::Protocol(_))));
    }

    #[tokio::test]
    async fn calls_are_logged_with_arguments() {
        let mock = MockRemote::new();
        mock.push_batch(Ok(BatchReply::default()));
        mock.fetch_batch("T", 500, 400).await.unwrap();
        assert_eq!(mock.calls(), vec!["fetchBatch T 500 400"]);
    }
}
