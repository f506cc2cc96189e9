//! Host-bridge gateway.
//!
//! The host environment exposes a single async call primitive: fire a
//! named operation with JSON arguments, receive exactly one success value
//! or one failure. [`BridgeTransport`] wraps that primitive into the typed
//! [`RemoteStore`] interface, adding a hard per-call timeout.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use snipsync_protocol::{
    AckReply, BatchReply, BootstrapReply, BulkImportReply, BulkImportRequest, FavoriteReply,
    MaintenanceAction, MaintenanceReply, SnapshotReply, Snippet,
};
use std::time::Duration;

/// The raw host call primitive.
///
/// Implement this trait over whatever the embedding environment provides
/// (an IPC channel, a webview bridge, an in-process fake).
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Fires the named operation with the given arguments and returns the
    /// raw reply value, or a raw error message.
    async fn call(&self, operation: &str, args: Value) -> Result<Value, String>;

    /// Returns true if the bridge is present and usable.
    fn is_available(&self) -> bool;
}

/// Typed gateway over a [`BridgeClient`].
///
/// Each invocation issues exactly one underlying call. If the bridge is
/// absent the invocation fails with [`SyncError::Unavailable`] immediately
/// and no timer is started. Otherwise the call races a hard deadline;
/// success and timeout are mutually exclusive, first to fire wins.
pub struct BridgeTransport<C: BridgeClient> {
    client: C,
    call_timeout: Duration,
}

impl<C: BridgeClient> BridgeTransport<C> {
    /// Creates a gateway with the configured per-call timeout.
    pub fn new(client: C, config: &SyncConfig) -> Self {
        Self {
            client,
            call_timeout: config.call_timeout,
        }
    }

    /// Creates a gateway with an explicit timeout.
    pub fn with_timeout(client: C, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    async fn invoke<R>(&self, operation: &str, args: Value) -> SyncResult<R>
    where
        R: serde::de::DeserializeOwned,
    {
        if !self.client.is_available() {
            return Err(SyncError::Unavailable);
        }

        let call = self.client.call(operation, args);
        let reply = match tokio::time::timeout(self.call_timeout, call).await {
            Err(_) => return Err(SyncError::Timeout),
            Ok(Err(message)) => return Err(SyncError::Transport(message)),
            Ok(Ok(value)) => value,
        };

        serde_json::from_value(reply)
            .map_err(|e| SyncError::Protocol(format!("malformed {operation} reply: {e}")))
    }
}

#[async_trait]
impl<C: BridgeClient> RemoteStore for BridgeTransport<C> {
    async fn bootstrap(&self) -> SyncResult<BootstrapReply> {
        self.invoke("bootstrap", json!([])).await
    }

    async fn open_snapshot(&self) -> SyncResult<SnapshotReply> {
        self.invoke("openSnapshot", json!([])).await
    }

    async fn fetch_batch(&self, token: &str, offset: u64, limit: u32) -> SyncResult<BatchReply> {
        self.invoke("fetchBatch", json!([token, offset, limit])).await
    }

    async fn upsert(&self, snippet: &Snippet) -> SyncResult<AckReply> {
        self.invoke("upsert", json!([snippet])).await
    }

    async fn delete(&self, trigger: &str) -> SyncResult<AckReply> {
        self.invoke("delete", json!([trigger])).await
    }

    async fn toggle_favorite(&self, trigger: &str) -> SyncResult<FavoriteReply> {
        self.invoke("toggleFavorite", json!([trigger])).await
    }

    async fn bulk_import(&self, request: &BulkImportRequest) -> SyncResult<BulkImportReply> {
        self.invoke("bulkImport", json!([request])).await
    }

    async fn maintenance(&self, action: MaintenanceAction) -> SyncResult<MaintenanceReply> {
        self.invoke(action.wire_name(), json!([])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct TestBridge {
        available: AtomicBool,
        reply: Mutex<Option<Result<Value, String>>>,
        delay: Mutex<Option<Duration>>,
        calls: AtomicUsize,
    }

    impl TestBridge {
        fn new() -> Self {
            Self {
                available: AtomicBool::new(true),
                reply: Mutex::new(None),
                delay: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        fn set_reply(&self, reply: Result<Value, String>) {
            *self.reply.lock() = Some(reply);
        }

        fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }
    }

    #[async_trait]
    impl BridgeClient for TestBridge {
        async fn call(&self, _operation: &str, _args: Value) -> Result<Value, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .lock()
                .clone()
                .unwrap_or_else(|| Err("no reply set".into()))
        }

        fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn absent_bridge_fails_without_calling() {
        let bridge = TestBridge::new();
        bridge.available.store(false, Ordering::SeqCst);
        let transport = BridgeTransport::with_timeout(bridge, Duration::from_secs(1));

        let result = transport.bootstrap().await;
        assert_eq!(result.unwrap_err(), SyncError::Unavailable);
        assert_eq!(transport.client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_call_decodes_reply() {
        let bridge = TestBridge::new();
        bridge.set_reply(Ok(json!({"ok": true})));
        let transport = BridgeTransport::with_timeout(bridge, Duration::from_secs(1));

        let reply = transport.bootstrap().await.unwrap();
        assert!(reply.ok);
        assert_eq!(transport.client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let bridge = TestBridge::new();
        bridge.set_reply(Ok(json!({"ok": true})));
        bridge.set_delay(Duration::from_secs(120));
        let transport = BridgeTransport::with_timeout(bridge, Duration::from_secs(60));

        let result = transport.bootstrap().await;
        assert_eq!(result.unwrap_err(), SyncError::Timeout);
    }

    #[tokio::test]
    async fn raw_failure_becomes_transport_error() {
        let bridge = TestBridge::new();
        bridge.set_reply(Err("fetch failed".into()));
        let transport = BridgeTransport::with_timeout(bridge, Duration::from_secs(1));

        let result = transport.bootstrap().await;
        assert_eq!(result.unwrap_err(), SyncError::Transport("fetch failed".into()));
    }

    #[tokio::test]
    async fn malformed_reply_is_a_protocol_error() {
        let bridge = TestBridge::new();
        bridge.set_reply(Ok(json!("not an object")));
        let transport = BridgeTransport::with_timeout(bridge, Duration::from_secs(1));

        let result = transport.bootstrap().await;
        assert!(matches!(result, Err(SyncError::Protocol(_))));
    }
}
