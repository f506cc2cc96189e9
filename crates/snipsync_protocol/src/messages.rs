//! Protocol messages for snapshot sync and mutations.
//!
//! Every reply carries a boolean success indicator plus either a payload
//! or a human-readable message. The backend a given deployment talks to
//! may omit optional fields entirely; all reply types decode with
//! defaults so a sparse reply is still well-formed.

use crate::record::RawSnippet;
use serde::{Deserialize, Serialize};

/// Reply to the `bootstrap` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapReply {
    /// Whether the backend is ready to serve a snapshot.
    #[serde(default)]
    pub ok: bool,
    /// Failure detail when `ok` is false.
    #[serde(default)]
    pub message: Option<String>,
}

impl BootstrapReply {
    /// Creates a successful reply.
    pub fn success() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    /// Creates a failed reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// Reply to the `openSnapshot` operation.
///
/// Opens a consistent point-in-time view of the full record set. The
/// token identifies that view for subsequent batch fetches; the reply also
/// carries the first page of records so clients can render something
/// immediately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReply {
    /// Whether the snapshot was opened.
    #[serde(default)]
    pub ok: bool,
    /// Opaque snapshot token for batch fetches.
    #[serde(default)]
    pub snapshot_token: Option<String>,
    /// Total record count in the snapshot.
    #[serde(default)]
    pub total: u64,
    /// First page of records.
    #[serde(default)]
    pub records: Vec<RawSnippet>,
    /// Continuation offset (next unfetched record index).
    #[serde(default)]
    pub offset: u64,
    /// Whether more records remain after this page.
    #[serde(default)]
    pub has_more: bool,
    /// Failure detail when `ok` is false.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to the `fetchBatch` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReply {
    /// Whether the batch was served.
    #[serde(default)]
    pub ok: bool,
    /// Records in this batch.
    #[serde(default)]
    pub records: Vec<RawSnippet>,
    /// Continuation offset after this batch.
    #[serde(default)]
    pub offset: u64,
    /// Whether more records remain.
    #[serde(default)]
    pub has_more: bool,
    /// Failure detail when `ok` is false.
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic acknowledgement reply for `upsert` and `delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckReply {
    /// Whether the mutation was accepted.
    #[serde(default)]
    pub ok: bool,
    /// Detail message (set on both success and failure).
    #[serde(default)]
    pub message: Option<String>,
}

impl AckReply {
    /// Creates a successful acknowledgement.
    pub fn success() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    /// Creates a rejection.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// Reply to the `toggleFavorite` operation.
///
/// Both fields are optional on the wire; older backends reply with just
/// the new favorite state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoriteReply {
    /// Whether the toggle was applied.
    #[serde(default)]
    pub ok: Option<bool>,
    /// The favorite state after the toggle.
    #[serde(default)]
    pub favorite: Option<bool>,
}

/// Import mode for `bulkImport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Merge imported records into the existing set.
    #[default]
    Merge,
    /// Replace the existing set wholesale.
    Replace,
}

/// Request body for the `bulkImport` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkImportRequest {
    /// How to combine imported records with existing ones.
    pub mode: ImportMode,
    /// Serialized records, in whatever textual format the backend accepts.
    pub text: String,
}

impl BulkImportRequest {
    /// Creates a new import request.
    pub fn new(mode: ImportMode, text: impl Into<String>) -> Self {
        Self {
            mode,
            text: text.into(),
        }
    }
}

/// Reply to the `bulkImport` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkImportReply {
    /// Whether the import ran.
    #[serde(default)]
    pub ok: bool,
    /// Number of records inserted.
    #[serde(default)]
    pub inserted: u64,
    /// Number of records updated.
    #[serde(default)]
    pub updated: u64,
    /// Per-record errors, if any.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Failure detail when `ok` is false.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to a maintenance action.
///
/// Maintenance backends are the loosest of all: some report `ok`, some
/// `success`, and the result detail can be a removed-count, a
/// cached-count, a created-resource flag, or a plain message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReply {
    /// Success indicator (newer backends).
    #[serde(default)]
    pub ok: Option<bool>,
    /// Success indicator (older backends).
    #[serde(default)]
    pub success: Option<bool>,
    /// Number of entries removed.
    #[serde(default)]
    pub removed: Option<u64>,
    /// Number of entries cached.
    #[serde(default)]
    pub cached: Option<u64>,
    /// Set when the action created a resource (e.g. a backup file).
    #[serde(default)]
    pub resource_created: Option<bool>,
    /// Detail message.
    #[serde(default)]
    pub message: Option<String>,
}

impl MaintenanceReply {
    /// Returns true if either success indicator is set and true.
    pub fn succeeded(&self) -> bool {
        self.ok.or(self.success).unwrap_or(false)
    }

    /// Builds the notification detail: removed-count, then cached-count,
    /// then created-resource, then the message, in that order of
    /// preference.
    pub fn detail(&self) -> String {
        if let Some(removed) = self.removed {
            return format!("Removed {removed} entries");
        }
        if let Some(cached) = self.cached {
            return format!("Cached {cached} entries");
        }
        if self.resource_created == Some(true) {
            return "Resource created".into();
        }
        self.message
            .clone()
            .unwrap_or_else(|| "Completed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bootstrap_reply_constructors() {
        assert!(BootstrapReply::success().ok);
        let err = BootstrapReply::error("store locked");
        assert!(!err.ok);
        assert_eq!(err.message.as_deref(), Some("store locked"));
    }

    #[test]
    fn snapshot_reply_decodes_sparse_json() {
        let reply: SnapshotReply = serde_json::from_value(json!({
            "ok": true,
            "snapshotToken": "T-1",
            "total": 2,
            "records": [
                {"trigger": "a", "expansion": "alpha"},
                {"trigger": "b", "expansion": "beta"},
            ],
            "offset": 2,
        }))
        .unwrap();

        assert!(reply.ok);
        assert_eq!(reply.snapshot_token.as_deref(), Some("T-1"));
        assert_eq!(reply.records.len(), 2);
        assert!(!reply.has_more);
    }

    #[test]
    fn batch_reply_defaults() {
        let reply: BatchReply = serde_json::from_value(json!({})).unwrap();
        assert!(!reply.ok);
        assert!(reply.records.is_empty());
        assert!(!reply.has_more);
    }

    #[test]
    fn favorite_reply_old_backend_shape() {
        let reply: FavoriteReply = serde_json::from_value(json!({"favorite": true})).unwrap();
        assert!(reply.ok.is_none());
        assert_eq!(reply.favorite, Some(true));
    }

    #[test]
    fn bulk_import_request_roundtrip() {
        let req = BulkImportRequest::new(ImportMode::Replace, "a\talpha");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["mode"], "replace");
        let back: BulkImportRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.mode, ImportMode::Replace);
    }

    #[test]
    fn maintenance_reply_success_indicators() {
        let newer: MaintenanceReply = serde_json::from_value(json!({"ok": true})).unwrap();
        assert!(newer.succeeded());

        let older: MaintenanceReply = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(older.succeeded());

        let neither: MaintenanceReply = serde_json::from_value(json!({})).unwrap();
        assert!(!neither.succeeded());

        // `ok` wins over `success` when both are present.
        let both: MaintenanceReply =
            serde_json::from_value(json!({"ok": false, "success": true})).unwrap();
        assert!(!both.succeeded());
    }

    #[test]
    fn maintenance_detail_preference_order() {
        let reply = MaintenanceReply {
            ok: Some(true),
            removed: Some(3),
            cached: Some(9),
            message: Some("done".into()),
            ..Default::default()
        };
        assert_eq!(reply.detail(), "Removed 3 entries");

        let reply = MaintenanceReply {
            ok: Some(true),
            cached: Some(9),
            ..Default::default()
        };
        assert_eq!(reply.detail(), "Cached 9 entries");

        let reply = MaintenanceReply {
            ok: Some(true),
            resource_created: Some(true),
            ..Default::default()
        };
        assert_eq!(reply.detail(), "Resource created");

        let reply = MaintenanceReply {
            ok: Some(true),
            message: Some("rebuilt".into()),
            ..Default::default()
        };
        assert_eq!(reply.detail(), "rebuilt");

        let reply = MaintenanceReply {
            ok: Some(true),
            ..Default::default()
        };
        assert_eq!(reply.detail(), "Completed");
    }
}
