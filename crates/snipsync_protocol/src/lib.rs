//! # snipsync Protocol
//!
//! Wire types for the snipsync client.
//!
//! This crate provides:
//! - [`Snippet`] and the raw-record mapping rules ([`RawSnippet`])
//! - Request/reply shapes for the remote operations (bootstrap,
//!   open-snapshot, batch fetch, mutations, bulk import)
//! - The closed [`MaintenanceAction`] set
//!
//! This is a pure protocol crate with no I/O operations. Remote replies
//! always carry a boolean success indicator plus either a payload or a
//! message; decoding is tolerant: missing optional fields default and
//! unknown fields are ignored.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod maintenance;
mod messages;
mod record;

pub use maintenance::MaintenanceAction;
pub use messages::{
    AckReply, BatchReply, BootstrapReply, BulkImportReply, BulkImportRequest, FavoriteReply,
    ImportMode, MaintenanceReply, SnapshotReply,
};
pub use record::{Language, RawSnippet, Snippet};
