//! Maintenance actions.
//!
//! The backend exposes one-shot maintenance operations. Rather than
//! dispatching by late-bound string name, the client supports a closed set
//! of actions, each with a fixed wire name and a classification of whether
//! running it mutates the record set (and so requires a full resync).

use serde::{Deserialize, Serialize};

/// A backend maintenance action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceAction {
    /// Remove duplicate and orphaned entries.
    Cleanup,
    /// Rebuild the backend's lookup cache.
    RebuildCache,
    /// Restore the record set from the most recent backup.
    RestoreBackup,
    /// Import records left behind by a legacy installation.
    ImportLegacy,
    /// Create a backup of the current record set.
    CreateBackup,
}

impl MaintenanceAction {
    /// The operation name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MaintenanceAction::Cleanup => "cleanup",
            MaintenanceAction::RebuildCache => "rebuildCache",
            MaintenanceAction::RestoreBackup => "restoreBackup",
            MaintenanceAction::ImportLegacy => "importLegacy",
            MaintenanceAction::CreateBackup => "createBackup",
        }
    }

    /// Human-readable label for status lines and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            MaintenanceAction::Cleanup => "Cleanup",
            MaintenanceAction::RebuildCache => "Rebuild cache",
            MaintenanceAction::RestoreBackup => "Restore backup",
            MaintenanceAction::ImportLegacy => "Import legacy data",
            MaintenanceAction::CreateBackup => "Create backup",
        }
    }

    /// Returns true if the action mutates the record set, in which case a
    /// full resync must follow a successful run.
    pub fn triggers_resync(&self) -> bool {
        match self {
            MaintenanceAction::Cleanup
            | MaintenanceAction::RebuildCache
            | MaintenanceAction::RestoreBackup
            | MaintenanceAction::ImportLegacy => true,
            MaintenanceAction::CreateBackup => false,
        }
    }

    /// All supported actions.
    pub fn all() -> &'static [MaintenanceAction] {
        &[
            MaintenanceAction::Cleanup,
            MaintenanceAction::RebuildCache,
            MaintenanceAction::RestoreBackup,
            MaintenanceAction::ImportLegacy,
            MaintenanceAction::CreateBackup,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_unique() {
        let mut names: Vec<_> = MaintenanceAction::all()
            .iter()
            .map(|a| a.wire_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MaintenanceAction::all().len());
    }

    #[test]
    fn data_mutating_actions_resync() {
        assert!(MaintenanceAction::Cleanup.triggers_resync());
        assert!(MaintenanceAction::RebuildCache.triggers_resync());
        assert!(MaintenanceAction::RestoreBackup.triggers_resync());
        assert!(MaintenanceAction::ImportLegacy.triggers_resync());
        assert!(!MaintenanceAction::CreateBackup.triggers_resync());
    }
}
