//! In-memory snippet store.

use parking_lot::RwLock;
use snipsync_protocol::Snippet;

/// The local working copy of the record set.
///
/// An ordered collection keyed by trigger, shared behind a lock. All
/// writes go through this type; optimistic mutations capture a full
/// [`StoreSnapshot`] synchronously before applying, and roll back by
/// restoring it wholesale, never by patching a diff.
#[derive(Debug, Default)]
pub struct SnippetStore {
    snippets: RwLock<Vec<Snippet>>,
}

/// A full copy of the store contents at a point in time.
pub type StoreSnapshot = Vec<Snippet>;

impl SnippetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snippets currently held.
    pub fn len(&self) -> usize {
        self.snippets.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.snippets.read().is_empty()
    }

    /// Returns the snippet with the given trigger, if present.
    pub fn get(&self, trigger: &str) -> Option<Snippet> {
        self.snippets
            .read()
            .iter()
            .find(|s| s.trigger == trigger)
            .cloned()
    }

    /// Returns a copy of every snippet in store order.
    pub fn all(&self) -> Vec<Snippet> {
        self.snippets.read().clone()
    }

    /// Appends a batch of fetched records.
    ///
    /// A record whose trigger already exists replaces the old entry in
    /// place, preserving its position; new triggers append in batch order.
    /// This makes re-applying an already-seen batch after a resume safe.
    pub fn append_batch(&self, batch: Vec<Snippet>) {
        let mut snippets = self.snippets.write();
        for snippet in batch {
            match snippets.iter_mut().find(|s| s.trigger == snippet.trigger) {
                Some(existing) => *existing = snippet,
                None => snippets.push(snippet),
            }
        }
    }

    /// Applies a user upsert: replace in place if the trigger exists,
    /// otherwise prepend so the newest entry is first.
    pub fn upsert(&self, snippet: Snippet) {
        let mut snippets = self.snippets.write();
        match snippets.iter_mut().find(|s| s.trigger == snippet.trigger) {
            Some(existing) => *existing = snippet,
            None => snippets.insert(0, snippet),
        }
    }

    /// Removes the snippet with the given trigger. Returns true if it was
    /// present.
    pub fn remove(&self, trigger: &str) -> bool {
        let mut snippets = self.snippets.write();
        let before = snippets.len();
        snippets.retain(|s| s.trigger != trigger);
        snippets.len() < before
    }

    /// Flips the favorite flag on the matching snippet. Returns the new
    /// state, or `None` if the trigger is unknown.
    pub fn toggle_favorite(&self, trigger: &str) -> Option<bool> {
        let mut snippets = self.snippets.write();
        let snippet = snippets.iter_mut().find(|s| s.trigger == trigger)?;
        snippet.favorite = !snippet.favorite;
        Some(snippet.favorite)
    }

    /// Captures a full snapshot of the current contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.snippets.read().clone()
    }

    /// Restores the store to a previously captured snapshot, replacing the
    /// whole collection.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        *self.snippets.write() = snapshot;
    }

    /// Clears the store.
    pub fn clear(&self) {
        self.snippets.write().clear();
    }
}
