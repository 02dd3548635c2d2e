use std::collections::HashMap;

use crate::core::entry::EntryId;

/// Proof that a highlight was armed. Expiring with a stale ticket is a no-op,
/// so re-arming an id extends its highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightTicket {
    pub id: EntryId,
    generation: u64,
}

/// Transient "just woke" markers keyed by entry id. Never persisted.
#[derive(Debug, Default)]
pub struct HighlightSet {
    active: HashMap<EntryId, u64>,
    next_generation: u64,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: EntryId) -> HighlightTicket {
        self.next_generation += 1;
        self.active.insert(id.clone(), self.next_generation);
        HighlightTicket {
            id,
            generation: self.next_generation,
        }
    }

    /// Returns true when the marker was removed.
    pub fn expire(&mut self, ticket: &HighlightTicket) -> bool {
        if self.active.get(&ticket.id) == Some(&ticket.generation) {
            self.active.remove(&ticket.id);
            true
        } else {
            false
        }
    }

    /// Drop a marker regardless of ticket, e.g. when its entry is deleted.
    pub fn clear(&mut self, id: &EntryId) {
        self.active.remove(id);
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.active.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
