//! Wake Scheduler: the periodic pass that ends elapsed snoozes.

pub mod highlight;
pub mod notify;
pub mod runtime;

use chrono::{DateTime, Utc};

use crate::core::entry::{Entry, EntryId};
use crate::core::lifecycle;
use crate::store::persistence::EntryPersistence;
use crate::store::EntryStore;

/// An entry that transitioned from snoozed to woken during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WokenEntry {
    pub id: EntryId,
    pub title: String,
    pub woke_up_at: DateTime<Utc>,
}

/// Wake every entry whose deadline is at or before `now`, in place.
/// Entries already woken have no deadline and are left alone.
pub fn wake_due(entries: &mut [Entry], now: DateTime<Utc>) -> Vec<WokenEntry> {
    let mut woken = Vec::new();
    for entry in entries.iter_mut().filter(|e| e.is_wake_due(now)) {
        *entry = lifecycle::wake(entry, now);
        woken.push(WokenEntry {
            id: entry.id.clone(),
            title: entry.title.clone(),
            woke_up_at: now,
        });
    }
    woken
}

/// One scheduler pass over the store's current sequence, saved as a single
/// batch. No due entries means no save.
pub fn run_pass<P: EntryPersistence>(store: &mut EntryStore<P>, now: DateTime<Utc>) -> Vec<WokenEntry> {
    let woken = store.modify(|entries| {
        let woken = wake_due(entries, now);
        let changed = !woken.is_empty();
        (woken, changed)
    });
    if !woken.is_empty() {
        log::info!("Woke {} snoozed entries", woken.len());
    }
    woken
}
