use chrono::{DateTime, Utc};

use crate::core::entry::{Entry, EntryId};
use crate::core::ordering::Placement;
use crate::core::snooze::SnoozePreset;
use crate::exchange::{ImportMode, ImportOutcome};
use crate::store::{EntryEdit, NewEntry};
use crate::wake::WokenEntry;

/// User-issued requests against the tracker.
#[derive(Debug, Clone)]
pub enum Intent {
    // Entry CRUD
    Add(NewEntry),
    Edit(EntryId, EntryEdit),
    Delete(EntryId),

    // Lifecycle
    ToggleCompletion {
        id: EntryId,
        notes: Option<String>,
    },
    ToggleArchive(EntryId),
    SnoozeUntil(EntryId, DateTime<Utc>),
    SnoozePreset(EntryId, SnoozePreset),
    Unsnooze(EntryId),

    // Ordering
    Reorder {
        dragged: EntryId,
        target: EntryId,
        placement: Placement,
    },

    // Exchange
    Import {
        outcome: ImportOutcome,
        mode: ImportMode,
    },

    // Scheduler
    Tick,
}

/// What an intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Added(EntryId),
    Updated(Entry),
    Deleted(Entry),
    /// `false` when the reorder crossed partitions and was ignored.
    Reordered(bool),
    Imported { accepted: usize, dropped: usize },
    Woken(Vec<WokenEntry>),
}
