pub mod entry;
pub mod lifecycle;
pub mod ordering;
pub mod snooze;
pub mod views;

pub use entry::{Entry, EntryId, EntryKind, Priority};
