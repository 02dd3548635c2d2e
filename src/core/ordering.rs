use chrono::{DateTime, Utc};

use super::entry::{Entry, EntryId, EntryKind};

/// Where the dragged entry lands relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Before,
    After,
}

/// Entries may only be reordered against others with the same signature, so a
/// drag can never move an entry into a different list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionSignature {
    pub kind: EntryKind,
    pub archived: bool,
    /// Only tracked for tasks; always `false` for notes.
    pub completed: bool,
    pub live: bool,
}

impl PartitionSignature {
    pub fn of(entry: &Entry, now: DateTime<Utc>) -> Self {
        Self {
            kind: entry.kind,
            archived: entry.is_archived,
            completed: entry.is_task() && entry.is_completed,
            live: entry.is_live(now),
        }
    }
}

/// Move `dragged` next to `target`.
///
/// Returns `false` and leaves the sequence untouched when either id is unknown,
/// both ids are the same, or the two entries sit in different partitions.
pub fn reorder(
    entries: &mut Vec<Entry>,
    dragged: &EntryId,
    target: &EntryId,
    placement: Placement,
    now: DateTime<Utc>,
) -> bool {
    if dragged == target {
        return false;
    }
    let Some(from) = entries.iter().position(|e| &e.id == dragged) else {
        return false;
    };
    let Some(to) = entries.iter().position(|e| &e.id == target) else {
        return false;
    };

    if PartitionSignature::of(&entries[from], now) != PartitionSignature::of(&entries[to], now) {
        log::debug!("Rejected reorder of {} onto {}: partitions differ", dragged, target);
        return false;
    }

    let moved = entries.remove(from);
    // Target index shifts left by one when the dragged entry sat before it.
    let Some(target_idx) = entries.iter().position(|e| &e.id == target) else {
        entries.insert(from, moved);
        return false;
    };
    let insert_at = match placement {
        Placement::Before => target_idx,
        Placement::After => target_idx + 1,
    };
    entries.insert(insert_at, moved);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::{apply_snooze, toggle_completion};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn entry(id: &str, kind: EntryKind) -> Entry {
        Entry::with_id(EntryId::new(id), kind, id.to_uppercase(), t0())
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn moves_before_target_in_same_partition() {
        let mut list = vec![
            entry("a", EntryKind::Task),
            entry("b", EntryKind::Task),
            entry("c", EntryKind::Task),
        ];
        assert!(reorder(&mut list, &"c".into(), &"a".into(), Placement::Before, t0()));
        assert_eq!(ids(&list), vec!["c", "a", "b"]);

        assert!(reorder(&mut list, &"c".into(), &"b".into(), Placement::Before, t0()));
        assert_eq!(ids(&list), vec!["a", "c", "b"]);
    }

    #[test]
    fn moves_after_target() {
        let mut list = vec![
            entry("a", EntryKind::Note),
            entry("b", EntryKind::Note),
            entry("c", EntryKind::Note),
        ];
        assert!(reorder(&mut list, &"a".into(), &"b".into(), Placement::After, t0()));
        assert_eq!(ids(&list), vec!["b", "a", "c"]);
        assert!(reorder(&mut list, &"b".into(), &"c".into(), Placement::After, t0()));
        assert_eq!(ids(&list), vec!["a", "c", "b"]);
    }

    #[test]
    fn rejects_active_onto_completed() {
        let done = toggle_completion(&entry("b", EntryKind::Task), None, t0());
        let mut list = vec![entry("a", EntryKind::Task), done, entry("c", EntryKind::Task)];
        let before = list.clone();
        assert!(!reorder(&mut list, &"a".into(), &"b".into(), Placement::Before, t0()));
        assert_eq!(list, before);
    }

    #[test]
    fn rejects_across_kinds_and_liveness() {
        let snoozed = apply_snooze(&entry("s", EntryKind::Task), t0() + Duration::hours(1));
        let mut list = vec![entry("t", EntryKind::Task), entry("n", EntryKind::Note), snoozed];
        let before = list.clone();
        assert!(!reorder(&mut list, &"t".into(), &"n".into(), Placement::Before, t0()));
        assert!(!reorder(&mut list, &"t".into(), &"s".into(), Placement::Before, t0()));
        assert_eq!(list, before);

        // Once the deadline passes both sides are live again.
        let later = t0() + Duration::hours(2);
        assert!(reorder(&mut list, &"s".into(), &"t".into(), Placement::Before, later));
        assert_eq!(ids(&list), vec!["s", "t", "n"]);
    }

    #[test]
    fn unknown_or_same_ids_are_noops() {
        let mut list = vec![entry("a", EntryKind::Task), entry("b", EntryKind::Task)];
        assert!(!reorder(&mut list, &"a".into(), &"a".into(), Placement::Before, t0()));
        assert!(!reorder(&mut list, &"zz".into(), &"a".into(), Placement::Before, t0()));
        assert!(!reorder(&mut list, &"a".into(), &"zz".into(), Placement::After, t0()));
        assert_eq!(ids(&list), vec!["a", "b"]);
    }
}
