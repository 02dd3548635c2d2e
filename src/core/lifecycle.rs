//! Entry state transitions.
//!
//! Each transition takes the current entry and returns the next one. The three
//! axes (done, archived, snoozed/woken) are kept consistent here: a completed
//! or archived entry never carries snooze state.

use chrono::{DateTime, Utc};

use super::entry::Entry;

/// Flip completion on a task. Notes are returned unchanged.
///
/// Completing stamps `completed_at`, takes the given notes (falling back to any
/// prior notes) and drops all snooze state. Reopening clears the completion
/// stamp, the notes and the woken marker.
pub fn toggle_completion(entry: &Entry, notes: Option<&str>, now: DateTime<Utc>) -> Entry {
    let mut next = entry.clone();
    if !entry.is_task() {
        return next;
    }

    if entry.is_completed {
        next.is_completed = false;
        next.completed_at = None;
        next.completion_notes = None;
        next.woke_up_at = None;
    } else {
        next.is_completed = true;
        next.completed_at = Some(now);
        next.completion_notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| entry.completion_notes.clone());
        next.snoozed_until = None;
        next.woke_up_at = None;
    }
    next
}

/// Flip the archive flag. Archiving drops snooze state; unarchiving clears the
/// archive stamp and the woken marker.
pub fn toggle_archive(entry: &Entry, now: DateTime<Utc>) -> Entry {
    let mut next = entry.clone();
    if entry.is_archived {
        next.is_archived = false;
        next.archived_at = None;
        next.woke_up_at = None;
    } else {
        next.is_archived = true;
        next.archived_at = Some(now);
        next.snoozed_until = None;
        next.woke_up_at = None;
    }
    next
}

/// Hide the entry until `until`. Callers validate that `until` is in the future.
pub fn apply_snooze(entry: &Entry, until: DateTime<Utc>) -> Entry {
    let mut next = entry.clone();
    next.snoozed_until = Some(until);
    next.woke_up_at = None;
    next
}

/// Wake an entry at `at`.
///
/// With a deadline present (due or not) the deadline is cleared and `woke_up_at`
/// recorded. Without one, the woken marker is cleared instead, which is how a
/// user dismisses the wake banner.
pub fn wake(entry: &Entry, at: DateTime<Utc>) -> Entry {
    let mut next = entry.clone();
    if entry.snoozed_until.is_some() {
        next.snoozed_until = None;
        next.woke_up_at = Some(at);
    } else {
        next.woke_up_at = None;
    }
    next
}

/// Restore the lifecycle invariants on a record that came from outside
/// (import). Valid records pass through unchanged.
pub fn normalize(entry: &Entry) -> Entry {
    let mut next = entry.clone();
    // Archive is note-only; an archived task would belong to no list.
    if next.is_task() {
        next.is_archived = false;
        next.archived_at = None;
    }
    if !next.is_completed {
        next.completed_at = None;
        next.completion_notes = None;
    }
    if !next.is_archived {
        next.archived_at = None;
    }
    if next.is_completed || next.is_archived {
        next.snoozed_until = None;
        next.woke_up_at = None;
    }
    if next.snoozed_until.is_some() {
        next.woke_up_at = None;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{EntryId, EntryKind};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn task() -> Entry {
        Entry::with_id(EntryId::new("a"), EntryKind::Task, "X", t0())
    }

    fn note() -> Entry {
        Entry::with_id(EntryId::new("n"), EntryKind::Note, "N", t0())
    }

    #[test]
    fn completing_clears_snooze_state() {
        let snoozed = apply_snooze(&task(), t0() + Duration::hours(1));
        let done = toggle_completion(&snoozed, Some("  shipped "), t0());
        assert!(done.is_completed);
        assert_eq!(done.completed_at, Some(t0()));
        assert_eq!(done.completion_notes.as_deref(), Some("shipped"));
        assert!(done.snoozed_until.is_none());
        assert!(done.woke_up_at.is_none());
    }

    #[test]
    fn completing_keeps_prior_notes_when_none_given() {
        let mut entry = task();
        entry.completion_notes = Some("earlier".into());
        let done = toggle_completion(&entry, None, t0());
        assert_eq!(done.completion_notes.as_deref(), Some("earlier"));

        let blank = toggle_completion(&task(), Some("   "), t0());
        assert!(blank.completion_notes.is_none());
    }

    #[test]
    fn reopening_clears_completion_and_woken_marker() {
        let done = toggle_completion(&task(), Some("n"), t0());
        let reopened = toggle_completion(&done, None, t0() + Duration::minutes(5));
        assert!(!reopened.is_completed);
        assert!(reopened.completed_at.is_none());
        assert!(reopened.completion_notes.is_none());
        assert!(reopened.woke_up_at.is_none());
    }

    #[test]
    fn completion_does_not_apply_to_notes() {
        let n = note();
        assert_eq!(toggle_completion(&n, Some("x"), t0()), n);
    }

    #[test]
    fn archive_round_trip() {
        let woken = wake(&apply_snooze(&note(), t0()), t0());
        let archived = toggle_archive(&woken, t0());
        assert!(archived.is_archived);
        assert_eq!(archived.archived_at, Some(t0()));
        assert!(archived.snoozed_until.is_none());
        assert!(archived.woke_up_at.is_none());

        let restored = toggle_archive(&archived, t0());
        assert!(!restored.is_archived);
        assert!(restored.archived_at.is_none());
    }

    #[test]
    fn snooze_clears_woken_marker() {
        let mut entry = task();
        entry.woke_up_at = Some(t0());
        let snoozed = apply_snooze(&entry, t0() + Duration::hours(2));
        assert_eq!(snoozed.snoozed_until, Some(t0() + Duration::hours(2)));
        assert!(snoozed.woke_up_at.is_none());
    }

    #[test]
    fn wake_before_deadline_still_wakes() {
        let snoozed = apply_snooze(&task(), t0() + Duration::hours(2));
        let woken = wake(&snoozed, t0());
        assert!(woken.snoozed_until.is_none());
        assert_eq!(woken.woke_up_at, Some(t0()));
    }

    #[test]
    fn wake_without_deadline_dismisses_marker() {
        let mut entry = task();
        entry.woke_up_at = Some(t0());
        let cleared = wake(&entry, t0() + Duration::minutes(1));
        assert!(cleared.woke_up_at.is_none());
        assert!(cleared.snoozed_until.is_none());
        assert_eq!(wake(&cleared, t0()), cleared);
    }

    #[test]
    fn normalize_repairs_inconsistent_records() {
        let mut entry = task();
        entry.completed_at = Some(t0());
        entry.completion_notes = Some("stale".into());
        entry.snoozed_until = Some(t0());
        entry.woke_up_at = Some(t0());
        let fixed = normalize(&entry);
        assert!(fixed.completed_at.is_none());
        assert!(fixed.completion_notes.is_none());
        assert_eq!(fixed.snoozed_until, Some(t0()));
        assert!(fixed.woke_up_at.is_none());

        let mut archived = note();
        archived.is_archived = true;
        archived.archived_at = Some(t0());
        archived.snoozed_until = Some(t0());
        let fixed = normalize(&archived);
        assert!(fixed.snoozed_until.is_none());
        assert_eq!(fixed.archived_at, Some(t0()));
    }

    #[test]
    fn normalize_unarchives_tasks() {
        let mut entry = task();
        entry.is_archived = true;
        entry.archived_at = Some(t0());
        entry.snoozed_until = Some(t0() + Duration::hours(1));
        let fixed = normalize(&entry);
        assert!(!fixed.is_archived);
        assert!(fixed.archived_at.is_none());
        assert_eq!(fixed.snoozed_until, Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn normalize_keeps_valid_records() {
        let done = toggle_completion(&task(), Some("ok"), t0());
        assert_eq!(normalize(&done), done);
        let snoozed = apply_snooze(&note(), t0());
        assert_eq!(normalize(&snoozed), snoozed);
    }
}
