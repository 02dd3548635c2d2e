//! The canonical ordered entry collection.
//!
//! Every mutation reads the current sequence, computes the next one and writes
//! it back through the persistence collaborator. Derived lists are computed on
//! demand and never cached here.

pub mod persistence;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::entry::{Entry, EntryId, EntryKind, Priority};
use crate::core::ordering::{self, Placement};
use crate::core::views::{ActiveFilters, EntryViews};
use crate::error::{StoreError, ValidationError};
use persistence::EntryPersistence;

/// Fields supplied when creating an entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub kind: EntryKind,
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub contact: Option<String>,
    pub url: Option<String>,
    pub project: Option<String>,
    pub priority: Option<Priority>,
}

impl NewEntry {
    pub fn new(kind: EntryKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            details: None,
            due_date: None,
            contact: None,
            url: None,
            project: None,
            priority: None,
        }
    }
}

/// Full replacement of the editable fields of an entry.
#[derive(Debug, Clone)]
pub struct EntryEdit {
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub contact: Option<String>,
    pub url: Option<String>,
    pub project: Option<String>,
    pub priority: Priority,
    /// `Some` re-snoozes (must be in the future); `None` drops any deadline.
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl EntryEdit {
    /// Pre-filled from the current entry, for changing a few fields.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            details: entry.details.clone(),
            due_date: entry.due_date,
            contact: entry.contact.clone(),
            url: entry.url.clone(),
            project: entry.project.clone(),
            priority: entry.priority,
            snoozed_until: entry.snoozed_until,
        }
    }
}

/// Trim, and treat blank text as absent.
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct EntryStore<P: EntryPersistence> {
    entries: Vec<Entry>,
    persistence: P,
}

impl<P: EntryPersistence> EntryStore<P> {
    /// Loads the stored set. A missing store yields an empty collection.
    pub fn open(persistence: P) -> Result<Self, StoreError> {
        let entries = persistence.load()?;
        log::info!("Opened entry store with {} entries", entries.len());
        Ok(Self {
            entries,
            persistence,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Exact id, or a prefix matching exactly one entry.
    pub fn resolve_id(&self, query: &str) -> Result<EntryId, ValidationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::NotFound(query.to_string()));
        }
        if let Some(entry) = self.entries.iter().find(|e| e.id.as_str() == query) {
            return Ok(entry.id.clone());
        }
        let mut matches = self.entries.iter().filter(|e| e.id.as_str().starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.id.clone()),
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousId(query.to_string())),
            _ => Err(ValidationError::NotFound(query.to_string())),
        }
    }

    pub fn views(&self, now: DateTime<Utc>, filters: &ActiveFilters) -> EntryViews {
        EntryViews::build(&self.entries, now, filters)
    }

    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.persist();
    }

    /// Prepend an already-built entry. Ids must stay unique.
    pub fn insert(&mut self, entry: Entry) -> Result<(), StoreError> {
        if self.get(&entry.id).is_some() {
            return Err(StoreError::DuplicateId(entry.id));
        }
        self.entries.insert(0, entry);
        self.persist();
        Ok(())
    }

    pub fn add_entry(&mut self, new: NewEntry, now: DateTime<Utc>) -> Result<EntryId, ValidationError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let mut entry = Entry::new(new.kind, title, now);
        entry.details = clean_text(new.details);
        entry.due_date = new.due_date;
        entry.contact = clean_text(new.contact);
        entry.url = clean_text(new.url);
        entry.project = clean_text(new.project);
        entry.priority = new.priority.unwrap_or_default();

        let id = entry.id.clone();
        log::info!("Added {} {}", entry.kind.as_keyword(), id);
        self.entries.insert(0, entry);
        self.persist();
        Ok(id)
    }

    pub fn edit_entry(
        &mut self,
        id: &EntryId,
        edit: EntryEdit,
        now: DateTime<Utc>,
    ) -> Result<Entry, ValidationError> {
        let title = edit.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if edit.snoozed_until.is_some_and(|until| until <= now) {
            return Err(ValidationError::SnoozeNotInFuture);
        }
        if edit.snoozed_until.is_some() {
            let current = self
                .get(id)
                .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
            if current.is_completed || current.is_archived {
                return Err(ValidationError::NotSnoozable);
            }
        }

        self.update(id, |entry| {
            let mut next = entry.clone();
            next.title = title;
            next.details = clean_text(edit.details);
            next.due_date = edit.due_date;
            next.contact = clean_text(edit.contact);
            next.url = clean_text(edit.url);
            next.project = clean_text(edit.project);
            next.priority = edit.priority;
            next.snoozed_until = edit.snoozed_until;
            if edit.snoozed_until.is_some() {
                next.woke_up_at = None;
            }
            next
        })
    }

    /// Replace one entry with `f(entry)`, matched by id against the current
    /// sequence.
    pub fn update(
        &mut self,
        id: &EntryId,
        f: impl FnOnce(&Entry) -> Entry,
    ) -> Result<Entry, ValidationError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let next = f(&*slot);
        if next == *slot {
            return Ok(next);
        }
        *slot = next.clone();
        self.persist();
        Ok(next)
    }

    /// Run a batched change over the live sequence. `f` reports whether it
    /// changed anything; the store persists once, and only then.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut Vec<Entry>) -> (R, bool)) -> R {
        let (result, changed) = f(&mut self.entries);
        if changed {
            self.persist();
        }
        result
    }

    pub fn remove(&mut self, id: &EntryId) -> Result<Entry, ValidationError> {
        let pos = self
            .entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let removed = self.entries.remove(pos);
        log::info!("Deleted {}", id);
        self.persist();
        Ok(removed)
    }

    /// Returns `false` (and changes nothing) for incompatible partitions.
    pub fn reorder(
        &mut self,
        dragged: &EntryId,
        target: &EntryId,
        placement: Placement,
        now: DateTime<Utc>,
    ) -> bool {
        self.modify(|entries| {
            let moved = ordering::reorder(entries, dragged, target, placement, now);
            (moved, moved)
        })
    }

    /// Append entries under freshly generated ids. Returns the number added.
    pub fn append_with_fresh_ids(&mut self, entries: Vec<Entry>) -> usize {
        let count = entries.len();
        self.entries.extend(entries.into_iter().map(|mut entry| {
            entry.id = EntryId::generate();
            entry
        }));
        if count > 0 {
            self.persist();
        }
        count
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.entries) {
            log::error!("Failed to save entries: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::toggle_completion;
    use chrono::{Duration, TimeZone};
    use persistence::MemoryPersistence;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn store() -> EntryStore<MemoryPersistence> {
        EntryStore::open(MemoryPersistence::new()).unwrap()
    }

    #[test]
    fn add_entry_prepends_and_cleans_fields() {
        let mut store = store();
        let first = store.add_entry(NewEntry::new(EntryKind::Task, "First"), t0()).unwrap();
        let mut input = NewEntry::new(EntryKind::Note, "  Second  ");
        input.project = Some("   ".into());
        input.details = Some(" body ".into());
        let second = store.add_entry(input, t0()).unwrap();

        assert_eq!(store.entries()[0].id, second);
        assert_eq!(store.entries()[1].id, first);
        let note = store.get(&second).unwrap();
        assert_eq!(note.title, "Second");
        assert_eq!(note.details.as_deref(), Some("body"));
        assert!(note.project.is_none());
        assert_eq!(note.priority, Priority::Normal);
        assert_eq!(store.persistence().save_count(), 2);
    }

    #[test]
    fn empty_title_is_rejected_without_change() {
        let mut store = store();
        let err = store.add_entry(NewEntry::new(EntryKind::Task, "  "), t0()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
        assert!(store.is_empty());
        assert_eq!(store.persistence().save_count(), 0);
    }

    #[test]
    fn edit_sets_snooze_and_clears_woken_marker() {
        let mut store = store();
        let id = store.add_entry(NewEntry::new(EntryKind::Task, "X"), t0()).unwrap();
        store
            .update(&id, |e| Entry {
                woke_up_at: Some(t0()),
                ..e.clone()
            })
            .unwrap();

        let mut edit = EntryEdit::from_entry(store.get(&id).unwrap());
        edit.title = "Y".into();
        edit.snoozed_until = Some(t0() + Duration::hours(1));
        let edited = store.edit_entry(&id, edit, t0()).unwrap();
        assert_eq!(edited.title, "Y");
        assert!(edited.woke_up_at.is_none());

        let mut past = EntryEdit::from_entry(&edited);
        past.snoozed_until = Some(t0());
        assert_eq!(
            store.edit_entry(&id, past, t0()).unwrap_err(),
            ValidationError::SnoozeNotInFuture
        );
    }

    #[test]
    fn edit_without_snooze_keeps_woken_marker() {
        let mut store = store();
        let id = store.add_entry(NewEntry::new(EntryKind::Note, "N"), t0()).unwrap();
        store
            .update(&id, |e| Entry {
                woke_up_at: Some(t0()),
                ..e.clone()
            })
            .unwrap();
        let edit = EntryEdit::from_entry(store.get(&id).unwrap());
        let edited = store.edit_entry(&id, edit, t0()).unwrap();
        assert_eq!(edited.woke_up_at, Some(t0()));
        assert!(edited.snoozed_until.is_none());
    }

    #[test]
    fn edit_cannot_snooze_finished_entries() {
        let mut store = store();
        let id = store.add_entry(NewEntry::new(EntryKind::Task, "Done"), t0()).unwrap();
        store.update(&id, |e| toggle_completion(e, None, t0())).unwrap();
        let saves = store.persistence().save_count();

        let mut edit = EntryEdit::from_entry(store.get(&id).unwrap());
        edit.snoozed_until = Some(t0() + Duration::hours(1));
        assert_eq!(
            store.edit_entry(&id, edit, t0()).unwrap_err(),
            ValidationError::NotSnoozable
        );
        let entry = store.get(&id).unwrap();
        assert!(entry.is_completed);
        assert!(entry.snoozed_until.is_none());
        assert_eq!(store.persistence().save_count(), saves);

        let mut retitle = EntryEdit::from_entry(entry);
        retitle.title = "Done, renamed".into();
        assert_eq!(store.edit_entry(&id, retitle, t0()).unwrap().title, "Done, renamed");
    }

    #[test]
    fn unchanged_update_does_not_save() {
        let mut store = store();
        let id = store.add_entry(NewEntry::new(EntryKind::Note, "N"), t0()).unwrap();
        let saves = store.persistence().save_count();
        store.update(&id, |e| toggle_completion(e, None, t0())).unwrap();
        assert_eq!(store.persistence().save_count(), saves);
    }

    #[test]
    fn remove_and_missing_ids() {
        let mut store = store();
        let id = store.add_entry(NewEntry::new(EntryKind::Task, "X"), t0()).unwrap();
        assert_eq!(store.remove(&id).unwrap().title, "X");
        assert!(store.is_empty());
        assert!(matches!(store.remove(&id), Err(ValidationError::NotFound(_))));
    }

    #[test]
    fn resolves_unique_prefixes() {
        let mut store = store();
        store
            .insert(Entry::with_id(EntryId::new("abc1"), EntryKind::Task, "A", t0()))
            .unwrap();
        store
            .insert(Entry::with_id(EntryId::new("abd2"), EntryKind::Task, "B", t0()))
            .unwrap();
        assert_eq!(store.resolve_id("abc").unwrap(), EntryId::new("abc1"));
        assert_eq!(
            store.resolve_id("ab").unwrap_err(),
            ValidationError::AmbiguousId("ab".into())
        );
        assert!(matches!(store.resolve_id("zz"), Err(ValidationError::NotFound(_))));
        assert!(matches!(
            store.insert(Entry::with_id(EntryId::new("abc1"), EntryKind::Note, "C", t0())),
            Err(StoreError::DuplicateId(_))
        ));
    }

    #[test]
    fn append_generates_fresh_ids() {
        let mut store = store();
        store
            .insert(Entry::with_id(EntryId::new("a"), EntryKind::Task, "A", t0()))
            .unwrap();
        let imported = vec![Entry::with_id(EntryId::new("a"), EntryKind::Task, "A again", t0())];
        assert_eq!(store.append_with_fresh_ids(imported), 1);
        assert_eq!(store.len(), 2);
        assert_ne!(store.entries()[1].id, EntryId::new("a"));
        assert_eq!(store.entries()[1].title, "A again");
    }

    #[test]
    fn reopening_restores_saved_entries() {
        let mut first = store();
        first.add_entry(NewEntry::new(EntryKind::Task, "Kept"), t0()).unwrap();
        let saved = first.persistence().saved();

        let reopened = EntryStore::open(MemoryPersistence::with_entries(saved)).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.entries()[0].title, "Kept");
    }
}
