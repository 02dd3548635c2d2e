//! Central state: the entry store, transient highlights and the notifier,
//! driven by `Intent`s and scheduler ticks.

use chrono::{DateTime, Local, Utc};

use crate::core::entry::{Entry, EntryId, EntryKind};
use crate::core::lifecycle;
use crate::core::snooze::SnoozePreset;
use crate::core::views::{ActiveFilters, EntryViews};
use crate::error::{TrackerResult, ValidationError};
use crate::exchange::{self, DataFormat, ImportMode, ImportOutcome};
use crate::intent::{Applied, Intent};
use crate::store::persistence::EntryPersistence;
use crate::store::EntryStore;
use crate::wake::highlight::{HighlightSet, HighlightTicket};
use crate::wake::notify::{wake_body, NotificationPermission, Notifier, WAKE_TITLE};
use crate::wake::{self, WokenEntry};

pub struct Tracker<P: EntryPersistence, N: Notifier> {
    store: EntryStore<P>,
    notifier: N,
    highlights: HighlightSet,
    /// Tickets armed since the last `take_armed_highlights`.
    armed: Vec<HighlightTicket>,
}

impl<P: EntryPersistence, N: Notifier> Tracker<P, N> {
    pub fn new(store: EntryStore<P>, mut notifier: N) -> Self {
        if notifier.permission() == NotificationPermission::Default {
            let answer = notifier.request_permission();
            log::info!("Notification permission: {:?}", answer);
        }
        Self {
            store,
            notifier,
            highlights: HighlightSet::new(),
            armed: Vec::new(),
        }
    }

    pub fn store(&self) -> &EntryStore<P> {
        &self.store
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn resolve_id(&self, query: &str) -> Result<EntryId, ValidationError> {
        self.store.resolve_id(query)
    }

    pub fn views(&self, now: DateTime<Utc>, filters: &ActiveFilters) -> EntryViews {
        self.store.views(now, filters)
    }

    pub fn handle(&mut self, intent: Intent, now: DateTime<Utc>) -> TrackerResult<Applied> {
        let applied = match intent {
            Intent::Add(new) => Applied::Added(self.store.add_entry(new, now)?),
            Intent::Edit(id, edit) => Applied::Updated(self.store.edit_entry(&id, edit, now)?),
            Intent::Delete(id) => {
                let removed = self.store.remove(&id)?;
                self.highlights.clear(&id);
                Applied::Deleted(removed)
            }
            Intent::ToggleCompletion { id, notes } => {
                Applied::Updated(self.toggle_completion(&id, notes.as_deref(), now)?)
            }
            Intent::ToggleArchive(id) => Applied::Updated(self.toggle_archive(&id, now)?),
            Intent::SnoozeUntil(id, until) => Applied::Updated(self.snooze(&id, until, now)?),
            Intent::SnoozePreset(id, preset) => {
                Applied::Updated(self.snooze_preset(&id, preset, now)?)
            }
            Intent::Unsnooze(id) => Applied::Updated(self.unsnooze(&id, now)?),
            Intent::Reorder {
                dragged,
                target,
                placement,
            } => Applied::Reordered(self.store.reorder(&dragged, &target, placement, now)),
            Intent::Import { outcome, mode } => {
                let dropped = outcome.dropped;
                let accepted = self.import(outcome, mode);
                Applied::Imported { accepted, dropped }
            }
            Intent::Tick => Applied::Woken(self.tick(now)),
        };
        Ok(applied)
    }

    fn require_kind(
        &self,
        id: &EntryId,
        kind: EntryKind,
        action: &'static str,
    ) -> Result<(), ValidationError> {
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if entry.kind != kind {
            return Err(ValidationError::NotApplicable {
                action,
                kind: entry.kind,
            });
        }
        Ok(())
    }

    pub fn toggle_completion(
        &mut self,
        id: &EntryId,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Entry, ValidationError> {
        self.require_kind(id, EntryKind::Task, "Completion")?;
        let entry = self
            .store
            .update(id, |e| lifecycle::toggle_completion(e, notes, now))?;
        log::info!("{} {}", if entry.is_completed { "Completed" } else { "Reopened" }, id);
        Ok(entry)
    }

    pub fn toggle_archive(&mut self, id: &EntryId, now: DateTime<Utc>) -> Result<Entry, ValidationError> {
        self.require_kind(id, EntryKind::Note, "Archive")?;
        let entry = self.store.update(id, |e| lifecycle::toggle_archive(e, now))?;
        log::info!("{} {}", if entry.is_archived { "Archived" } else { "Unarchived" }, id);
        Ok(entry)
    }

    pub fn snooze(
        &mut self,
        id: &EntryId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Entry, ValidationError> {
        if until <= now {
            return Err(ValidationError::SnoozeNotInFuture);
        }
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        if entry.is_completed || entry.is_archived {
            return Err(ValidationError::NotSnoozable);
        }
        let entry = self.store.update(id, |e| lifecycle::apply_snooze(e, until))?;
        self.highlights.clear(id);
        log::info!("Snoozed {} until {}", id, until);
        Ok(entry)
    }

    /// Presets are resolved against the local wall clock.
    pub fn snooze_preset(
        &mut self,
        id: &EntryId,
        preset: SnoozePreset,
        now: DateTime<Utc>,
    ) -> Result<Entry, ValidationError> {
        let until = preset
            .resolve(&now.with_timezone(&Local))
            .ok_or(ValidationError::UnresolvablePreset)?;
        self.snooze(id, until, now)
    }

    /// Manual wake. With a deadline present the entry wakes now and is
    /// highlighted; without one only the woken marker is cleared.
    pub fn unsnooze(&mut self, id: &EntryId, now: DateTime<Utc>) -> Result<Entry, ValidationError> {
        let had_deadline = self
            .store
            .get(id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?
            .snoozed_until
            .is_some();
        let entry = self.store.update(id, |e| lifecycle::wake(e, now))?;
        if had_deadline {
            self.arm_highlight(id.clone());
        }
        log::info!("Unsnoozed {}", id);
        Ok(entry)
    }

    /// One Wake Scheduler pass: wake elapsed entries in one batch, then
    /// notify and highlight each of them exactly once.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<WokenEntry> {
        let woken = wake::run_pass(&mut self.store, now);
        let notify = self.notifier.permission() == NotificationPermission::Granted;
        for entry in &woken {
            if notify {
                self.notifier.notify(WAKE_TITLE, &wake_body(&entry.title));
            }
            self.arm_highlight(entry.id.clone());
        }
        woken
    }

    fn arm_highlight(&mut self, id: EntryId) {
        let ticket = self.highlights.mark(id);
        self.armed.push(ticket);
    }

    /// Highlights armed since the previous call, for scheduling their expiry.
    pub fn take_armed_highlights(&mut self) -> Vec<HighlightTicket> {
        std::mem::take(&mut self.armed)
    }

    pub fn expire_highlight(&mut self, ticket: &HighlightTicket) -> bool {
        self.highlights.expire(ticket)
    }

    /// Returns the number of entries added to the store.
    pub fn import(&mut self, outcome: ImportOutcome, mode: ImportMode) -> usize {
        let count = outcome.entries.len();
        match mode {
            ImportMode::Overwrite => {
                self.store.replace_all(outcome.entries);
                self.highlights = HighlightSet::new();
                self.armed.clear();
            }
            ImportMode::Merge => {
                self.store.append_with_fresh_ids(outcome.entries);
            }
        }
        log::info!(
            "Imported {} entries ({:?}), {} dropped",
            count,
            mode,
            outcome.dropped
        );
        count
    }

    pub fn export(&self, format: DataFormat) -> TrackerResult<String> {
        let text = exchange::export(format, self.store.entries())?;
        log::info!("Exported {} entries as {}", self.store.len(), format.extension());
        Ok(text)
    }
}
