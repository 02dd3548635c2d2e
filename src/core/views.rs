use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::entry::{Entry, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    ActiveTasks,
    ActiveNotes,
    CompletedTasks,
    ArchivedNotes,
    Snoozed,
}

impl ViewKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActiveTasks => "Active Tasks",
            Self::ActiveNotes => "Notes",
            Self::CompletedTasks => "Completed Tasks",
            Self::ArchivedNotes => "Archived Notes",
            Self::Snoozed => "Snoozed",
        }
    }
}

/// Project/priority filters applied to the active task and note lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters {
    pub project: Option<String>,
    pub priority: Option<Priority>,
}

impl ActiveFilters {
    pub fn is_empty(&self) -> bool {
        self.project.is_none() && self.priority.is_none()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let project_ok = self
            .project
            .as_ref()
            .is_none_or(|p| entry.project.as_ref() == Some(p));
        let priority_ok = self.priority.is_none_or(|p| entry.priority == p);
        project_ok && priority_ok
    }
}

pub fn is_active_task(entry: &Entry, now: DateTime<Utc>) -> bool {
    entry.is_task() && !entry.is_completed && !entry.is_archived && entry.is_live(now)
}

pub fn is_active_note(entry: &Entry, now: DateTime<Utc>) -> bool {
    entry.is_note() && !entry.is_archived && entry.is_live(now)
}

pub fn is_completed_task(entry: &Entry) -> bool {
    entry.is_task() && entry.is_completed
}

pub fn is_archived_note(entry: &Entry) -> bool {
    entry.is_note() && entry.is_archived
}

/// Every derived list, computed from the canonical sequence at one instant.
///
/// Never kept across a mutation; rebuild after every change.
#[derive(Debug, Clone, Default)]
pub struct EntryViews {
    pub active_tasks: Vec<Entry>,
    pub active_notes: Vec<Entry>,
    pub completed_tasks: Vec<Entry>,
    pub archived_notes: Vec<Entry>,
    pub snoozed: Vec<Entry>,
}

impl EntryViews {
    pub fn build(entries: &[Entry], now: DateTime<Utc>, filters: &ActiveFilters) -> Self {
        let mut views = Self::default();

        for entry in entries {
            if is_active_task(entry, now) {
                if filters.matches(entry) {
                    views.active_tasks.push(entry.clone());
                }
            } else if is_active_note(entry, now) {
                if filters.matches(entry) {
                    views.active_notes.push(entry.clone());
                }
            }
            if is_completed_task(entry) {
                views.completed_tasks.push(entry.clone());
            }
            if is_archived_note(entry) {
                views.archived_notes.push(entry.clone());
            }
            if entry.is_snoozed(now) {
                views.snoozed.push(entry.clone());
            }
        }

        // Stable sorts: ties keep manual order.
        views
            .completed_tasks
            .sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        views
            .archived_notes
            .sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        views.snoozed.sort_by(|a, b| a.snoozed_until.cmp(&b.snoozed_until));

        views
    }

    pub fn get(&self, kind: ViewKind) -> &[Entry] {
        match kind {
            ViewKind::ActiveTasks => &self.active_tasks,
            ViewKind::ActiveNotes => &self.active_notes,
            ViewKind::CompletedTasks => &self.completed_tasks,
            ViewKind::ArchivedNotes => &self.archived_notes,
            ViewKind::Snoozed => &self.snoozed,
        }
    }

    pub fn counts(&self) -> ViewCounts {
        ViewCounts {
            active_tasks: self.active_tasks.len(),
            active_notes: self.active_notes.len(),
            completed_tasks: self.completed_tasks.len(),
            archived_notes: self.archived_notes.len(),
            snoozed: self.snoozed.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewCounts {
    pub active_tasks: usize,
    pub active_notes: usize,
    pub completed_tasks: usize,
    pub archived_notes: usize,
    pub snoozed: usize,
}

/// Projects in use by active or snoozed entries, sorted. Feeds autocomplete.
pub fn known_projects(entries: &[Entry], now: DateTime<Utc>) -> Vec<String> {
    entries
        .iter()
        .filter(|e| {
            let open = (e.is_task() && !e.is_completed) || (e.is_note() && !e.is_archived);
            open || e.is_snoozed(now)
        })
        .filter_map(|e| e.project.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn unfiltered_active(entries: &[Entry], now: DateTime<Utc>, view: ViewKind) -> Vec<&Entry> {
    entries
        .iter()
        .filter(|e| match view {
            ViewKind::ActiveNotes => is_active_note(e, now),
            _ => is_active_task(e, now),
        })
        .collect()
}

/// Distinct projects across the unfiltered active task (or note) list.
pub fn projects_in_view(entries: &[Entry], now: DateTime<Utc>, view: ViewKind) -> Vec<String> {
    unfiltered_active(entries, now, view)
        .into_iter()
        .filter_map(|e| e.project.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn priorities_in_view(entries: &[Entry], now: DateTime<Utc>, view: ViewKind) -> Vec<Priority> {
    unfiltered_active(entries, now, view)
        .into_iter()
        .map(|e| e.priority)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
