use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque entry identifier. Fresh ids are UUID v4 strings, imported ids are
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "TASK")]
    Task,
    #[serde(rename = "NOTE")]
    Note,
}

impl EntryKind {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Note => "NOTE",
        }
    }

    /// Exact, case-sensitive match against the wire keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "TASK" => Some(Self::Task),
            "NOTE" => Some(Self::Note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Normal => "NORMAL",
            Self::Low => "LOW",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "CRITICAL" => Some(Self::Critical),
            "HIGH" => Some(Self::High),
            "NORMAL" => Some(Self::Normal),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }

    /// Upper-cases the input first; anything unrecognized becomes `Normal`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_keyword(&s.trim().to_uppercase()).unwrap_or_default()
    }
}

/// A task or note. Field order follows the export column order.
///
/// Lifecycle fields are only ever changed through `core::lifecycle`, which keeps
/// completion, archive and snooze state mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub woke_up_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(kind: EntryKind, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_id(EntryId::generate(), kind, title, now)
    }

    pub fn with_id(
        id: EntryId,
        kind: EntryKind,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            details: None,
            kind,
            created_at,
            is_completed: false,
            completed_at: None,
            completion_notes: None,
            due_date: None,
            contact: None,
            url: None,
            is_archived: false,
            archived_at: None,
            project: None,
            priority: Priority::Normal,
            snoozed_until: None,
            woke_up_at: None,
        }
    }

    pub fn is_task(&self) -> bool {
        self.kind == EntryKind::Task
    }

    pub fn is_note(&self) -> bool {
        self.kind == EntryKind::Note
    }

    /// Live entries are visible in the active lists: not snoozed into the future.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_none_or(|until| until <= now)
    }

    pub fn is_snoozed(&self, now: DateTime<Utc>) -> bool {
        !self.is_live(now)
    }

    /// The scheduler's wake condition: a deadline exists and has elapsed.
    pub fn is_wake_due(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until <= now)
    }
}
