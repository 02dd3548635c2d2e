//! Import/export of the entry set as JSON or CSV.
//!
//! Both importers reduce each foreign record to a `RawRecord` and run it
//! through the same `decode`, which yields either a valid entry or the reason
//! it was dropped. Dropped records are logged and counted, never fatal.

pub mod csv;
pub mod json;

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use std::collections::HashSet;
use std::path::Path;

use crate::core::entry::{Entry, EntryId, EntryKind, Priority};
use crate::core::lifecycle;
use crate::error::{ExportError, ImportError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Chooses the format from the file extension; anything other than
    /// `.json`/`.csv` is refused before the file is read.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_keyword)
            .ok_or_else(|| ValidationError::UnsupportedFileType(path.display().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Imported set replaces the store.
    Overwrite,
    /// Imported entries are appended under fresh ids.
    #[default]
    Merge,
}

/// Why a single record was left out of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    NotAnObject,
    MissingField(&'static str),
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    InvalidKind(String),
    InvalidTimestamp {
        field: &'static str,
        value: String,
    },
    BlankTitle,
    DuplicateId(String),
    Malformed(String),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "record is not an object"),
            Self::MissingField(field) => write!(f, "missing required field `{}`", field),
            Self::WrongType { field, expected } => {
                write!(f, "field `{}` must be a {}", field, expected)
            }
            Self::InvalidKind(kind) => write!(f, "invalid entry type `{}`", kind),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "field `{}` has unparseable timestamp `{}`", field, value)
            }
            Self::BlankTitle => write!(f, "title is blank"),
            Self::DuplicateId(id) => write!(f, "id `{}` already imported", id),
            Self::Malformed(reason) => write!(f, "malformed record: {}", reason),
        }
    }
}

pub type RecordResult = Result<Entry, RecordError>;

/// Untyped field values pulled out of one JSON object or CSV row.
/// Empty text is already mapped to `None`.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub details: Option<String>,
    pub kind: Option<String>,
    pub created_at: Option<String>,
    pub is_completed: Option<bool>,
    pub completed_at: Option<String>,
    pub completion_notes: Option<String>,
    pub due_date: Option<String>,
    pub contact: Option<String>,
    pub url: Option<String>,
    pub is_archived: Option<bool>,
    pub archived_at: Option<String>,
    pub project: Option<String>,
    pub priority: Option<String>,
    pub snoozed_until: Option<String>,
    pub woke_up_at: Option<String>,
}

impl RawRecord {
    /// Validate the minimal field set and build a normalized entry.
    pub fn decode(self) -> RecordResult {
        let id = self.id.ok_or(RecordError::MissingField("id"))?;
        let title = self.title.ok_or(RecordError::MissingField("title"))?;
        let kind_text = self.kind.ok_or(RecordError::MissingField("type"))?;
        let created_text = self.created_at.ok_or(RecordError::MissingField("createdAt"))?;
        let is_completed = self
            .is_completed
            .ok_or(RecordError::MissingField("isCompleted"))?;

        if title.trim().is_empty() {
            return Err(RecordError::BlankTitle);
        }
        let kind = EntryKind::from_keyword(&kind_text)
            .ok_or_else(|| RecordError::InvalidKind(kind_text.clone()))?;
        let created_at =
            parse_timestamp(&created_text).ok_or_else(|| RecordError::InvalidTimestamp {
                field: "createdAt",
                value: created_text.clone(),
            })?;

        let mut entry = Entry::with_id(EntryId::new(id), kind, title, created_at);
        entry.details = self.details;
        entry.is_completed = is_completed;
        entry.completed_at = optional_timestamp("completedAt", self.completed_at);
        entry.completion_notes = self.completion_notes;
        entry.due_date = self.due_date.and_then(|value| {
            let parsed = parse_due_date(&value);
            if parsed.is_none() {
                log::warn!("Ignoring unparseable dueDate `{}` on {}", value, entry.id);
            }
            parsed
        });
        entry.contact = self.contact;
        entry.url = self.url;
        entry.is_archived = self.is_archived.unwrap_or(false);
        entry.archived_at = optional_timestamp("archivedAt", self.archived_at);
        entry.project = self.project;
        entry.priority = self
            .priority
            .map(|p| Priority::parse_lenient(&p))
            .unwrap_or_default();
        entry.snoozed_until = optional_timestamp("snoozedUntil", self.snoozed_until);
        entry.woke_up_at = optional_timestamp("wokeUpAt", self.woke_up_at);

        Ok(lifecycle::normalize(&entry))
    }
}

fn optional_timestamp(field: &str, value: Option<String>) -> Option<DateTime<Utc>> {
    let value = value?;
    let parsed = parse_timestamp(&value);
    if parsed.is_none() {
        log::warn!("Ignoring unparseable {} `{}`", field, value);
    }
    parsed
}

/// Accepts any RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `YYYY-MM-DD`, or the date part of a full timestamp.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn format_due_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Accepted entries plus the number of records that were dropped.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub entries: Vec<Entry>,
    pub dropped: usize,
}

impl ImportOutcome {
    /// Keeps valid records in order. A record reusing an id seen earlier in
    /// the same batch is dropped.
    pub fn collect(results: impl IntoIterator<Item = RecordResult>) -> Self {
        let mut outcome = Self::default();
        let mut seen = HashSet::new();
        for (index, result) in results.into_iter().enumerate() {
            let result = result.and_then(|entry| {
                if seen.insert(entry.id.clone()) {
                    Ok(entry)
                } else {
                    Err(RecordError::DuplicateId(entry.id.to_string()))
                }
            });
            match result {
                Ok(entry) => outcome.entries.push(entry),
                Err(e) => {
                    log::warn!("Skipping imported record {}: {}", index + 1, e);
                    outcome.dropped += 1;
                }
            }
        }
        outcome
    }

    pub fn accepted(&self) -> usize {
        self.entries.len()
    }
}

pub fn parse(format: DataFormat, content: &str) -> Result<ImportOutcome, ImportError> {
    let outcome = match format {
        DataFormat::Json => json::parse(content)?,
        DataFormat::Csv => csv::parse(content)?,
    };
    log::info!(
        "Parsed {} import: {} accepted, {} dropped",
        format.extension(),
        outcome.accepted(),
        outcome.dropped
    );
    Ok(outcome)
}

/// Read and parse an import file once its whole content is available.
pub async fn read_import_file(path: &Path) -> Result<ImportOutcome, ImportError> {
    let format = DataFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse(format, &content)
}

pub fn export(format: DataFormat, entries: &[Entry]) -> Result<String, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::Empty);
    }
    match format {
        DataFormat::Json => json::to_json(entries),
        DataFormat::Csv => csv::to_csv(entries),
    }
}

/// `vtasks-export-YYYYMMDD_HHMMSS.<ext>` in local time.
pub fn export_filename(format: DataFormat, now: &DateTime<Local>) -> String {
    format!(
        "vtasks-export-{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn raw() -> RawRecord {
        RawRecord {
            id: Some("a".into()),
            title: Some("X".into()),
            kind: Some("TASK".into()),
            created_at: Some("2026-03-02T09:00:00.000Z".into()),
            is_completed: Some(false),
            ..RawRecord::default()
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DataFormat::from_path(&PathBuf::from("backup.JSON")).unwrap(),
            DataFormat::Json
        );
        assert_eq!(
            DataFormat::from_path(&PathBuf::from("a/b.csv")).unwrap(),
            DataFormat::Csv
        );
        assert!(matches!(
            DataFormat::from_path(&PathBuf::from("notes.txt")),
            Err(ValidationError::UnsupportedFileType(_))
        ));
        assert!(DataFormat::from_path(&PathBuf::from("noext")).is_err());
    }

    #[test]
    fn decode_minimal_record_applies_defaults() {
        let entry = raw().decode().unwrap();
        assert_eq!(entry.id.as_str(), "a");
        assert_eq!(entry.kind, EntryKind::Task);
        assert_eq!(entry.priority, Priority::Normal);
        assert!(!entry.is_archived);
        assert!(entry.snoozed_until.is_none());
        assert_eq!(
            entry.created_at,
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn decode_rejects_missing_required_fields() {
        let missing_type = RawRecord { kind: None, ..raw() };
        assert_eq!(missing_type.decode(), Err(RecordError::MissingField("type")));
        let missing_flag = RawRecord {
            is_completed: None,
            ..raw()
        };
        assert_eq!(
            missing_flag.decode(),
            Err(RecordError::MissingField("isCompleted"))
        );
        let bad_created = RawRecord {
            created_at: Some("yesterday".into()),
            ..raw()
        };
        assert!(matches!(
            bad_created.decode(),
            Err(RecordError::InvalidTimestamp { .. })
        ));
        let blank = RawRecord {
            title: Some("  ".into()),
            ..raw()
        };
        assert_eq!(blank.decode(), Err(RecordError::BlankTitle));
    }

    #[test]
    fn decode_tolerates_bad_optional_values() {
        let record = RawRecord {
            due_date: Some("someday".into()),
            snoozed_until: Some("soon".into()),
            priority: Some("urgent".into()),
            ..raw()
        };
        let entry = record.decode().unwrap();
        assert!(entry.due_date.is_none());
        assert!(entry.snoozed_until.is_none());
        assert_eq!(entry.priority, Priority::Normal);
    }

    #[test]
    fn due_date_accepts_plain_and_full_forms() {
        let expected = NaiveDate::from_ymd_opt(2026, 4, 1);
        assert_eq!(parse_due_date("2026-04-01"), expected);
        assert_eq!(parse_due_date("2026-04-01T10:00:00Z"), expected);
    }

    #[test]
    fn outcome_counts_drops() {
        let outcome = ImportOutcome::collect(vec![
            raw().decode(),
            Err(RecordError::NotAnObject),
            RawRecord { id: None, ..raw() }.decode(),
        ]);
        assert_eq!(outcome.accepted(), 1);
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn repeated_ids_keep_the_first_record() {
        let first = raw().decode();
        let second = RawRecord {
            title: Some("Second".into()),
            ..raw()
        }
        .decode();
        let outcome = ImportOutcome::collect(vec![first, second]);
        assert_eq!(outcome.accepted(), 1);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.entries[0].title, "X");
    }

    #[test]
    fn export_refuses_empty_set() {
        assert!(matches!(export(DataFormat::Json, &[]), Err(ExportError::Empty)));
        assert!(matches!(export(DataFormat::Csv, &[]), Err(ExportError::Empty)));
    }

    #[test]
    fn export_filename_is_timestamped() {
        let now = Local.with_ymd_and_hms(2026, 3, 2, 7, 5, 9).unwrap();
        assert_eq!(
            export_filename(DataFormat::Csv, &now),
            "vtasks-export-20260302_070509.csv"
        );
    }

    #[tokio::test]
    async fn import_file_checks_extension_before_reading() {
        let err = read_import_file(Path::new("/definitely/missing.xml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Validation(ValidationError::UnsupportedFileType(_))
        ));
    }

    #[tokio::test]
    async fn import_file_reads_whole_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","title":"X","type":"TASK","createdAt":"2026-03-02T09:00:00Z","isCompleted":false}]"#,
        )
        .unwrap();
        let outcome = read_import_file(&path).await.unwrap();
        assert_eq!(outcome.accepted(), 1);
    }
}
