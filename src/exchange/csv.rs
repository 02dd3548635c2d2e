use ::csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::collections::HashMap;

use super::{format_due_date, format_timestamp, ImportOutcome, RawRecord, RecordError};
use crate::core::entry::Entry;
use crate::error::{ExportError, ImportError};

/// Export column order.
pub const COLUMNS: [&str; 17] = [
    "id",
    "title",
    "details",
    "type",
    "createdAt",
    "isCompleted",
    "completedAt",
    "completionNotes",
    "dueDate",
    "contact",
    "url",
    "isArchived",
    "archivedAt",
    "project",
    "priority",
    "snoozedUntil",
    "wokeUpAt",
];

/// Columns an import header must carry: everything through `project`.
pub const REQUIRED_COLUMNS: &[&str] = COLUMNS.split_at(14).0;

fn row(entry: &Entry) -> [String; 17] {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let ts = |v: &Option<chrono::DateTime<chrono::Utc>>| {
        v.as_ref().map(format_timestamp).unwrap_or_default()
    };
    [
        entry.id.to_string(),
        entry.title.clone(),
        opt(&entry.details),
        entry.kind.as_keyword().to_string(),
        format_timestamp(&entry.created_at),
        entry.is_completed.to_string(),
        ts(&entry.completed_at),
        opt(&entry.completion_notes),
        entry.due_date.as_ref().map(format_due_date).unwrap_or_default(),
        opt(&entry.contact),
        opt(&entry.url),
        entry.is_archived.to_string(),
        ts(&entry.archived_at),
        opt(&entry.project),
        entry.priority.as_keyword().to_string(),
        ts(&entry.snoozed_until),
        ts(&entry.woke_up_at),
    ]
}

/// Header line plus one line per entry. Fields are quoted only when they
/// hold a separator, quote or line break.
pub fn to_csv(entries: &[Entry]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for entry in entries {
        writer.write_record(&row(entry))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ::csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// A quoted field left open runs to the end of the input, so only the last
/// record can carry one. An odd quote count means it never closed.
fn ends_inside_quotes(content: &str, record: &StringRecord) -> bool {
    let start = record.position().map_or(0, |p| p.byte() as usize);
    content
        .get(start..)
        .is_some_and(|tail| tail.matches('"').count() % 2 == 1)
}

pub fn parse(content: &str) -> Result<ImportOutcome, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());
    let header = reader.headers()?.clone();
    if is_blank(&header) {
        return Err(ImportError::EmptyCsv);
    }
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        log::error!("CSV import rejected, missing columns: {:?}", missing);
        return Err(ImportError::MissingColumns(missing));
    }

    let records: Vec<_> = reader.records().collect();
    let last = records.len().saturating_sub(1);
    let results = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match record {
            Err(e) => Some(Err(RecordError::Malformed(e.to_string()))),
            Ok(record) if is_blank(&record) => None,
            Ok(record) if i == last && ends_inside_quotes(content, &record) => Some(Err(
                RecordError::Malformed("unterminated quoted field".to_string()),
            )),
            Ok(record) => Some(raw_record(&columns, &record).decode()),
        });
    Ok(ImportOutcome::collect(results))
}

fn raw_record(columns: &HashMap<String, usize>, record: &StringRecord) -> RawRecord {
    let get = |name: &str| {
        columns
            .get(name)
            .and_then(|&i| record.get(i))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let flag = |name: &str| get(name).map(|v| v.trim().eq_ignore_ascii_case("true"));

    RawRecord {
        id: get("id"),
        title: get("title"),
        details: get("details"),
        kind: get("type"),
        created_at: get("createdAt"),
        is_completed: flag("isCompleted"),
        completed_at: get("completedAt"),
        completion_notes: get("completionNotes"),
        due_date: get("dueDate"),
        contact: get("contact"),
        url: get("url"),
        is_archived: flag("isArchived"),
        archived_at: get("archivedAt"),
        project: get("project"),
        priority: get("priority"),
        snoozed_until: get("snoozedUntil"),
        woke_up_at: get("wokeUpAt"),
    }
}
