use serde_json::{Map, Value};

use super::{ImportOutcome, RawRecord, RecordError, RecordResult};
use crate::core::entry::Entry;
use crate::error::{ExportError, ImportError};

pub fn to_json(entries: &[Entry]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// The top level must be an array; each element is decoded on its own.
pub fn parse(content: &str) -> Result<ImportOutcome, ImportError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray);
    };
    Ok(ImportOutcome::collect(items.iter().map(decode_record)))
}

pub fn decode_record(value: &Value) -> RecordResult {
    let Value::Object(obj) = value else {
        return Err(RecordError::NotAnObject);
    };
    let raw = RawRecord {
        id: required_string(obj, "id")?,
        title: required_string(obj, "title")?,
        kind: required_string(obj, "type")?,
        created_at: required_string(obj, "createdAt")?,
        is_completed: match obj.get("isCompleted") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                return Err(RecordError::WrongType {
                    field: "isCompleted",
                    expected: "boolean",
                });
            }
        },
        details: text(obj, "details"),
        completed_at: text(obj, "completedAt"),
        completion_notes: text(obj, "completionNotes"),
        due_date: text(obj, "dueDate"),
        contact: text(obj, "contact"),
        url: text(obj, "url"),
        is_archived: obj.get("isArchived").and_then(Value::as_bool),
        archived_at: text(obj, "archivedAt"),
        project: text(obj, "project"),
        priority: text(obj, "priority"),
        snoozed_until: text(obj, "snoozedUntil"),
        woke_up_at: text(obj, "wokeUpAt"),
    };
    raw.decode()
}

/// Absent or null is `Ok(None)`; the missing-field check happens in `decode`.
fn required_string(obj: &Map<String, Value>, field: &'static str) -> Result<Option<String>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
