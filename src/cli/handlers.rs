use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use vtasks::config::VtasksConfig;
use vtasks::core::entry::{Entry, EntryId, EntryKind, Priority};
use vtasks::core::ordering::Placement;
use vtasks::core::snooze::SnoozePreset;
use vtasks::core::views::{self, ActiveFilters, ViewCounts, ViewKind};
use vtasks::exchange::{self, DataFormat, ImportMode};
use vtasks::intent::{Applied, Intent};
use vtasks::store::persistence::JsonFilePersistence;
use vtasks::store::{EntryEdit, EntryStore, NewEntry};
use vtasks::tracker::Tracker;
use vtasks::wake::notify::LogNotifier;
use vtasks::wake::runtime::spawn_wake_loop;

use super::commands::*;

type CliResult = Result<(), Box<dyn std::error::Error>>;
type CliTracker = Tracker<JsonFilePersistence, LogNotifier>;

pub fn dispatch(cli: Cli, config: VtasksConfig) -> CliResult {
    let data_file = cli
        .data
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_file.clone());
    let store = EntryStore::open(JsonFilePersistence::new(data_file))?;
    let mut tracker = Tracker::new(store, LogNotifier::new(config.notifications));
    let now = Utc::now();

    match cli.command {
        Commands::Add(args) => cmd_add(&mut tracker, args, now),
        Commands::List(args) => cmd_list(&tracker, args, now),
        Commands::Projects(args) => cmd_projects(&tracker, args, now),
        Commands::Show(args) => {
            let id = tracker.resolve_id(&args.id)?;
            if let Some(entry) = tracker.store().get(&id) {
                print_details(entry);
            }
            Ok(())
        }
        Commands::Edit(args) => cmd_edit(&mut tracker, args, now),
        Commands::Complete(args) => {
            let id = tracker.resolve_id(&args.id)?;
            apply(&mut tracker, Intent::ToggleCompletion { id, notes: args.notes }, now)
        }
        Commands::Archive(args) => {
            let id = tracker.resolve_id(&args.id)?;
            apply(&mut tracker, Intent::ToggleArchive(id), now)
        }
        Commands::Snooze(args) => {
            let id = tracker.resolve_id(&args.id)?;
            let intent = match (args.until, args.preset) {
                (Some(until), _) => Intent::SnoozeUntil(id, parse_deadline(&until)?),
                (None, Some(preset)) => Intent::SnoozePreset(
                    id,
                    SnoozePreset::from_keyword(&preset)
                        .ok_or_else(|| format!("unknown snooze preset `{}`", preset))?,
                ),
                (None, None) => return Err("either --until or --preset is required".into()),
            };
            apply(&mut tracker, intent, now)
        }
        Commands::Unsnooze(args) => {
            let id = tracker.resolve_id(&args.id)?;
            apply(&mut tracker, Intent::Unsnooze(id), now)
        }
        Commands::Delete(args) => {
            let id = tracker.resolve_id(&args.id)?;
            apply(&mut tracker, Intent::Delete(id), now)
        }
        Commands::Move(args) => {
            let dragged = tracker.resolve_id(&args.id)?;
            let (target, placement) = match (args.before, args.after) {
                (Some(before), _) => (before, Placement::Before),
                (None, Some(after)) => (after, Placement::After),
                (None, None) => return Err("either --before or --after is required".into()),
            };
            let target = tracker.resolve_id(&target)?;
            apply(
                &mut tracker,
                Intent::Reorder {
                    dragged,
                    target,
                    placement,
                },
                now,
            )
        }
        Commands::Export(args) => cmd_export(&tracker, args),
        Commands::Import(args) => cmd_import(&mut tracker, args, now),
        Commands::Watch => cmd_watch(tracker, &config),
    }
}

fn apply(tracker: &mut CliTracker, intent: Intent, now: DateTime<Utc>) -> CliResult {
    match tracker.handle(intent, now)? {
        Applied::Added(id) => println!("Added {}", id),
        Applied::Updated(entry) => print_line(&entry, now),
        Applied::Deleted(entry) => println!("Deleted {} {}", short_id(&entry.id), entry.title),
        Applied::Reordered(true) => println!("Moved"),
        Applied::Reordered(false) => println!("Not moved: entries are in different lists"),
        Applied::Imported { accepted, dropped } => {
            println!("Imported {} entries", accepted);
            if dropped > 0 {
                println!("Skipped {} invalid records", dropped);
            }
        }
        Applied::Woken(woken) => {
            for entry in woken {
                println!("Woke {} {}", short_id(&entry.id), entry.title);
            }
        }
    }
    Ok(())
}

fn cmd_add(tracker: &mut CliTracker, args: AddArgs, now: DateTime<Utc>) -> CliResult {
    let kind = if args.note { EntryKind::Note } else { EntryKind::Task };
    let mut new = NewEntry::new(kind, args.title);
    new.details = args.details;
    new.due_date = args.due.as_deref().map(parse_due).transpose()?;
    new.contact = args.contact;
    new.url = args.url;
    new.project = args.project;
    new.priority = args.priority.as_deref().map(parse_priority).transpose()?;
    apply(tracker, Intent::Add(new), now)
}

fn cmd_list(tracker: &CliTracker, args: ListArgs, now: DateTime<Utc>) -> CliResult {
    let filters = ActiveFilters {
        project: args.project,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
    };
    let kind = view_kind(args.view);
    let views = tracker.views(now, &filters);
    let entries = views.get(kind);
    println!("{} ({})", kind.label(), entries.len());
    println!("{}", counts_line(&views.counts()));
    for entry in entries {
        print_line(entry, now);
    }
    Ok(())
}

fn cmd_projects(tracker: &CliTracker, args: ProjectsArgs, now: DateTime<Utc>) -> CliResult {
    let Some(view) = args.view else {
        for project in views::known_projects(tracker.entries(), now) {
            println!("{}", project);
        }
        return Ok(());
    };
    let kind = view_kind(view);
    if !matches!(kind, ViewKind::ActiveTasks | ViewKind::ActiveNotes) {
        return Err(format!("{} has no project or priority filter", kind.label()).into());
    }
    let projects = views::projects_in_view(tracker.entries(), now, kind);
    let priorities: Vec<&str> = views::priorities_in_view(tracker.entries(), now, kind)
        .iter()
        .map(|p| p.as_keyword())
        .collect();
    println!("Projects: {}", projects.join(", "));
    println!("Priorities: {}", priorities.join(", "));
    Ok(())
}

fn view_kind(view: ViewArg) -> ViewKind {
    match view {
        ViewArg::Tasks => ViewKind::ActiveTasks,
        ViewArg::Notes => ViewKind::ActiveNotes,
        ViewArg::Completed => ViewKind::CompletedTasks,
        ViewArg::Archived => ViewKind::ArchivedNotes,
        ViewArg::Snoozed => ViewKind::Snoozed,
    }
}

fn counts_line(counts: &ViewCounts) -> String {
    format!(
        "tasks {}, notes {}, completed {}, archived {}, snoozed {}",
        counts.active_tasks,
        counts.active_notes,
        counts.completed_tasks,
        counts.archived_notes,
        counts.snoozed
    )
}

fn cmd_edit(tracker: &mut CliTracker, args: EditArgs, now: DateTime<Utc>) -> CliResult {
    let id = tracker.resolve_id(&args.id)?;
    let current = tracker
        .store()
        .get(&id)
        .ok_or_else(|| format!("entry {} disappeared", id))?;
    let mut edit = EntryEdit::from_entry(current);
    if let Some(title) = args.title {
        edit.title = title;
    }
    if let Some(details) = args.details {
        edit.details = Some(details);
    }
    if let Some(due) = args.due {
        edit.due_date = if due.trim().is_empty() { None } else { Some(parse_due(&due)?) };
    }
    if let Some(contact) = args.contact {
        edit.contact = Some(contact);
    }
    if let Some(url) = args.url {
        edit.url = Some(url);
    }
    if let Some(project) = args.project {
        edit.project = Some(project);
    }
    if let Some(priority) = args.priority {
        edit.priority = parse_priority(&priority)?;
    }
    if let Some(until) = args.snooze_until {
        edit.snoozed_until = Some(parse_deadline(&until)?);
    } else if args.clear_snooze {
        edit.snoozed_until = None;
    } else if edit.snoozed_until.is_some_and(|until| until <= now) {
        // An elapsed deadline can't be re-submitted; leave it to the scheduler.
        edit.snoozed_until = None;
    }
    apply(tracker, Intent::Edit(id, edit), now)
}

fn cmd_export(tracker: &CliTracker, args: ExportArgs) -> CliResult {
    let format = match args.format {
        FormatArg::Json => DataFormat::Json,
        FormatArg::Csv => DataFormat::Csv,
    };
    let text = tracker.export(format)?;
    let path = args
        .out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(exchange::export_filename(format, &Local::now())));
    std::fs::write(&path, text).map_err(|source| vtasks::error::ExportError::Write {
        path: path.clone(),
        source,
    })?;
    println!("Exported {} entries to {}", tracker.entries().len(), path.display());
    Ok(())
}

fn cmd_import(tracker: &mut CliTracker, args: ImportArgs, now: DateTime<Utc>) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(exchange::read_import_file(Path::new(&args.path)))?;
    let mode = if args.merge {
        ImportMode::Merge
    } else {
        ImportMode::Overwrite
    };
    apply(tracker, Intent::Import { outcome, mode }, now)
}

fn cmd_watch(tracker: CliTracker, config: &VtasksConfig) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let tracker = Rc::new(RefCell::new(tracker));
    let every = config.wake_interval();
    let highlight_for = config.highlight_duration();

    local.block_on(&runtime, async move {
        let handle = spawn_wake_loop(Rc::clone(&tracker), every, highlight_for);
        println!("Watching for snoozed entries every {}s, Ctrl-C to stop", every.as_secs());
        let result = tokio::signal::ctrl_c().await;
        handle.stop();
        result
    })?;
    Ok(())
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::from_keyword(&value.trim().to_uppercase())
        .ok_or_else(|| format!("unknown priority `{}`", value))
}

fn parse_due(value: &str) -> Result<chrono::NaiveDate, String> {
    exchange::parse_due_date(value).ok_or_else(|| format!("invalid date `{}`, expected YYYY-MM-DD", value))
}

/// RFC 3339, or a local "YYYY-MM-DD HH:MM" / "YYYY-MM-DDTHH:MM".
fn parse_deadline(value: &str) -> Result<DateTime<Utc>, String> {
    if let Some(dt) = exchange::parse_timestamp(value) {
        return Ok(dt);
    }
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("invalid time `{}`", value))
}

fn short_id(id: &EntryId) -> &str {
    let s = id.as_str();
    s.get(..8).unwrap_or(s)
}

fn print_line(entry: &Entry, now: DateTime<Utc>) {
    let mut line = format!(
        "{}  {:<8}  {}",
        short_id(&entry.id),
        entry.priority.as_keyword(),
        entry.title
    );
    if let Some(project) = &entry.project {
        line.push_str(&format!("  [{}]", project));
    }
    if let Some(due) = entry.due_date {
        line.push_str(&format!("  due {}", due));
    }
    if entry.is_completed {
        line.push_str("  (done)");
    }
    if entry.is_archived {
        line.push_str("  (archived)");
    }
    if let Some(until) = entry.snoozed_until.filter(|u| *u > now) {
        line.push_str(&format!(
            "  snoozed until {}",
            until.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
    }
    if entry.woke_up_at.is_some() {
        line.push_str("  (woke up)");
    }
    println!("{}", line);
}

fn print_details(entry: &Entry) {
    let local = |dt: &DateTime<Utc>| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    println!("id:        {}", entry.id);
    println!("type:      {}", entry.kind.as_keyword());
    println!("title:     {}", entry.title);
    println!("priority:  {}", entry.priority.as_keyword());
    println!("created:   {}", local(&entry.created_at));
    let optional = [
        ("details", entry.details.clone()),
        ("project", entry.project.clone()),
        ("due", entry.due_date.map(|d| d.to_string())),
        ("contact", entry.contact.clone()),
        ("url", entry.url.clone()),
        ("completed", entry.completed_at.as_ref().map(local)),
        ("notes", entry.completion_notes.clone()),
        ("archived", entry.archived_at.as_ref().map(local)),
        ("snoozed", entry.snoozed_until.as_ref().map(local)),
        ("woke up", entry.woke_up_at.as_ref().map(local)),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{:<10} {}", format!("{}:", label), value);
        }
    }
}
