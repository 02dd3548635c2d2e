use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "vtasks", about = "Tasks and notes that can be snoozed until they matter", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use a different entry file
    #[arg(long, global = true)]
    pub data: Option<String>,

    /// Use a different config file
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task (or a note with --note)
    Add(AddArgs),
    /// List one view of the entries
    List(ListArgs),
    /// List projects in use, or the filter choices of the tasks/notes view
    Projects(ProjectsArgs),
    /// Show every field of an entry
    Show(IdArgs),
    /// Change fields of an entry
    Edit(EditArgs),
    /// Toggle completion of a task
    Complete(CompleteArgs),
    /// Toggle archive of a note
    Archive(IdArgs),
    /// Hide an entry until a time
    Snooze(SnoozeArgs),
    /// Wake an entry now, or clear its woken marker
    Unsnooze(IdArgs),
    /// Permanently delete an entry
    Delete(IdArgs),
    /// Move an entry next to another one in the same list
    Move(MoveArgs),
    /// Export all entries to JSON or CSV
    Export(ExportArgs),
    /// Import entries from a .json or .csv file
    Import(ImportArgs),
    /// Run the wake scheduler until interrupted
    Watch,
}

#[derive(Args)]
pub struct IdArgs {
    /// Entry id or unique id prefix
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub title: String,
    /// Create a note instead of a task
    #[arg(long)]
    pub note: bool,
    #[arg(long)]
    pub details: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    /// critical, high, normal or low
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ViewArg {
    Tasks,
    Notes,
    Completed,
    Archived,
    Snoozed,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(value_enum, default_value = "tasks")]
    pub view: ViewArg,
    /// Only entries in this project
    #[arg(long)]
    pub project: Option<String>,
    /// Only entries with this priority
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args)]
pub struct ProjectsArgs {
    /// tasks or notes; omit for every project still in use
    #[arg(value_enum)]
    pub view: Option<ViewArg>,
}

#[derive(Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub details: Option<String>,
    /// Due date (YYYY-MM-DD); empty clears it
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// New snooze deadline (RFC 3339 or local "YYYY-MM-DD HH:MM")
    #[arg(long, conflicts_with = "clear_snooze")]
    pub snooze_until: Option<String>,
    /// Drop the snooze deadline
    #[arg(long)]
    pub clear_snooze: bool,
}

#[derive(Args)]
pub struct CompleteArgs {
    pub id: String,
    /// Completion notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct SnoozeArgs {
    pub id: String,
    /// Deadline (RFC 3339 or local "YYYY-MM-DD HH:MM")
    #[arg(long, required_unless_present = "preset", conflicts_with = "preset")]
    pub until: Option<String>,
    /// later-today, tomorrow, day-after-tomorrow, this-weekend or next-week
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    pub id: String,
    /// Place before this entry
    #[arg(long, required_unless_present = "after", conflicts_with = "after")]
    pub before: Option<String>,
    /// Place after this entry
    #[arg(long)]
    pub after: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

#[derive(Args)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value = "json")]
    pub format: FormatArg,
    /// Output path (default: timestamped file in the current directory)
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    pub path: String,
    /// Append with fresh ids instead of replacing everything
    #[arg(long)]
    pub merge: bool,
}
