use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "day", about = concat!("daybook v", env!("CARGO_PKG_VERSION"), " - your days as plain checklists"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this storage folder for this run (not remembered)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Read settings from this file instead of the default location
    #[arg(long, global = true)]
    pub settings: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the todos for a day (default: today)
    Show(ShowArgs),
    /// List the days in the timeline with their counts
    Timeline(TimelineArgs),
    /// Add a todo
    Add(AddArgs),
    /// Complete a todo by its number in the day view
    Done(ItemArgs),
    /// Move a completed todo back to the active list
    Undo(ItemArgs),
    /// Permanently delete a todo
    Rm(RmArgs),
    /// Search todo titles by regex
    Search(SearchArgs),
    /// Show or change the storage folder
    Folder(FolderCmd),
    /// Show a day and re-print it whenever the files change
    Watch(ShowArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct ShowArgs {
    /// Day to show: YYYY-MM-DD, today, tomorrow, yesterday, +N or -N
    #[arg(allow_hyphen_values = true)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct TimelineArgs {
    /// Include days with nothing on them
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Todo title
    pub title: String,
    /// Day it was due, today or earlier (default: today)
    #[arg(long, allow_hyphen_values = true)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct ItemArgs {
    /// Number of the todo as shown by `day show`
    pub number: usize,
    /// Day the todo is shown under (default: today; open todos are always
    /// shown under today)
    #[arg(long, allow_hyphen_values = true)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Number of the todo as shown by `day show`
    pub number: usize,
    /// Day the todo is shown under (default: today)
    #[arg(long, allow_hyphen_values = true)]
    pub date: Option<String>,
    /// Delete from the "Done" list instead of "To do"
    #[arg(long)]
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Storage folder
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FolderCmd {
    #[command(subcommand)]
    pub action: Option<FolderAction>,
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// Print the folder in use (default)
    Show,
    /// Store todos in an existing folder from now on
    Set(FolderSetArgs),
    /// Go back to the default folder
    Reset,
}

#[derive(Args)]
pub struct FolderSetArgs {
    /// Path to the folder
    pub path: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this day (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
