use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdesk v", env!("CARGO_PKG_VERSION"), " - tasks in one JSON file"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run against a different task file (default: tasks.json)
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List all tasks
    List,
    /// Show task details
    Show(TitleArg),
    /// Edit a task's fields
    Edit(EditArgs),
    /// Mark a task completed
    Done(TitleArg),
    /// Delete a task
    Rm(TitleArg),
    /// Reorder the task list
    Sort(SortArgs),
    /// Undo the most recent change
    Undo,
    /// Interactive session (undo works across commands here)
    Shell,
}

// ---------------------------------------------------------------------------
// Command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title (must be unique)
    pub title: String,
    /// Task description
    #[arg(default_value = "")]
    pub description: String,
    /// Create as a priority task instead of a work task
    #[arg(short, long)]
    pub priority: bool,
    /// Attach a reminder
    #[arg(short, long)]
    pub reminder: Option<String>,
    /// Attach a deadline
    #[arg(short, long)]
    pub deadline: Option<String>,
}

#[derive(Args)]
pub struct TitleArg {
    /// Title of the task to act on
    pub title: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Title of the task to edit
    pub title: String,
    /// New title
    #[arg(long = "title", value_name = "TITLE")]
    pub new_title: Option<String>,
    /// New description
    #[arg(long)]
    pub description: Option<String>,
    /// New reminder text (only applies if the task has a reminder)
    #[arg(long)]
    pub reminder: Option<String>,
    /// New deadline (only applies if the task has a deadline)
    #[arg(long)]
    pub deadline: Option<String>,
}

#[derive(Args)]
pub struct SortArgs {
    /// Sort key
    #[arg(value_enum)]
    pub key: SortKey,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    /// Alphabetical by title, case-insensitive
    Title,
    /// Oldest first
    Created,
    /// Group by task kind
    Kind,
}

// ---------------------------------------------------------------------------
// Shell grammar
// ---------------------------------------------------------------------------

/// One line of the interactive session, parsed with the same grammar as the
/// one-shot subcommands.
#[derive(Parser)]
#[command(name = "", no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand)]
pub enum ShellCommand {
    /// Add a task
    Add(AddArgs),
    /// List all tasks
    List,
    /// Show task details
    Show(TitleArg),
    /// Edit a task's fields
    Edit(EditArgs),
    /// Mark a task completed
    Done(TitleArg),
    /// Delete a task
    Rm(TitleArg),
    /// Reorder the task list
    Sort(SortArgs),
    /// Undo the most recent change
    Undo,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}
