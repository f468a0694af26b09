mod shell;
pub use shell::run_shell;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::print_tasks;
use crate::io::store;
use crate::model::task::{Task, TaskKind};
use crate::ops::{EditRequest, OrganizerError, SortCriterion};

const DEFAULT_FILE: &str = "tasks.json";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = store_path(cli.file);

    match cli.command {
        Commands::Add(args) => cmd_add(args, &path),
        Commands::List => cmd_list(&path),
        Commands::Show(args) => cmd_show(args, &path),
        Commands::Edit(args) => cmd_edit(args, &path),
        Commands::Done(args) => cmd_done(args, &path),
        Commands::Rm(args) => cmd_rm(args, &path),
        Commands::Sort(args) => cmd_sort(args, &path),
        Commands::Undo => cmd_undo(&path),
        Commands::Shell => run_shell(&path),
    }
}

pub(crate) fn store_path(file: Option<String>) -> PathBuf {
    PathBuf::from(file.unwrap_or_else(|| DEFAULT_FILE.to_string()))
}

pub(crate) fn build_task(args: AddArgs) -> Task {
    let kind = if args.priority {
        TaskKind::Priority
    } else {
        TaskKind::Work
    };
    let mut task = Task::new(kind, args.title, args.description);
    if let Some(reminder) = args.reminder {
        task = task.with_reminder(reminder);
    }
    if let Some(deadline) = args.deadline {
        task = task.with_deadline(deadline);
    }
    task
}

pub(crate) fn edit_request(args: &EditArgs) -> EditRequest {
    EditRequest {
        title: args.new_title.clone(),
        description: args.description.clone(),
        reminder: args.reminder.clone(),
        deadline: args.deadline.clone(),
    }
}

pub(crate) fn criterion(key: SortKey) -> SortCriterion {
    match key {
        SortKey::Title => SortCriterion::ByTitle,
        SortKey::Created => SortCriterion::ByCreation,
        SortKey::Kind => SortCriterion::ByKind,
    }
}

// ---------------------------------------------------------------------------
// One-shot commands: load, mutate, save
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    let task = build_task(args);
    let title = task.resolve_base().map_err(OrganizerError::from)?.title.clone();
    org.add(task)?;
    store::save(&org, path)?;
    println!("added \"{}\"", title);
    Ok(())
}

fn cmd_list(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let org = store::load(path)?;
    print_tasks(org.tasks());
    Ok(())
}

fn cmd_show(args: TitleArg, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let org = store::load(path)?;
    let task = org
        .find_by_title(&args.title)
        .ok_or(OrganizerError::NotFound(args.title))?;
    println!("{}", task.render());
    Ok(())
}

fn cmd_edit(args: EditArgs, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    let request = edit_request(&args);
    org.edit(&args.title, request)?;
    store::save(&org, path)?;
    println!("edited \"{}\"", args.new_title.as_deref().unwrap_or(&args.title));
    Ok(())
}

fn cmd_done(args: TitleArg, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    org.complete(&args.title)?;
    store::save(&org, path)?;
    println!("completed \"{}\"", args.title);
    Ok(())
}

fn cmd_rm(args: TitleArg, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    org.remove(&args.title)?;
    store::save(&org, path)?;
    println!("deleted \"{}\"", args.title);
    Ok(())
}

fn cmd_sort(args: SortArgs, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    org.sort(criterion(args.key))?;
    store::save(&org, path)?;
    print_tasks(org.tasks());
    Ok(())
}

fn cmd_undo(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    // History lives in memory, so a one-shot process has nothing to undo.
    // The shell keeps one organizer alive and can actually honor this.
    let label = org.undo()?;
    store::save(&org, path)?;
    println!("undid {}", label);
    Ok(())
}
