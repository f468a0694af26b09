use std::io::{BufRead, Write};
use std::path::Path;

use clap::Parser;

use crate::cli::commands::{ShellCommand, ShellLine};
use crate::cli::handlers::{build_task, criterion, edit_request};
use crate::cli::output::print_tasks;
use crate::io::store;
use crate::ops::{Organizer, OrganizerError};

/// Interactive session. One organizer stays alive across commands, so the
/// history actually accumulates and `undo` works; the store is rewritten
/// after every successful mutation.
pub fn run_shell(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut org = store::load(path)?;
    println!("taskdesk shell - {} (quit to leave)", path.display());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("td> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let tokens = tokenize(&line);
        if tokens.is_empty() {
            continue;
        }
        let parsed = match ShellLine::try_parse_from(&tokens) {
            Ok(parsed) => parsed,
            Err(e) => {
                // clap renders usage and help output itself
                print!("{}", e);
                continue;
            }
        };
        match run_line(parsed.command, &mut org, path) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}

/// Execute one parsed line. Returns true when the session should end.
fn run_line(
    command: ShellCommand,
    org: &mut Organizer,
    path: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        ShellCommand::Add(args) => {
            let task = build_task(args);
            let title = task
                .resolve_base()
                .map_err(OrganizerError::from)?
                .title
                .clone();
            org.add(task)?;
            store::save(org, path)?;
            println!("added \"{}\"", title);
        }
        ShellCommand::List => print_tasks(org.tasks()),
        ShellCommand::Show(args) => {
            let task = org
                .find_by_title(&args.title)
                .ok_or(OrganizerError::NotFound(args.title))?;
            println!("{}", task.render());
        }
        ShellCommand::Edit(args) => {
            let request = edit_request(&args);
            org.edit(&args.title, request)?;
            store::save(org, path)?;
            println!(
                "edited \"{}\"",
                args.new_title.as_deref().unwrap_or(&args.title)
            );
        }
        ShellCommand::Done(args) => {
            org.complete(&args.title)?;
            store::save(org, path)?;
            println!("completed \"{}\"", args.title);
        }
        ShellCommand::Rm(args) => {
            org.remove(&args.title)?;
            store::save(org, path)?;
            println!("deleted \"{}\"", args.title);
        }
        ShellCommand::Sort(args) => {
            org.sort(criterion(args.key))?;
            store::save(org, path)?;
            print_tasks(org.tasks());
        }
        ShellCommand::Undo => {
            let label = org.undo()?;
            store::save(org, path)?;
            println!("undid {}", label);
        }
        ShellCommand::Quit => return Ok(true),
    }
    Ok(false)
}

/// Split a shell line into tokens. Single or double quotes group words and
/// may produce empty tokens; an empty edit value is passed through and the
/// edit leaves that field unchanged.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;
    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    quoted = true;
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut current));
                    }
                    quoted = false;
                }
                _ => current.push(c),
            },
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("add  title   desc"), ["add", "title", "desc"]);
    }

    #[test]
    fn tokenize_groups_quoted_words() {
        assert_eq!(
            tokenize(r#"add "buy milk" 'from the shop'"#),
            ["add", "buy milk", "from the shop"]
        );
    }

    #[test]
    fn tokenize_keeps_quoted_empty_tokens() {
        assert_eq!(tokenize(r#"edit t --description """#), ["edit", "t", "--description", ""]);
    }

    #[test]
    fn tokenize_handles_blank_lines() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn shell_grammar_parses_like_the_cli() {
        let parsed = ShellLine::try_parse_from(["add", "buy milk", "-p", "-r", "tonight"]).unwrap();
        match parsed.command {
            ShellCommand::Add(args) => {
                assert_eq!(args.title, "buy milk");
                assert!(args.priority);
                assert_eq!(args.reminder.as_deref(), Some("tonight"));
                assert_eq!(args.deadline, None);
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn shell_grammar_accepts_quit_alias() {
        assert!(matches!(
            ShellLine::try_parse_from(["exit"]).unwrap().command,
            ShellCommand::Quit
        ));
    }
}
