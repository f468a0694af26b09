use crate::model::task::Task;

/// One-line summary for list output: `[x] Priority  title - description`,
/// with any attachments appended in parentheses.
pub fn list_line(task: &Task) -> String {
    let Ok(base) = task.resolve_base() else {
        return "(unreadable task)".to_string();
    };
    let mark = if base.completed { "x" } else { " " };
    let mut line = format!("[{}] {:<8}  {}", mark, base.kind.label(), base.title);
    if !base.description.is_empty() {
        line.push_str(" - ");
        line.push_str(&base.description);
    }
    let mut extras = Vec::new();
    if let Some(r) = task.reminder() {
        extras.push(format!("reminder: {}", r));
    }
    if let Some(d) = task.deadline() {
        extras.push(format!("deadline: {}", d));
    }
    if !extras.is_empty() {
        line.push_str(&format!(" ({})", extras.join(", ")));
    }
    line
}

pub fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no tasks");
        return;
    }
    for (i, task) in tasks.iter().enumerate() {
        println!("{:>3}. {}", i + 1, list_line(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_line_shows_status_kind_and_extras() {
        let task = Task::new(TaskKind::Priority, "ship".into(), "v1".into())
            .with_reminder("soon".into());
        assert_eq!(
            list_line(&task),
            "[ ] Priority  ship - v1 (reminder: soon)"
        );
    }

    #[test]
    fn list_line_marks_completed_tasks() {
        let mut task = Task::new(TaskKind::Work, "done".into(), String::new());
        task.resolve_base_mut().unwrap().completed = true;
        assert_eq!(list_line(&task), "[x] Work      done");
    }
}
