use chrono::NaiveDateTime;

use crate::model::task::{ChainTooDeep, Task};

/// Error type for organizer and command operations
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum OrganizerError {
    #[error("a task titled \"{0}\" already exists")]
    DuplicateTitle(String),
    #[error("task title must not be empty")]
    EmptyTitle,
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("nothing to undo")]
    EmptyHistory,
    #[error("cannot restore the {attachment} of \"{title}\": no value was captured for it")]
    MissingAttachment {
        title: String,
        attachment: &'static str,
    },
    #[error("cannot restore the {attachment} of \"{title}\": the attachment is gone")]
    AttachmentShapeMismatch {
        title: String,
        attachment: &'static str,
    },
    #[error("command in state {state:?} cannot {action}")]
    InvalidCommandState {
        action: &'static str,
        state: CommandState,
    },
    #[error(transparent)]
    InvalidState(#[from] ChainTooDeep),
}

/// How to order the task sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    /// Case-insensitive, on the resolved base title
    ByTitle,
    /// Ascending by the fine-grained creation timestamp
    ByCreation,
    /// By kind label. Tasks of the same kind end up contiguous; the group
    /// order itself is an implementation detail callers should not rely on.
    ByKind,
}

/// Requested field changes for an edit. Empty strings are treated the same
/// as absent values: the field is left alone.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reminder: Option<String>,
    pub deadline: Option<String>,
}

/// Lifecycle of a command: applied exactly once, then reversed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Pending,
    Applied,
    Reversed,
}

/// A recorded mutation of the task sequence, carrying enough captured state
/// to reverse itself exactly.
#[derive(Debug, Clone)]
pub struct Command {
    state: CommandState,
    op: Op,
}

#[derive(Debug, Clone)]
enum Op {
    Create {
        task: Task,
    },
    Delete {
        title: String,
        /// Original position and removed task, captured during apply
        slot: Option<(usize, Task)>,
    },
    Edit(EditDiff),
    Complete {
        title: String,
        /// Pre-apply flag, so reversing an idempotent apply is still exact
        was_completed: bool,
    },
    Sort {
        criterion: SortCriterion,
        /// permutation[new_pos] = old_pos, recorded during apply
        permutation: Vec<usize>,
    },
}

/// Field-level diff for an edit: the requested new values plus the old
/// values captured immediately before anything is touched. An old value is
/// only present when the corresponding edit was requested (and, for
/// attachments, when the chain actually had that layer).
#[derive(Debug, Clone)]
struct EditDiff {
    title: String,
    new_title: Option<String>,
    new_description: Option<String>,
    new_reminder: Option<String>,
    new_deadline: Option<String>,
    old_title: Option<String>,
    old_description: Option<String>,
    old_reminder: Option<String>,
    old_deadline: Option<String>,
}

impl Command {
    pub fn create(task: Task) -> Self {
        Command::pending(Op::Create { task })
    }

    pub fn delete(title: &str) -> Self {
        Command::pending(Op::Delete {
            title: title.to_string(),
            slot: None,
        })
    }

    pub fn edit(title: &str, request: EditRequest) -> Self {
        Command::pending(Op::Edit(EditDiff {
            title: title.to_string(),
            new_title: normalize(request.title),
            new_description: normalize(request.description),
            new_reminder: normalize(request.reminder),
            new_deadline: normalize(request.deadline),
            old_title: None,
            old_description: None,
            old_reminder: None,
            old_deadline: None,
        }))
    }

    pub fn complete(title: &str) -> Self {
        Command::pending(Op::Complete {
            title: title.to_string(),
            was_completed: false,
        })
    }

    pub fn sort(criterion: SortCriterion) -> Self {
        Command::pending(Op::Sort {
            criterion,
            permutation: Vec::new(),
        })
    }

    fn pending(op: Op) -> Self {
        Command {
            state: CommandState::Pending,
            op,
        }
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// Short verb for user-facing messages ("undid create" etc.)
    pub fn label(&self) -> &'static str {
        match &self.op {
            Op::Create { .. } => "create",
            Op::Delete { .. } => "delete",
            Op::Edit(_) => "edit",
            Op::Complete { .. } => "complete",
            Op::Sort { .. } => "sort",
        }
    }

    /// Execute the mutation against the task sequence. Only legal once, on a
    /// pending command; the command stays pending if the mutation fails.
    pub fn apply(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        if self.state != CommandState::Pending {
            return Err(OrganizerError::InvalidCommandState {
                action: "apply",
                state: self.state,
            });
        }
        self.op.apply(tasks)?;
        self.state = CommandState::Applied;
        Ok(())
    }

    /// Undo a previously applied mutation. Only legal once, after `apply`.
    pub fn reverse(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        if self.state != CommandState::Applied {
            return Err(OrganizerError::InvalidCommandState {
                action: "reverse",
                state: self.state,
            });
        }
        self.op.reverse(tasks)?;
        self.state = CommandState::Reversed;
        Ok(())
    }
}

impl Op {
    fn apply(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        match self {
            Op::Create { task } => {
                let title = task.resolve_base()?.title.clone();
                if title.is_empty() {
                    return Err(OrganizerError::EmptyTitle);
                }
                if position_by_title(tasks, &title)?.is_some() {
                    return Err(OrganizerError::DuplicateTitle(title));
                }
                tasks.push(task.clone());
                Ok(())
            }
            Op::Delete { title, slot } => {
                let idx = position_by_title(tasks, title)?
                    .ok_or_else(|| OrganizerError::NotFound(title.clone()))?;
                *slot = Some((idx, tasks.remove(idx)));
                Ok(())
            }
            Op::Edit(diff) => diff.apply(tasks),
            Op::Complete {
                title,
                was_completed,
            } => {
                let idx = position_by_title(tasks, title)?
                    .ok_or_else(|| OrganizerError::NotFound(title.clone()))?;
                let base = tasks[idx].resolve_base_mut()?;
                *was_completed = base.completed;
                // Idempotent: completing a completed task is not an error
                base.completed = true;
                Ok(())
            }
            Op::Sort {
                criterion,
                permutation,
            } => {
                *permutation = apply_sort(tasks, *criterion)?;
                Ok(())
            }
        }
    }

    fn reverse(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        match self {
            Op::Create { task } => {
                let title = task.resolve_base()?.title.clone();
                let idx = position_by_title(tasks, &title)?
                    .ok_or_else(|| OrganizerError::NotFound(title))?;
                tasks.remove(idx);
                Ok(())
            }
            Op::Delete { title, slot } => {
                let (idx, task) = slot
                    .clone()
                    .ok_or_else(|| OrganizerError::NotFound(title.clone()))?;
                // Restore at the original position, not the end
                tasks.insert(idx.min(tasks.len()), task);
                Ok(())
            }
            Op::Edit(diff) => diff.reverse(tasks),
            Op::Complete {
                title,
                was_completed,
            } => {
                let idx = position_by_title(tasks, title)?
                    .ok_or_else(|| OrganizerError::NotFound(title.clone()))?;
                tasks[idx].resolve_base_mut()?.completed = *was_completed;
                Ok(())
            }
            Op::Sort { permutation, .. } => {
                reverse_sort(tasks, permutation);
                Ok(())
            }
        }
    }
}

impl EditDiff {
    fn apply(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        let idx = position_by_title(tasks, &self.title)?
            .ok_or_else(|| OrganizerError::NotFound(self.title.clone()))?;
        let task = &mut tasks[idx];

        // Capture the old values before anything is touched. Attachment
        // values are only captured when the chain actually has the layer;
        // a requested edit on a missing layer is a no-op.
        if self.new_title.is_some() || self.new_description.is_some() {
            let base = task.resolve_base()?;
            if self.new_title.is_some() {
                self.old_title = Some(base.title.clone());
            }
            if self.new_description.is_some() {
                self.old_description = Some(base.description.clone());
            }
        }
        if self.new_reminder.is_some() {
            self.old_reminder = task.reminder().map(str::to_owned);
        }
        if self.new_deadline.is_some() {
            self.old_deadline = task.deadline().map(str::to_owned);
        }

        {
            let base = task.resolve_base_mut()?;
            if let Some(title) = &self.new_title {
                base.title = title.clone();
            }
            if let Some(description) = &self.new_description {
                base.description = description.clone();
            }
        }
        if let Some(reminder) = &self.new_reminder {
            task.set_reminder(reminder.clone());
        }
        if let Some(deadline) = &self.new_deadline {
            task.set_deadline(deadline.clone());
        }
        Ok(())
    }

    fn reverse(&mut self, tasks: &mut Vec<Task>) -> Result<(), OrganizerError> {
        let key = self.new_title.as_deref().unwrap_or(&self.title);
        let idx = position_by_title(tasks, key)?
            .ok_or_else(|| OrganizerError::NotFound(key.to_string()))?;
        let task = &mut tasks[idx];

        {
            let base = task.resolve_base_mut()?;
            if let Some(old) = &self.old_title {
                base.title = old.clone();
            }
            if let Some(old) = &self.old_description {
                base.description = old.clone();
            }
        }

        // An attachment restore is only attempted when that field's edit was
        // requested. The chain shape must match what was captured: a written
        // layer that vanished, or a layer that appeared where none was
        // captured, is corruption and is reported rather than guessed around.
        if self.new_reminder.is_some() {
            match (&self.old_reminder, task.reminder().is_some()) {
                (Some(old), true) => {
                    task.set_reminder(old.clone());
                }
                (Some(_), false) => {
                    return Err(OrganizerError::AttachmentShapeMismatch {
                        title: self.title.clone(),
                        attachment: "reminder",
                    });
                }
                (None, true) => {
                    return Err(OrganizerError::MissingAttachment {
                        title: self.title.clone(),
                        attachment: "reminder",
                    });
                }
                (None, false) => {}
            }
        }
        if self.new_deadline.is_some() {
            match (&self.old_deadline, task.deadline().is_some()) {
                (Some(old), true) => {
                    task.set_deadline(old.clone());
                }
                (Some(_), false) => {
                    return Err(OrganizerError::AttachmentShapeMismatch {
                        title: self.title.clone(),
                        attachment: "deadline",
                    });
                }
                (None, true) => {
                    return Err(OrganizerError::MissingAttachment {
                        title: self.title.clone(),
                        attachment: "deadline",
                    });
                }
                (None, false) => {}
            }
        }
        Ok(())
    }
}

/// Index of the task whose resolved base title matches, scanning in display
/// order.
pub(crate) fn position_by_title(
    tasks: &[Task],
    title: &str,
) -> Result<Option<usize>, ChainTooDeep> {
    for (i, task) in tasks.iter().enumerate() {
        if task.resolve_base()?.title == title {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Stable reorder by the criterion's key. Returns the permutation
/// (new position → old position) needed to undo it.
fn apply_sort(tasks: &mut Vec<Task>, criterion: SortCriterion) -> Result<Vec<usize>, OrganizerError> {
    match criterion {
        SortCriterion::ByTitle => {
            let keys = tasks
                .iter()
                .map(|t| t.resolve_base().map(|b| b.title.to_lowercase()))
                .collect::<Result<Vec<String>, _>>()?;
            Ok(sort_with(tasks, &keys))
        }
        SortCriterion::ByCreation => {
            let keys = tasks
                .iter()
                .map(|t| t.resolve_base().map(|b| b.created_at_exact))
                .collect::<Result<Vec<NaiveDateTime>, _>>()?;
            Ok(sort_with(tasks, &keys))
        }
        SortCriterion::ByKind => {
            let keys = tasks
                .iter()
                .map(|t| t.resolve_base().map(|b| b.kind.label()))
                .collect::<Result<Vec<&'static str>, _>>()?;
            Ok(sort_with(tasks, &keys))
        }
    }
}

fn sort_with<K: Ord>(tasks: &mut Vec<Task>, keys: &[K]) -> Vec<usize> {
    let mut indexed: Vec<(usize, Task)> = std::mem::take(tasks).into_iter().enumerate().collect();
    indexed.sort_by(|a, b| keys[a.0].cmp(&keys[b.0]));
    let permutation = indexed.iter().map(|(i, _)| *i).collect();
    *tasks = indexed.into_iter().map(|(_, t)| t).collect();
    permutation
}

/// Put the sequence back in its pre-sort order.
fn reverse_sort(tasks: &mut Vec<Task>, permutation: &[usize]) {
    let mut restored: Vec<Option<Task>> = (0..tasks.len()).map(|_| None).collect();
    for (new_pos, task) in std::mem::take(tasks).into_iter().enumerate() {
        if let Some(slot) = permutation
            .get(new_pos)
            .and_then(|&old_pos| restored.get_mut(old_pos))
        {
            *slot = Some(task);
        }
    }
    *tasks = restored.into_iter().flatten().collect();
}
