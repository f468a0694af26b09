use chrono::{Local, NaiveDateTime, Timelike};

/// Display format for the coarse creation timestamp
pub const MINUTE_FORMAT: &str = "%d/%m/%Y %H:%M";
/// Format for the fine creation timestamp (stable sort key)
pub const EXACT_FORMAT: &str = "%d/%m/%Y %H:%M:%S%.6f";

/// Upper bound on attachment chain length. `Box` ownership cannot form a
/// cycle, but a chain reconstructed from a corrupted store could nest
/// absurdly; the resolvers refuse to walk past this.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// An attachment chain longer than [`MAX_CHAIN_DEPTH`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("attachment chain exceeds {MAX_CHAIN_DEPTH} layers")]
pub struct ChainTooDeep;

/// Task category, shown as a label prefix on render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Work,
    Priority,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Work => "Work",
            TaskKind::Priority => "Priority",
        }
    }
}

/// The base task record every attachment chain terminates at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTask {
    /// Non-empty, unique among live tasks (enforced by the creation path)
    pub title: String,
    pub description: String,
    /// Minute precision, for display
    pub created_at: NaiveDateTime,
    /// Microsecond precision, used only as a stable sort key
    pub created_at_exact: NaiveDateTime,
    pub completed: bool,
    pub kind: TaskKind,
}

impl BaseTask {
    /// Create a pending task stamped with the current local time.
    pub fn new(kind: TaskKind, title: String, description: String) -> Self {
        let now = Local::now().naive_local();
        // Truncate to the precision each field is stored at, so a
        // save/load round-trip reproduces the in-memory value exactly.
        let exact = now
            .with_nanosecond(now.nanosecond() / 1_000 * 1_000)
            .unwrap_or(now);
        let minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        BaseTask {
            title,
            description,
            created_at: minute,
            created_at_exact: exact,
            completed: false,
            kind,
        }
    }

    fn render(&self) -> String {
        let status = if self.completed { "Completed" } else { "Pending" };
        format!(
            "{} Task\nTitle: {}\nDescription: {}\nStatus: {}\nCreated: {}",
            self.kind.label(),
            self.title,
            self.description,
            status,
            self.created_at.format(MINUTE_FORMAT),
        )
    }
}

/// A task as stored in the organizer: a base record, optionally wrapped by
/// reminder and deadline layers. Each layer exclusively owns what it wraps,
/// so the chain is a singly linked list ending at a [`BaseTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Base(BaseTask),
    Reminder { text: String, inner: Box<Task> },
    Deadline { due: String, inner: Box<Task> },
}

impl Task {
    pub fn new(kind: TaskKind, title: String, description: String) -> Self {
        Task::Base(BaseTask::new(kind, title, description))
    }

    /// Wrap this task with a reminder layer.
    pub fn with_reminder(self, text: String) -> Self {
        Task::Reminder {
            text,
            inner: Box::new(self),
        }
    }

    /// Wrap this task with a deadline layer.
    pub fn with_deadline(self, due: String) -> Self {
        Task::Deadline {
            due,
            inner: Box::new(self),
        }
    }

    /// Walk the chain to the base record.
    pub fn resolve_base(&self) -> Result<&BaseTask, ChainTooDeep> {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(base) => return Ok(base),
                Task::Reminder { inner, .. } | Task::Deadline { inner, .. } => cur = inner,
            }
        }
        Err(ChainTooDeep)
    }

    /// Walk the chain to the base record, mutably.
    pub fn resolve_base_mut(&mut self) -> Result<&mut BaseTask, ChainTooDeep> {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(base) => return Ok(base),
                Task::Reminder { inner, .. } | Task::Deadline { inner, .. } => cur = inner,
            }
        }
        Err(ChainTooDeep)
    }

    /// The reminder text, if any layer in the chain carries one.
    pub fn reminder(&self) -> Option<&str> {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(_) => return None,
                Task::Reminder { text, .. } => return Some(text),
                Task::Deadline { inner, .. } => cur = inner,
            }
        }
        None
    }

    /// The deadline, if any layer in the chain carries one.
    pub fn deadline(&self) -> Option<&str> {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(_) => return None,
                Task::Deadline { due, .. } => return Some(due),
                Task::Reminder { inner, .. } => cur = inner,
            }
        }
        None
    }

    /// Replace the reminder text in place. Returns false when the chain has
    /// no reminder layer (the caller decides whether that is an error).
    pub fn set_reminder(&mut self, text: String) -> bool {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(_) => return false,
                Task::Reminder { text: t, .. } => {
                    *t = text;
                    return true;
                }
                Task::Deadline { inner, .. } => cur = inner,
            }
        }
        false
    }

    /// Replace the deadline in place. Returns false when the chain has no
    /// deadline layer.
    pub fn set_deadline(&mut self, due: String) -> bool {
        let mut cur = self;
        for _ in 0..MAX_CHAIN_DEPTH {
            match cur {
                Task::Base(_) => return false,
                Task::Deadline { due: d, .. } => {
                    *d = due;
                    return true;
                }
                Task::Reminder { inner, .. } => cur = inner,
            }
        }
        false
    }

    /// Human-readable multi-line summary. Each layer renders what it wraps
    /// first, then appends its own line, so the base block comes first and
    /// the outermost layer's line comes last.
    pub fn render(&self) -> String {
        match self {
            Task::Base(base) => base.render(),
            Task::Reminder { text, inner } => format!("{}\nReminder: {}", inner.render(), text),
            Task::Deadline { due, inner } => format!("{}\nDeadline: {}", inner.render(), due),
        }
    }
}
