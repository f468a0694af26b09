use crate::model::task::Task;
use crate::ops::command::{Command, EditRequest, OrganizerError, SortCriterion};

/// Oldest history entries are evicted past this point
pub const HISTORY_LIMIT: usize = 256;

/// The live task registry: the ordered task sequence plus the history of
/// applied commands, newest last.
#[derive(Debug, Default)]
pub struct Organizer {
    tasks: Vec<Task>,
    history: Vec<Command>,
}

impl Organizer {
    pub fn new() -> Self {
        Organizer::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Task with the given resolved base title, if present. Entries whose
    /// chain cannot be resolved are skipped.
    pub fn find_by_title(&self, title: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|t| t.resolve_base().is_ok_and(|b| b.title == title))
    }

    pub fn add(&mut self, task: Task) -> Result<(), OrganizerError> {
        self.run(Command::create(task))
    }

    pub fn remove(&mut self, title: &str) -> Result<(), OrganizerError> {
        self.run(Command::delete(title))
    }

    pub fn edit(&mut self, title: &str, request: EditRequest) -> Result<(), OrganizerError> {
        self.run(Command::edit(title, request))
    }

    pub fn complete(&mut self, title: &str) -> Result<(), OrganizerError> {
        self.run(Command::complete(title))
    }

    pub fn sort(&mut self, criterion: SortCriterion) -> Result<(), OrganizerError> {
        self.run(Command::sort(criterion))
    }

    /// Reverse the most recent applied command. Returns its label for
    /// user-facing feedback.
    pub fn undo(&mut self) -> Result<&'static str, OrganizerError> {
        let mut cmd = self.history.pop().ok_or(OrganizerError::EmptyHistory)?;
        match cmd.reverse(&mut self.tasks) {
            Ok(()) => Ok(cmd.label()),
            Err(e) => {
                // A failed reversal leaves the command on the stack so the
                // problem is visible on the next attempt too.
                self.history.push(cmd);
                Err(e)
            }
        }
    }

    /// Append a task restored from storage. Loading is not a command: it
    /// bypasses both the history and the duplicate-title check, so a file
    /// whose records collide on title still loads in full.
    pub fn insert_loaded(&mut self, task: Task) {
        self.tasks.push(task);
    }

    fn run(&mut self, mut cmd: Command) -> Result<(), OrganizerError> {
        cmd.apply(&mut self.tasks)?;
        self.history.push(cmd);
        if self.history.len() > HISTORY_LIMIT {
            self.history.drain(..self.history.len() - HISTORY_LIMIT);
        }
        Ok(())
    }
}
