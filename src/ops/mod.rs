pub mod command;
pub mod organizer;

pub use command::{Command, CommandState, EditRequest, OrganizerError, SortCriterion};
pub use organizer::Organizer;
