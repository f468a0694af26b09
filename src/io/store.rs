use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::task::{BaseTask, Task, TaskKind, EXACT_FORMAT, MINUTE_FORMAT};
use crate::ops::{Organizer, OrganizerError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed task file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("record {key} has a bad timestamp: {source}")]
    Timestamp {
        key: String,
        source: chrono::ParseError,
    },
    #[error(transparent)]
    Task(#[from] OrganizerError),
}

/// On-disk shape of a single task. Attachments are flattened onto the
/// record; an empty string means the chain has no such layer.
#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    priority: bool,
    title: String,
    description: String,
    created_at: String,
    created_at_exact: String,
    completed: bool,
    reminder: String,
    deadline: String,
}

/// Load the organizer from `path`. A missing or empty file yields an empty
/// organizer, so first runs need no setup.
pub fn load(path: &Path) -> Result<Organizer, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Organizer::new()),
        Err(e) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Organizer::new());
    }

    // IndexMap keeps the records in file order, which is the display order
    let records: IndexMap<String, TaskRecord> = serde_json::from_str(&text)?;
    let mut organizer = Organizer::new();
    for (key, record) in records {
        organizer.insert_loaded(task_from_record(&key, record)?);
    }
    Ok(organizer)
}

/// Write the organizer's tasks to `path`, keyed by position. The file is
/// written to a sibling temp file first and renamed into place, so a crash
/// mid-write never leaves a truncated store.
pub fn save(organizer: &Organizer, path: &Path) -> Result<(), StoreError> {
    let mut records: IndexMap<String, TaskRecord> = IndexMap::new();
    for (i, task) in organizer.tasks().iter().enumerate() {
        records.insert(i.to_string(), record_from_task(task)?);
    }
    let json = serde_json::to_string_pretty(&records)?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
        .map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn task_from_record(key: &str, record: TaskRecord) -> Result<Task, StoreError> {
    let timestamp = |value: &str, format| {
        NaiveDateTime::parse_from_str(value, format).map_err(|source| StoreError::Timestamp {
            key: key.to_string(),
            source,
        })
    };
    let kind = if record.priority {
        TaskKind::Priority
    } else {
        TaskKind::Work
    };
    let base = BaseTask {
        title: record.title,
        description: record.description,
        created_at: timestamp(&record.created_at, MINUTE_FORMAT)?,
        created_at_exact: timestamp(&record.created_at_exact, EXACT_FORMAT)?,
        completed: record.completed,
        kind,
    };
    // Rebuild the chain in the fixed reminder-then-deadline layer order
    let mut task = Task::Base(base);
    if !record.reminder.is_empty() {
        task = task.with_reminder(record.reminder);
    }
    if !record.deadline.is_empty() {
        task = task.with_deadline(record.deadline);
    }
    Ok(task)
}

fn record_from_task(task: &Task) -> Result<TaskRecord, StoreError> {
    let base = task.resolve_base().map_err(OrganizerError::from)?;
    Ok(TaskRecord {
        priority: base.kind == TaskKind::Priority,
        title: base.title.clone(),
        description: base.description.clone(),
        created_at: base.created_at.format(MINUTE_FORMAT).to_string(),
        created_at_exact: base.created_at_exact.format(EXACT_FORMAT).to_string(),
        completed: base.completed,
        reminder: task.reminder().unwrap_or("").to_string(),
        deadline: task.deadline().unwrap_or("").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn work(title: &str) -> Task {
        Task::new(TaskKind::Work, title.into(), "desc".into())
    }

    #[test]
    fn load_missing_file_yields_empty_organizer() {
        let dir = TempDir::new().unwrap();
        let org = load(&dir.path().join("absent.json")).unwrap();
        assert!(org.tasks().is_empty());
    }

    #[test]
    fn load_empty_file_yields_empty_organizer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "").unwrap();
        assert!(load(&path).unwrap().tasks().is_empty());
    }

    #[test]
    fn save_then_load_preserves_tasks_and_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut org = Organizer::new();
        org.add(work("plain")).unwrap();
        org.add(work("reminded").with_reminder("call".into())).unwrap();
        org.add(
            Task::new(TaskKind::Priority, "urgent".into(), "now".into())
                .with_reminder("ping".into())
                .with_deadline("26/06/2023".into()),
        )
        .unwrap();
        org.complete("plain").unwrap();
        save(&org, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.tasks().len(), 3);

        let plain = loaded.find_by_title("plain").unwrap();
        assert!(plain.resolve_base().unwrap().completed);
        assert_eq!(plain.reminder(), None);

        let urgent = loaded.find_by_title("urgent").unwrap();
        let base = urgent.resolve_base().unwrap();
        assert_eq!(base.kind, TaskKind::Priority);
        assert_eq!(urgent.reminder(), Some("ping"));
        assert_eq!(urgent.deadline(), Some("26/06/2023"));

        // File order is display order
        let titles: Vec<_> = loaded
            .tasks()
            .iter()
            .map(|t| t.resolve_base().unwrap().title.clone())
            .collect();
        assert_eq!(titles, ["plain", "reminded", "urgent"]);
    }

    #[test]
    fn save_then_load_preserves_timestamps_exactly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut org = Organizer::new();
        org.add(work("t")).unwrap();
        save(&org, &path).unwrap();

        let loaded = load(&path).unwrap();
        let before = org.find_by_title("t").unwrap().resolve_base().unwrap();
        let after = loaded.find_by_title("t").unwrap().resolve_base().unwrap();
        assert_eq!(before.created_at, after.created_at);
        assert_eq!(before.created_at_exact, after.created_at_exact);
    }

    #[test]
    fn records_are_keyed_by_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut org = Organizer::new();
        org.add(work("a")).unwrap();
        org.add(work("b")).unwrap();
        save(&org, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["0"]["title"], "a");
        assert_eq!(json["1"]["title"], "b");
        assert_eq!(json["0"]["reminder"], "");
    }

    #[test]
    fn load_rejects_bad_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"{"0": {"priority": false, "title": "t", "description": "",
                    "created_at": "not a date", "created_at_exact": "also not",
                    "completed": false, "reminder": "", "deadline": ""}}"#,
        )
        .unwrap();
        assert!(matches!(
            load(&path),
            Err(StoreError::Timestamp { key, .. }) if key == "0"
        ));
    }

    #[test]
    fn load_keeps_records_with_colliding_titles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut org = Organizer::new();
        org.add(work("a")).unwrap();
        save(&org, &path).unwrap();

        // Duplicate the single record under a second key
        let text = std::fs::read_to_string(&path).unwrap();
        let mut json: IndexMap<String, serde_json::Value> =
            serde_json::from_str(&text).unwrap();
        let copy = json["0"].clone();
        json.insert("1".to_string(), copy);
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        // Loading never turns the user away from their own file
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.tasks().len(), 2);
        for task in loaded.tasks() {
            assert_eq!(task.resolve_base().unwrap().title, "a");
        }
    }
}
