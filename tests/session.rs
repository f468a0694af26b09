use pretty_assertions::assert_eq;
use tempfile::TempDir;

use taskdesk::io::store;
use taskdesk::model::task::{Task, TaskKind};
use taskdesk::ops::{EditRequest, Organizer, OrganizerError, SortCriterion};

fn titles(org: &Organizer) -> Vec<String> {
    org.tasks()
        .iter()
        .map(|t| t.resolve_base().unwrap().title.clone())
        .collect()
}

/// A full working session: build up a list, reorder it, undo part of it, and
/// make sure the file on disk tracks every step.
#[test]
fn session_survives_saves_and_undo() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");

    let mut org = store::load(&path).unwrap();
    assert!(org.tasks().is_empty());

    org.add(Task::new(TaskKind::Work, "write report".into(), "q3 numbers".into()))
        .unwrap();
    org.add(
        Task::new(TaskKind::Priority, "file taxes".into(), "before friday".into())
            .with_deadline("30/04/2026".into()),
    )
    .unwrap();
    org.add(
        Task::new(TaskKind::Work, "call dentist".into(), String::new())
            .with_reminder("after lunch".into()),
    )
    .unwrap();
    store::save(&org, &path).unwrap();

    org.complete("write report").unwrap();
    org.edit(
        "call dentist",
        EditRequest {
            reminder: Some("before lunch".into()),
            ..Default::default()
        },
    )
    .unwrap();
    org.sort(SortCriterion::ByTitle).unwrap();
    store::save(&org, &path).unwrap();

    assert_eq!(titles(&org), ["call dentist", "file taxes", "write report"]);

    // Undo the sort, then the edit
    assert_eq!(org.undo().unwrap(), "sort");
    assert_eq!(titles(&org), ["write report", "file taxes", "call dentist"]);
    assert_eq!(org.undo().unwrap(), "edit");
    assert_eq!(
        org.find_by_title("call dentist").unwrap().reminder(),
        Some("after lunch")
    );
    store::save(&org, &path).unwrap();

    // A fresh load sees the post-undo state, with attachments intact
    let reloaded = store::load(&path).unwrap();
    assert_eq!(titles(&reloaded), titles(&org));
    assert_eq!(
        reloaded.find_by_title("file taxes").unwrap().deadline(),
        Some("30/04/2026")
    );
    assert!(reloaded
        .find_by_title("write report")
        .unwrap()
        .resolve_base()
        .unwrap()
        .completed);

    // The reloaded organizer starts with an empty history
    assert_eq!(reloaded.tasks().len(), 3);
    let mut reloaded = reloaded;
    assert_eq!(reloaded.undo(), Err(OrganizerError::EmptyHistory));
}

/// Rendering reflects completion and layer order after a round-trip.
#[test]
fn render_after_reload_matches_live_render() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");

    let mut org = Organizer::new();
    org.add(
        Task::new(TaskKind::Priority, "release".into(), "cut the tag".into())
            .with_reminder("ping the team".into())
            .with_deadline("26/06/2023".into()),
    )
    .unwrap();
    org.complete("release").unwrap();
    store::save(&org, &path).unwrap();

    let reloaded = store::load(&path).unwrap();
    let live = org.find_by_title("release").unwrap().render();
    let restored = reloaded.find_by_title("release").unwrap().render();
    assert_eq!(restored, live);
    assert!(restored.starts_with("Priority Task\n"));
    assert!(restored.contains("Status: Completed"));
    assert!(restored.ends_with("Deadline: 26/06/2023"));
}
