//! Client-side query layer: a pure predicate over an already-fetched task
//! snapshot. Never talks to the store; callers re-run it whenever the
//! snapshot, the status filter or the search text changes.

use std::str::FromStr;

use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    fn accepts(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "Pending" => Ok(StatusFilter::Only(TaskStatus::Pending)),
            "InProgress" => Ok(StatusFilter::Only(TaskStatus::InProgress)),
            "Done" => Ok(StatusFilter::Only(TaskStatus::Done)),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// True when the task passes both the status filter and the search text.
/// An empty search always matches; otherwise the text must appear,
/// case-insensitively, in at least one of title, description, createdBy
/// or assignedTo.
pub fn matches(task: &Task, status: StatusFilter, search: &str) -> bool {
    if !status.accepts(task.status) {
        return false;
    }
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [
        task.title.as_str(),
        task.description.as_str(),
        task.created_by.as_str(),
        task.assigned_to.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_tasks<'a>(tasks: &'a [Task], status: StatusFilter, search: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| matches(task, status, search))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(title: &str, assigned_to: &str, status: TaskStatus) -> Task {
        Task {
            id: 1,
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            status,
            created_by: "Alice".to_string(),
            assigned_to: assigned_to.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            created_by_id: None,
            assigned_to_id: None,
        }
    }

    #[test]
    fn all_and_empty_search_match_everything() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Done] {
            assert!(matches(&task("anything", "", status), StatusFilter::All, ""));
        }
    }

    #[test]
    fn status_filter_requires_equality() {
        let t = task("Docs", "", TaskStatus::InProgress);
        assert!(matches(&t, StatusFilter::Only(TaskStatus::InProgress), ""));
        assert!(!matches(&t, StatusFilter::Only(TaskStatus::Done), ""));
    }

    #[test]
    fn search_is_case_insensitive_across_four_fields() {
        let mut t = task("Write API docs", "Tech Lead", TaskStatus::Pending);
        t.description = "Covers Every Endpoint".to_string();

        assert!(matches(&t, StatusFilter::All, "api"));
        assert!(matches(&t, StatusFilter::All, "endpoint"));
        assert!(matches(&t, StatusFilter::All, "alice"));
        assert!(matches(&t, StatusFilter::All, "LEAD"));
        assert!(!matches(&t, StatusFilter::All, "unrelated"));
    }

    #[test]
    fn both_conditions_must_hold() {
        let included = task("Review", "Tech Lead", TaskStatus::InProgress);
        let excluded = task("Review", "Tech Lead", TaskStatus::Pending);

        let filter = StatusFilter::Only(TaskStatus::InProgress);
        assert!(matches(&included, filter, "lead"));
        assert!(!matches(&excluded, filter, "lead"));
    }

    #[test]
    fn unrelated_fields_do_not_affect_the_result() {
        let mut t = task("Review", "Tech Lead", TaskStatus::InProgress);
        let before = matches(&t, StatusFilter::Only(TaskStatus::InProgress), "lead");

        t.id = 99;
        t.due_date = Some(Utc::now());
        t.updated_at = Some(Utc::now());
        t.created_by_id = Some(7);
        t.assigned_to_id = Some(8);

        assert_eq!(
            before,
            matches(&t, StatusFilter::Only(TaskStatus::InProgress), "lead")
        );
    }

    #[test]
    fn filter_tasks_keeps_snapshot_order() {
        let tasks = vec![
            task("One", "", TaskStatus::Pending),
            task("Two", "", TaskStatus::Done),
            task("Three", "", TaskStatus::Pending),
        ];

        let filtered = filter_tasks(&tasks, StatusFilter::Only(TaskStatus::Pending), "");
        let titles: Vec<_> = filtered.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["One", "Three"]);
    }

    #[test]
    fn status_filter_parses_from_client_strings() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "InProgress".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(TaskStatus::InProgress))
        );
        assert!("garbage".parse::<StatusFilter>().is_err());
    }
}
