//! Aggregate completion status of a task list.
//!
//! # Invariants
//! - `InProgress(n)` always carries `n >= 1`.
//! - Classification is recomputed on every call; nothing is cached.

use crate::model::task_list::TaskList;
use serde::{Deserialize, Serialize};

/// Derived completion state of one list.
///
/// Decoding rejects `in_progress` with a zero count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    rename_all = "snake_case",
    tag = "state",
    content = "pending",
    try_from = "RawListStatus"
)]
pub enum ListStatus {
    /// The list owns no tasks.
    Empty,
    /// At least one task is still open; carries the open-task count.
    InProgress(usize),
    /// Every owned task is complete.
    AllDone,
}

/// Wire shape of `ListStatus` before the pending count is checked.
#[derive(Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "pending")]
enum RawListStatus {
    Empty,
    InProgress(usize),
    AllDone,
}

impl TryFrom<RawListStatus> for ListStatus {
    type Error = String;

    fn try_from(value: RawListStatus) -> Result<Self, Self::Error> {
        match value {
            RawListStatus::Empty => Ok(Self::Empty),
            RawListStatus::InProgress(0) => {
                Err("in_progress status requires at least one pending task".to_string())
            }
            RawListStatus::InProgress(count) => Ok(Self::InProgress(count)),
            RawListStatus::AllDone => Ok(Self::AllDone),
        }
    }
}

impl ListStatus {
    /// Number of incomplete tasks represented by this status.
    pub fn pending_count(self) -> usize {
        match self {
            Self::InProgress(count) => count,
            Self::Empty | Self::AllDone => 0,
        }
    }

    /// Stable label for FFI and log fields.
    pub fn kind_label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::InProgress(_) => "in_progress",
            Self::AllDone => "all_done",
        }
    }
}

/// Classifies a list by counting its incomplete tasks.
pub fn classify(list: &TaskList) -> ListStatus {
    if list.tasks.is_empty() {
        return ListStatus::Empty;
    }

    match list.pending_count() {
        0 => ListStatus::AllDone,
        pending => ListStatus::InProgress(pending),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, ListStatus};
    use crate::model::task_list::{TaskDraft, TaskListDraft};

    fn list_with(flags: &[bool]) -> crate::model::task_list::TaskList {
        flags
            .iter()
            .enumerate()
            .fold(TaskListDraft::new("l"), |draft, (index, done)| {
                let task = TaskDraft::new(format!("t{index}"), "");
                draft.with_task(if *done { task.completed() } else { task })
            })
            .into_task_list(0)
    }

    #[test]
    fn empty_list_is_empty() {
        assert_eq!(classify(&list_with(&[])), ListStatus::Empty);
    }

    #[test]
    fn counts_only_incomplete_tasks() {
        assert_eq!(
            classify(&list_with(&[false, true, false])),
            ListStatus::InProgress(2)
        );
        assert_eq!(classify(&list_with(&[true, false])), ListStatus::InProgress(1));
    }

    #[test]
    fn all_complete_is_all_done() {
        assert_eq!(classify(&list_with(&[true, true])), ListStatus::AllDone);
        assert_eq!(classify(&list_with(&[true])), ListStatus::AllDone);
    }

    #[test]
    fn pending_count_and_labels() {
        assert_eq!(ListStatus::InProgress(3).pending_count(), 3);
        assert_eq!(ListStatus::AllDone.pending_count(), 0);
        assert_eq!(ListStatus::Empty.kind_label(), "empty");
        assert_eq!(ListStatus::InProgress(1).kind_label(), "in_progress");
        assert_eq!(ListStatus::AllDone.kind_label(), "all_done");
    }

    #[test]
    fn decoding_rejects_in_progress_without_pending_tasks() {
        let zero = serde_json::json!({ "state": "in_progress", "pending": 0 });
        let err = serde_json::from_value::<ListStatus>(zero).unwrap_err();
        assert!(err.to_string().contains("at least one pending task"));

        let two = serde_json::json!({ "state": "in_progress", "pending": 2 });
        assert_eq!(
            serde_json::from_value::<ListStatus>(two).unwrap(),
            ListStatus::InProgress(2)
        );
        let empty = serde_json::json!({ "state": "empty" });
        assert_eq!(
            serde_json::from_value::<ListStatus>(empty).unwrap(),
            ListStatus::Empty
        );
    }
}
