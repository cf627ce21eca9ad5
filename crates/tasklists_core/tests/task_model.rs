use serde_json::json;
use tasklists_core::{ListStatus, Task, TaskList};

#[test]
fn list_status_serializes_with_state_tag_and_numeric_count() {
    assert_eq!(
        serde_json::to_value(ListStatus::InProgress(3)).unwrap(),
        json!({ "state": "in_progress", "pending": 3 })
    );
    assert_eq!(
        serde_json::to_value(ListStatus::Empty).unwrap(),
        json!({ "state": "empty" })
    );
    assert_eq!(
        serde_json::to_value(ListStatus::AllDone).unwrap(),
        json!({ "state": "all_done" })
    );
}

#[test]
fn task_list_serializes_with_nested_tasks() {
    let mut list = TaskList::new("Trip", 5);
    list.tasks.push(Task::new(list.list_id, "Passport", "drawer", 6));

    let value = serde_json::to_value(&list).unwrap();
    assert_eq!(value["name"], "Trip");
    assert_eq!(value["created_at"], 5);
    assert_eq!(value["tasks"][0]["note"], "drawer");
    assert_eq!(value["tasks"][0]["is_complete"], false);
    assert!(value["tasks"][0]["status_changed_at"].is_null());

    let decoded: TaskList = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, list);
}
