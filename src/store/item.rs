//! Task item types.

use serde::{Deserialize, Serialize};

/// A single entry in the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    /// Server-generated identifier, never changes once assigned.
    pub id: String,
    /// Free-form title. Empty titles are accepted.
    pub title: String,
    /// Completion flag, `false` on creation.
    pub completed: bool,
}

/// Request payload for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
}

/// Request payload for replacing a task's fields.
///
/// Both fields always overwrite the stored values. A field missing from the
/// request body falls back to its default (`""` / `false`), it does not keep
/// the previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateTask {
    pub title: String,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_item_json_shape() {
        let item = TaskItem {
            id: "1".to_string(),
            title: "Learn OpenTelemetry".to_string(),
            completed: false,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "1", "title": "Learn OpenTelemetry", "completed": false})
        );
    }

    #[test]
    fn test_update_missing_fields_default() {
        let update: UpdateTask = serde_json::from_str("{}").unwrap();
        assert_eq!(update.title, "");
        assert!(!update.completed);

        let update: UpdateTask = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(update.title, "");
        assert!(update.completed);
    }

    #[test]
    fn test_create_requires_title() {
        assert!(serde_json::from_str::<CreateTask>("{}").is_err());
        let create: CreateTask = serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();
        assert_eq!(create.title, "Buy milk");
    }
}
