use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Numeric identifiers arrive as GraphQL `ID` strings but are plain integers
/// server side, so every id type accepts both forms.
macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserialize_numeric_id(deserializer).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.trim().trim_start_matches('#').parse().map(Self)
            }
        }
    };
}

numeric_id!(ProjectId);
numeric_id!(TaskId);
numeric_id!(UserId);
numeric_id!(ActivityId);

fn deserialize_numeric_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(value) => Ok(value),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|err| serde::de::Error::custom(format!("invalid id `{text}`: {err}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Column declaration order; also the tie-break order for drop targets.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "Doing",
            Self::Done => "Done",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "TODO" | "TO_DO" => Ok(Self::Todo),
            "IN_PROGRESS" | "DOING" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

/// Decodes a wire status leniently: anything outside the three known values
/// becomes `None` instead of failing the whole task list.
pub(crate) fn deserialize_lenient_status<'de, D>(deserializer: D) -> Result<Option<TaskStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let parsed = TaskStatus::from_str(&value).ok();
        if parsed.is_none() {
            tracing::warn!(status = %value, "unrecognized task status from server");
        }
        parsed
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Assignee {
    pub fn display_name(&self) -> &str {
        match self.first_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.email.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// `None` when the server reported a status outside the known set.
    #[serde(deserialize_with = "deserialize_lenient_status", default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: TaskId(id),
            title: title.into(),
            status: Some(status),
            assignees: Vec::new(),
        }
    }

    pub fn assignee_summary(&self) -> String {
        if self.assignees.is_empty() {
            return "Unassigned".to_string();
        }
        self.assignees
            .iter()
            .map(Assignee::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBoard {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    TaskCreated,
    TaskUpdated,
    TaskMoved,
    TaskDeleted,
    CommentAdded,
    ProjectCreated,
    #[serde(other)]
    Other,
}

impl ActivityAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskUpdated => "TASK_UPDATED",
            Self::TaskMoved => "TASK_MOVED",
            Self::TaskDeleted => "TASK_DELETED",
            Self::CommentAdded => "COMMENT_ADDED",
            Self::ProjectCreated => "PROJECT_CREATED",
            Self::Other => "OTHER",
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Self::TaskCreated => "+",
            Self::TaskUpdated => "~",
            Self::TaskMoved => "⇄",
            Self::TaskDeleted => "✕",
            Self::CommentAdded => "✎",
            Self::ProjectCreated => "✓",
            Self::Other => "•",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: TaskId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: ActivityId,
    pub action: ActivityAction,
    pub description: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub task: Option<TaskRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_parses_wire_and_cli_spellings() {
        assert_eq!(TaskStatus::from_str("TODO"), Ok(TaskStatus::Todo));
        assert_eq!(
            TaskStatus::from_str("in-progress"),
            Ok(TaskStatus::InProgress)
        );
        assert_eq!(TaskStatus::from_str(" done "), Ok(TaskStatus::Done));
        assert!(TaskStatus::from_str("BLOCKED").is_err());
    }

    #[test]
    fn task_status_order_matches_columns() {
        let indexes: Vec<usize> = TaskStatus::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(TaskStatus::Todo < TaskStatus::InProgress);
    }

    #[test]
    fn task_decodes_string_ids_and_unknown_status() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "42",
            "title": "Ship it",
            "status": "ARCHIVED",
            "assignees": [{ "id": "7", "email": "a@example.com", "firstName": "" }]
        }))
        .expect("task should decode");

        assert_eq!(task.id, TaskId(42));
        assert_eq!(task.status, None);
        assert_eq!(task.assignee_summary(), "a@example.com");
    }

    #[test]
    fn assignee_summary_prefers_first_name() {
        let mut task = Task::new(1, "Write docs", TaskStatus::Todo);
        assert_eq!(task.assignee_summary(), "Unassigned");

        task.assignees = vec![
            Assignee {
                id: UserId(1),
                email: "ana@example.com".to_string(),
                first_name: Some("Ana".to_string()),
            },
            Assignee {
                id: UserId(2),
                email: "bo@example.com".to_string(),
                first_name: None,
            },
        ];
        assert_eq!(task.assignee_summary(), "Ana, bo@example.com");
    }

    #[test]
    fn activity_event_decodes_unknown_action_as_other() {
        let event: ActivityEvent = serde_json::from_value(serde_json::json!({
            "id": "3",
            "action": "TASK_ARCHIVED",
            "description": "archived task",
            "userName": "Ana",
            "createdAt": "2024-05-01T10:00:00+02:00",
            "task": null
        }))
        .expect("event should decode");

        assert_eq!(event.action, ActivityAction::Other);
        assert_eq!(event.created_at.to_rfc3339(), "2024-05-01T08:00:00+00:00");
        assert!(event.task.is_none());
    }

    #[test]
    fn task_id_from_str_accepts_hash_prefix() {
        assert_eq!(TaskId::from_str("#12"), Ok(TaskId(12)));
        assert!(TaskId::from_str("abc").is_err());
    }
}
