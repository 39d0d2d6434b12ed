// Data models for the task list

use crate::error::ValidationError;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque task identifier
///
/// Backed by a UUIDv7, so ids are derived from the creation timestamp and
/// sort in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh, time-ordered id
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for TaskId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Fixed set of task categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Category {
    Personal,
    Work,
    Study,
    Shopping,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Personal, Category::Work, Category::Study, Category::Shopping];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Personal => "Personal",
            Category::Work => "Work",
            Category::Study => "Study",
            Category::Shopping => "Shopping",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Open for in-place editing. Interaction state only, never persisted.
    #[serde(skip)]
    pub is_editing: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Build a new, pending task from already-validated fields
    pub(crate) fn new(id: TaskId, fields: TaskFields) -> Self {
        Self {
            id,
            text: fields.text,
            is_completed: false,
            is_editing: false,
            category: fields.category,
            priority: fields.priority,
            due_date: fields.due_date,
        }
    }

    /// Replace the mutable fields, keeping id and completion state
    pub(crate) fn apply(&mut self, fields: TaskFields) {
        self.text = fields.text;
        self.category = fields.category;
        self.priority = fields.priority;
        self.due_date = fields.due_date;
        self.is_editing = false;
    }

    /// The editable fields of this task, e.g. to pre-fill an edit form
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            text: self.text.clone(),
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
        }
    }

    /// Pending task whose due date has already passed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < today)
    }
}

// An empty category string means "no category"
fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// User-supplied fields for creating or editing a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub text: String,
    pub category: Option<Category>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl TaskFields {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Check the write-time rules and return the normalized fields
    ///
    /// Text is trimmed and must not be empty. A due date equal to `today`
    /// is accepted; anything earlier is rejected.
    pub fn validate(self, today: NaiveDate) -> Result<Self, ValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }

        match self.due_date {
            Some(due) if due < today => return Err(ValidationError::DueDateInPast { due, today }),
            _ => {}
        }

        Ok(Self {
            text: text.to_string(),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_trims_text() {
        let fields = TaskFields::new("  Buy milk \n").validate(date(2025, 3, 1)).unwrap();
        assert_eq!(fields.text, "Buy milk");
    }

    #[test]
    fn test_validate_rejects_blank_text() {
        assert_eq!(
            TaskFields::new("").validate(date(2025, 3, 1)),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            TaskFields::new(" \t ").validate(date(2025, 3, 1)),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn test_validate_due_date_boundary() {
        let today = date(2025, 3, 1);

        assert!(TaskFields::new("Pay rent").due(today).validate(today).is_ok());
        assert!(TaskFields::new("Pay rent").due(date(2025, 3, 2)).validate(today).is_ok());

        let err = TaskFields::new("Pay rent").due(date(2025, 2, 28)).validate(today).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DueDateInPast {
                due: date(2025, 2, 28),
                today
            }
        );
    }

    #[test]
    fn test_task_serialization_shape() {
        let mut task = Task::new(
            TaskId::generate(),
            TaskFields::new("Read book")
                .category(Category::Study)
                .priority(Priority::High)
                .due(date(2025, 12, 24)),
        );
        task.is_editing = true;

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["text"], "Read book");
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["category"], "Study");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["dueDate"], "2025-12-24");
        assert!(json.get("isEditing").is_none());
    }

    #[test]
    fn test_task_deserialization_defaults() {
        let id = TaskId::generate();
        let json = format!(r#"{{"id":"{}","text":"Call mom","category":"","isEditing":true}}"#, id.as_uuid());

        let task: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task.id, id);
        assert!(!task.is_completed);
        assert!(!task.is_editing);
        assert_eq!(task.category, None);
        assert_eq!(task.priority, Priority::Normal);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let json = format!(r#"{{"id":"{}","text":"x","category":"Hobby"}}"#, TaskId::generate().as_uuid());
        assert!(serde_json::from_str::<Task>(&json).is_err());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("work".parse::<Category>().unwrap(), Category::Work);
        assert_eq!(" SHOPPING ".parse::<Category>().unwrap(), Category::Shopping);
        assert!("hobby".parse::<Category>().is_err());
    }

    #[test]
    fn test_task_id_display_round_trip() {
        let id = TaskId::generate();
        let parsed: TaskId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_task_ids_are_time_ordered() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert!(a < b);
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2025, 3, 10);
        let mut task = Task::new(TaskId::generate(), TaskFields::new("x").due(date(2025, 3, 9)));
        assert!(task.is_overdue(today));

        task.is_completed = true;
        assert!(!task.is_overdue(today));

        task.is_completed = false;
        task.due_date = Some(today);
        assert!(!task.is_overdue(today));
    }
}
