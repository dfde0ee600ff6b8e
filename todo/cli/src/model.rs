//! Wire types shared with the todo server.
//!
//! Field names are camelCase and enums travel as their integer codes, matching the
//! server's JSON representation.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Error returned when a server sends an enum code this client does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    kind: &'static str,
    code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(try_from = "i32", into = "i32")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl TryFrom<i32> for Priority {
    type Error = UnknownCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Medium),
            2 => Ok(Priority::High),
            _ => Err(UnknownCode {
                kind: "priority",
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(try_from = "i32", into = "i32")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    pub fn label(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
            RecurrenceType::Monthly => "Monthly",
            RecurrenceType::Yearly => "Yearly",
        }
    }
}

impl From<RecurrenceType> for i32 {
    fn from(kind: RecurrenceType) -> Self {
        match kind {
            RecurrenceType::Daily => 0,
            RecurrenceType::Weekly => 1,
            RecurrenceType::Monthly => 2,
            RecurrenceType::Yearly => 3,
        }
    }
}

impl TryFrom<i32> for RecurrenceType {
    type Error = UnknownCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RecurrenceType::Daily),
            1 => Ok(RecurrenceType::Weekly),
            2 => Ok(RecurrenceType::Monthly),
            3 => Ok(RecurrenceType::Yearly),
            _ => Err(UnknownCode {
                kind: "recurrence",
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub todo_id: i32,
}

/// A todo as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_completed: bool,
    pub created_date: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub last_completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

/// Todo fields sent on create, update and import.
///
/// Also reads back an exported file, since unknown fields such as `createdDate` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub category: String,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_interval: Option<i32>,
    pub next_due_date: Option<DateTime<Utc>>,
    pub last_completed_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentInput>,
}

impl From<&Todo> for TodoInput {
    /// Full-replace body for `todo`, keeping its id.
    fn from(todo: &Todo) -> Self {
        Self {
            id: Some(todo.id),
            title: todo.title.clone(),
            description: todo.description.clone(),
            is_completed: todo.is_completed,
            priority: Some(todo.priority),
            category: todo.category.clone(),
            recurrence_type: todo.recurrence_type,
            recurrence_interval: todo.recurrence_interval,
            next_due_date: todo.next_due_date,
            last_completed_date: todo.last_completed_date,
            comments: Vec::new(),
        }
    }
}

/// Listing request: the active filters plus the 1-based page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub search: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

impl ListQuery {
    /// Query string pairs for `GET /todos`, skipping filters that are not set.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", i32::from(priority).to_string()));
        }
        if let Some(is_completed) = self.is_completed {
            pairs.push(("isCompleted", is_completed.to_string()));
        }
        pairs
    }
}

/// One page of todos with the totals reported in the response headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub total_count: u32,
    pub total_pages: u32,
}
