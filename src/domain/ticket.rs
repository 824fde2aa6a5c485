use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Billing,
    Technical,
    Account,
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Billing,
        Category::Technical,
        Category::Account,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Billing => "billing",
            Category::Technical => "technical",
            Category::Account => "account",
            Category::General => "general",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "billing" => Some(Category::Billing),
            "technical" => Some(Category::Technical),
            "account" => Some(Category::Account),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// Lifecycle state of a persisted ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::InProgress,
        Status::Resolved,
        Status::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Some(Status::Open),
            "in_progress" => Some(Status::InProgress),
            "resolved" => Some(Status::Resolved),
            "closed" => Some(Status::Closed),
            _ => None,
        }
    }

    /// Position in the open -> closed lifecycle.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Open => 0,
            Status::InProgress => 1,
            Status::Resolved => 2,
            Status::Closed => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
}

impl Default for TicketDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: Category::General,
            priority: Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ClassificationSuggestion {
    #[serde(rename = "suggested_category")]
    pub category: Category,
    #[serde(rename = "suggested_priority")]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub ai_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_defaults_to_general_medium() {
        let draft = TicketDraft::default();
        assert!(draft.title.is_empty());
        assert!(draft.description.is_empty());
        assert_eq!(draft.category, Category::General);
        assert_eq!(draft.priority, Priority::Medium);
    }

    #[test]
    fn parses_enumerations_leniently() {
        assert_eq!(Category::from_str(" Billing "), Some(Category::Billing));
        assert_eq!(Priority::from_str("CRITICAL"), Some(Priority::Critical));
        assert_eq!(Status::from_str("in progress"), Some(Status::InProgress));
        assert_eq!(Status::from_str("in_progress"), Some(Status::InProgress));
        assert_eq!(Category::from_str("sales"), None);
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn deserializes_ticket_without_ai_response() {
        let ticket: Ticket = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Card declined",
            "description": "My card keeps getting declined at checkout.",
            "category": "billing",
            "priority": "high",
            "status": "open",
            "created_at": "2024-05-01T12:30:00.123456Z"
        }))
        .unwrap();

        assert_eq!(ticket.id, 7);
        assert_eq!(ticket.category, Category::Billing);
        assert_eq!(ticket.status, Status::Open);
        assert!(ticket.ai_response.is_none());
    }

    #[test]
    fn deserializes_classifier_suggestion() {
        let suggestion: ClassificationSuggestion = serde_json::from_str(
            r#"{"suggested_category": "account", "suggested_priority": "low"}"#,
        )
        .unwrap();
        assert_eq!(suggestion.category, Category::Account);
        assert_eq!(suggestion.priority, Priority::Low);
    }
}
