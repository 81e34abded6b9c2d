use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ServiceError;

/// Workflow state of a ticket.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    InProgress,
    Completed,
    InReview,
    Assigned,
    Deferred,
    Rejected,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::InReview,
        TicketStatus::Assigned,
        TicketStatus::Deferred,
        TicketStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::InReview => "in_review",
            TicketStatus::Assigned => "assigned",
            TicketStatus::Deferred => "deferred",
            TicketStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TicketStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Err(ServiceError::validation("status is required"));
        }
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == tag)
            .ok_or_else(|| ServiceError::Validation(format!("unknown status '{}'", s.trim())))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    High,
    Medium,
    Low,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 3] = [TicketPriority::High, TicketPriority::Medium, TicketPriority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketPriority::High => "high",
            TicketPriority::Medium => "medium",
            TicketPriority::Low => "low",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TicketPriority {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Err(ServiceError::validation("priority is required"));
        }
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == tag)
            .ok_or_else(|| ServiceError::Validation(format!("unknown priority '{}'", s.trim())))
    }
}

/// A code ticket as held by the store.
///
/// `id`, `author` and `created_at` are fixed at creation. `updated_at` stays
/// `None` until the first successful update.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Option<TicketStatus>,
    pub priority: TicketPriority,
    pub assigned_to: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub due_date: String,
}

impl Ticket {
    /// Case-insensitive substring match over title or description.
    /// `needle` must already be lower-cased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }

    pub fn is_author(&self, identity: &str) -> bool { self.author == identity }

    pub fn is_assignee(&self, identity: &str) -> bool { self.assigned_to == identity }
}

/// Creation payload as received from callers.
///
/// Fields stay loosely typed so a missing or blank value is reported as a
/// validation error rather than a decoding failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTicketInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Creation payload after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub assigned_to: String,
    pub due_date: String,
    pub comments: Option<String>,
    pub status: Option<TicketStatus>,
}

impl NewTicketInput {
    pub fn validate(self) -> Result<ValidatedTicket, ServiceError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("priority", &self.priority)?;
        require("assigned_to", &self.assigned_to)?;
        require("due_date", &self.due_date)?;
        validate_due_date(&self.due_date)?;
        let priority = self.priority.parse::<TicketPriority>()?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(s.parse::<TicketStatus>()?),
        };
        Ok(ValidatedTicket {
            title: self.title,
            description: self.description,
            priority,
            assigned_to: self.assigned_to,
            due_date: self.due_date,
            comments: self.comments,
            status,
        })
    }
}

/// Fields the author may change.
///
/// Required fields: omitted keeps the stored value.
/// Optional fields (`status`, `comments`): omitted keeps, `null` clears, a value sets.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<TicketStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub comments: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl AuthorUpdate {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(description) = &self.description {
            require("description", description)?;
        }
        if let Some(due) = &self.due_date {
            require("due_date", due)?;
            validate_due_date(due)?;
        }
        Ok(())
    }

    /// Field-by-field merge onto `ticket`; untouched fields keep their values.
    pub fn apply_to(self, ticket: &mut Ticket) {
        merge(&mut ticket.title, self.title);
        merge(&mut ticket.description, self.description);
        merge(&mut ticket.status, self.status);
        merge(&mut ticket.priority, self.priority);
        merge(&mut ticket.comments, self.comments);
        merge(&mut ticket.due_date, self.due_date);
    }
}

/// Fields the assignee may change.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssigneeUpdate {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<TicketStatus>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub comments: Option<Option<String>>,
}

impl AssigneeUpdate {
    pub fn apply_to(self, ticket: &mut Ticket) {
        merge(&mut ticket.status, self.status);
        merge(&mut ticket.comments, self.comments);
    }
}

fn merge<T>(slot: &mut T, patch: Option<T>) {
    if let Some(v) = patch {
        *slot = v;
    }
}

/// Present-but-null becomes `Some(None)`; absence is handled by `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Accepts a calendar date (`2025-01-01`) or an RFC 3339 timestamp.
pub fn validate_due_date(value: &str) -> Result<(), ServiceError> {
    let v = value.trim();
    if NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(v).is_ok() {
        return Ok(());
    }
    Err(ServiceError::Validation(format!("due_date '{}' is not a valid date", v)))
}
