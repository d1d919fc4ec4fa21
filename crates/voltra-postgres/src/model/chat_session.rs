//! Chat session model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::chat_sessions;

/// A conversation container.
///
/// Created on demand, updated on every message, deleted explicitly by the
/// user. Belongs to exactly one organization and optionally one dashboard.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: i64,
    /// Optional dashboard this session is attached to.
    pub dashboard_id: Option<i64>,
    /// Session title.
    pub title: String,
    /// Content of the most recent message.
    pub last_message: Option<String>,
    /// Number of messages in the session.
    pub message_count: i32,
    /// Timestamp when the session was created.
    pub created_at: Timestamp,
    /// Timestamp when the session was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new chat session.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChatSession {
    /// Owning organization.
    pub organization_id: i64,
    /// Optional dashboard attachment.
    pub dashboard_id: Option<i64>,
    /// Session title.
    pub title: String,
}

/// Data for updating a chat session.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = chat_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateChatSession {
    /// New session title.
    pub title: Option<String>,
    /// New dashboard attachment.
    pub dashboard_id: Option<Option<i64>>,
}

impl NewChatSession {
    /// Creates a new session for an organization.
    pub fn new(organization_id: i64, title: impl Into<String>) -> Self {
        Self {
            organization_id,
            dashboard_id: None,
            title: title.into(),
        }
    }

    /// Attaches the session to a dashboard.
    pub fn with_dashboard(mut self, dashboard_id: i64) -> Self {
        self.dashboard_id = Some(dashboard_id);
        self
    }
}
