//! Chat message model.

use std::str::FromStr;

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::chat_messages;
use crate::types::{ChatRole, MessageStatus};

/// A message within a chat session. Append-only.
///
/// Metadata carries the model name, token usage, the routing decision, and
/// any visualization payload produced by the analytical path.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// Parent session.
    pub session_id: Uuid,
    /// Author role, stored as its snake_case string form.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Processing status, stored as its snake_case string form.
    pub status: String,
    /// Additional metadata (JSON).
    pub metadata: serde_json::Value,
    /// Timestamp when the message was created.
    pub created_at: Timestamp,
}

/// Data for creating a new chat message.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChatMessage {
    /// Parent session.
    pub session_id: Uuid,
    /// Author role.
    pub role: String,
    /// Message content.
    pub content: String,
    /// Processing status.
    pub status: String,
    /// Metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Data for completing or failing a message.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateChatMessage {
    /// Final content.
    pub content: Option<String>,
    /// New processing status.
    pub status: Option<String>,
    /// Metadata replacement.
    pub metadata: Option<serde_json::Value>,
}

impl ChatMessage {
    /// Returns the typed author role, if the stored value is recognized.
    pub fn role(&self) -> Option<ChatRole> {
        ChatRole::from_str(&self.role).ok()
    }

    /// Returns the typed processing status, if the stored value is
    /// recognized.
    pub fn status(&self) -> Option<MessageStatus> {
        MessageStatus::from_str(&self.status).ok()
    }
}

impl NewChatMessage {
    /// Creates a complete user message.
    pub fn user(session_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            session_id,
            role: ChatRole::User.as_ref().to_owned(),
            content: content.into(),
            status: MessageStatus::Complete.as_ref().to_owned(),
            metadata: None,
        }
    }

    /// Creates an assistant message in the loading state.
    pub fn assistant_loading(session_id: Uuid) -> Self {
        Self {
            session_id,
            role: ChatRole::Assistant.as_ref().to_owned(),
            content: String::new(),
            status: MessageStatus::Loading.as_ref().to_owned(),
            metadata: None,
        }
    }

    /// Attaches metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_complete() {
        let message = NewChatMessage::user(Uuid::new_v4(), "show usage by month");
        assert_eq!(message.role, "user");
        assert_eq!(message.status, "complete");
    }

    #[test]
    fn test_assistant_message_starts_loading() {
        let message = NewChatMessage::assistant_loading(Uuid::new_v4());
        assert_eq!(message.role, "assistant");
        assert_eq!(message.status, "loading");
    }
}
