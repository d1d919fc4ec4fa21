//! Chat messages repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{ChatMessage, NewChatMessage};
use crate::types::{MessageStatus, OffsetPagination};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for chat message database operations.
///
/// Messages are append-only; the only legal mutations are the
/// loading -> complete and loading -> error status transitions, enforced by
/// the completion queries filtering on the current status.
pub trait ChatMessageRepository {
    /// Appends a message to a session.
    fn append_chat_message(
        &mut self,
        new_message: NewChatMessage,
    ) -> impl Future<Output = PgResult<ChatMessage>> + Send;

    /// Lists a session's messages in chronological order.
    fn list_session_messages(
        &mut self,
        session_id: Uuid,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<ChatMessage>>> + Send;

    /// Completes a loading message with its final content and metadata.
    fn complete_chat_message(
        &mut self,
        message_id: Uuid,
        content: &str,
        metadata: serde_json::Value,
    ) -> impl Future<Output = PgResult<ChatMessage>> + Send;

    /// Fails a loading message with an error description.
    fn fail_chat_message(
        &mut self,
        message_id: Uuid,
        error: &str,
    ) -> impl Future<Output = PgResult<ChatMessage>> + Send;
}

impl ChatMessageRepository for PgConnection {
    async fn append_chat_message(&mut self, new_message: NewChatMessage) -> PgResult<ChatMessage> {
        use schema::chat_messages;

        let message = diesel::insert_into(chat_messages::table)
            .values(&new_message)
            .returning(ChatMessage::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(message)
    }

    async fn list_session_messages(
        &mut self,
        session_id: Uuid,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<ChatMessage>> {
        use schema::chat_messages::{self, dsl};

        let messages = chat_messages::table
            .filter(dsl::session_id.eq(session_id))
            .order(dsl::created_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(ChatMessage::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(messages)
    }

    async fn complete_chat_message(
        &mut self,
        message_id: Uuid,
        content: &str,
        metadata: serde_json::Value,
    ) -> PgResult<ChatMessage> {
        transition_message(
            self,
            message_id,
            content,
            MessageStatus::Complete,
            metadata,
        )
        .await
    }

    async fn fail_chat_message(&mut self, message_id: Uuid, error: &str) -> PgResult<ChatMessage> {
        transition_message(
            self,
            message_id,
            error,
            MessageStatus::Error,
            serde_json::json!({}),
        )
        .await
    }
}

/// Applies a loading -> terminal status transition.
///
/// The filter on the current `loading` status makes an illegal transition
/// (completing twice, failing a complete message) surface as `NotFound`.
async fn transition_message(
    conn: &mut PgConnection,
    message_id: Uuid,
    content: &str,
    status: MessageStatus,
    metadata: serde_json::Value,
) -> PgResult<ChatMessage> {
    use schema::chat_messages::{self, dsl};

    let message = diesel::update(
        chat_messages::table
            .filter(dsl::id.eq(message_id))
            .filter(dsl::status.eq(MessageStatus::Loading.as_ref())),
    )
    .set((
        dsl::content.eq(content),
        dsl::status.eq(status.as_ref()),
        dsl::metadata.eq(metadata),
    ))
    .returning(ChatMessage::as_returning())
    .get_result(conn)
    .await
    .map_err(PgError::from)?;

    Ok(message)
}
