//! Chat sessions repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{ChatSession, NewChatSession, UpdateChatSession};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for chat session database operations.
pub trait ChatSessionRepository {
    /// Creates a new chat session.
    fn create_chat_session(
        &mut self,
        new_session: NewChatSession,
    ) -> impl Future<Output = PgResult<ChatSession>> + Send;

    /// Finds a session by id within an organization.
    fn find_chat_session_by_id(
        &mut self,
        organization_id: i64,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<ChatSession>>> + Send;

    /// Lists an organization's sessions, most recently updated first.
    fn list_chat_sessions(
        &mut self,
        organization_id: i64,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<ChatSession>>> + Send;

    /// Updates session metadata.
    fn update_chat_session(
        &mut self,
        session_id: Uuid,
        updates: UpdateChatSession,
    ) -> impl Future<Output = PgResult<ChatSession>> + Send;

    /// Records a new message on the session: bumps the message count and
    /// last-message preview.
    fn touch_chat_session(
        &mut self,
        session_id: Uuid,
        last_message: &str,
    ) -> impl Future<Output = PgResult<ChatSession>> + Send;

    /// Deletes a session and, via cascade, its messages.
    fn delete_chat_session(
        &mut self,
        organization_id: i64,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<()>> + Send;
}

impl ChatSessionRepository for PgConnection {
    async fn create_chat_session(&mut self, new_session: NewChatSession) -> PgResult<ChatSession> {
        use schema::chat_sessions;

        let session = diesel::insert_into(chat_sessions::table)
            .values(&new_session)
            .returning(ChatSession::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn find_chat_session_by_id(
        &mut self,
        organization_id: i64,
        session_id: Uuid,
    ) -> PgResult<Option<ChatSession>> {
        use schema::chat_sessions::{self, dsl};

        let session = chat_sessions::table
            .filter(dsl::id.eq(session_id))
            .filter(dsl::organization_id.eq(organization_id))
            .select(ChatSession::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn list_chat_sessions(
        &mut self,
        organization_id: i64,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<ChatSession>> {
        use schema::chat_sessions::{self, dsl};

        let sessions = chat_sessions::table
            .filter(dsl::organization_id.eq(organization_id))
            .order(dsl::updated_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(ChatSession::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(sessions)
    }

    async fn update_chat_session(
        &mut self,
        session_id: Uuid,
        updates: UpdateChatSession,
    ) -> PgResult<ChatSession> {
        use schema::chat_sessions::{self, dsl};

        let session = diesel::update(chat_sessions::table.filter(dsl::id.eq(session_id)))
            .set((&updates, dsl::updated_at.eq(diesel::dsl::now)))
            .returning(ChatSession::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn touch_chat_session(
        &mut self,
        session_id: Uuid,
        last_message: &str,
    ) -> PgResult<ChatSession> {
        use schema::chat_sessions::{self, dsl};

        let session = diesel::update(chat_sessions::table.filter(dsl::id.eq(session_id)))
            .set((
                dsl::last_message.eq(Some(last_message)),
                dsl::message_count.eq(dsl::message_count + 1),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .returning(ChatSession::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(session)
    }

    async fn delete_chat_session(
        &mut self,
        organization_id: i64,
        session_id: Uuid,
    ) -> PgResult<()> {
        use schema::chat_sessions::{self, dsl};

        let affected = diesel::delete(
            chat_sessions::table
                .filter(dsl::id.eq(session_id))
                .filter(dsl::organization_id.eq(organization_id)),
        )
        .execute(self)
        .await
        .map_err(PgError::from)?;

        if affected == 0 {
            return Err(PgError::Query(diesel::result::Error::NotFound));
        }

        Ok(())
    }
}
