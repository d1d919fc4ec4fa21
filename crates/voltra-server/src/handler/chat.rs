//! Chat session and message handlers.
//!
//! All session mutation flows through the per-session operation guard;
//! there is no bypass path. Response generation for each message owns a
//! cancellation token scoped to that one generation.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use voltra_postgres::model::{NewChatMessage, NewChatSession, UpdateChatSession as UpdateChatSessionModel};
use voltra_postgres::query::{ChatMessageRepository, ChatSessionRepository};

use crate::extract::{AuthState, ValidateJson};
use crate::handler::dispatch::{self, DispatchOptions};
use crate::handler::request::{
    ChatSessionPathParams, CreateChatSession, PaginationParams, SendChatMessage,
    UpdateChatSession,
};
use crate::handler::response::{ChatExchange, ChatMessage, ChatSession, ErrorResponse};
use crate::handler::{ErrorKind, Result};
use crate::service::{OperationKind, ServiceState};

/// Tracing target for chat operations.
const TRACING_TARGET: &str = "voltra_server::handler::chat";

/// Creates a new chat session.
#[tracing::instrument(
    skip_all,
    fields(organization_id = %auth_state.organization_id)
)]
async fn create_chat_session(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    ValidateJson(request): ValidateJson<CreateChatSession>,
) -> Result<(StatusCode, Json<ChatSession>)> {
    tracing::debug!(target: TRACING_TARGET, "Creating chat session");

    let mut conn = state.postgres.get_connection().await?;

    let mut new_session = NewChatSession::new(auth_state.organization_id, request.title);
    if let Some(dashboard_id) = request.dashboard_id {
        new_session = new_session.with_dashboard(dashboard_id);
    }

    let session = conn.create_chat_session(new_session).await?;

    tracing::info!(
        target: TRACING_TARGET,
        session_id = %session.id,
        "Chat session created",
    );

    Ok((StatusCode::CREATED, Json(ChatSession::from_model(session))))
}

fn create_chat_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Create chat session")
        .description("Creates a new chat session for the organization.")
        .response::<201, Json<ChatSession>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<422, Json<ErrorResponse>>()
}

/// Lists the organization's chat sessions.
#[tracing::instrument(
    skip_all,
    fields(organization_id = %auth_state.organization_id)
)]
async fn list_chat_sessions(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<ChatSession>>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing chat sessions");

    let mut conn = state.postgres.get_connection().await?;

    let sessions = conn
        .list_chat_sessions(auth_state.organization_id, pagination.into())
        .await?;

    let response = sessions.into_iter().map(ChatSession::from_model).collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_chat_sessions_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List chat sessions")
        .description("Lists the organization's chat sessions, most recently updated first.")
        .response::<200, Json<Vec<ChatSession>>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Gets a chat session by id.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        session_id = %path_params.session_id,
    )
)]
async fn get_chat_session(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<ChatSessionPathParams>,
) -> Result<(StatusCode, Json<ChatSession>)> {
    let mut conn = state.postgres.get_connection().await?;

    let session = find_chat_session(
        &mut conn,
        auth_state.organization_id,
        path_params.session_id,
    )
    .await?;

    Ok((StatusCode::OK, Json(ChatSession::from_model(session))))
}

fn get_chat_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get chat session")
        .description("Returns chat session details by id.")
        .response::<200, Json<ChatSession>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Updates a chat session.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        session_id = %path_params.session_id,
    )
)]
async fn update_chat_session(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<ChatSessionPathParams>,
    ValidateJson(request): ValidateJson<UpdateChatSession>,
) -> Result<(StatusCode, Json<ChatSession>)> {
    tracing::debug!(target: TRACING_TARGET, "Updating chat session");

    let mut conn = state.postgres.get_connection().await?;

    let existing = find_chat_session(
        &mut conn,
        auth_state.organization_id,
        path_params.session_id,
    )
    .await?;

    let _permit = state
        .guard
        .begin(existing.id, OperationKind::SessionUpdate)
        .map_err(|_| ErrorKind::Conflict.with_resource("chat_session"))?;

    let updates = UpdateChatSessionModel {
        title: request.title,
        dashboard_id: request.dashboard_id.map(Some),
    };

    let session = conn.update_chat_session(existing.id, updates).await?;

    tracing::info!(target: TRACING_TARGET, "Chat session updated");

    Ok((StatusCode::OK, Json(ChatSession::from_model(session))))
}

fn update_chat_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Update chat session")
        .description("Updates the session title or dashboard attachment.")
        .response::<200, Json<ChatSession>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Deletes a chat session and its messages.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        session_id = %path_params.session_id,
    )
)]
async fn delete_chat_session(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<ChatSessionPathParams>,
) -> Result<StatusCode> {
    tracing::debug!(target: TRACING_TARGET, "Deleting chat session");

    let mut conn = state.postgres.get_connection().await?;

    let session = find_chat_session(
        &mut conn,
        auth_state.organization_id,
        path_params.session_id,
    )
    .await?;

    // Stop any in-flight generation on this session before removing it
    state.guard.cancel(session.id);

    let _permit = state
        .guard
        .begin(session.id, OperationKind::SessionDelete)
        .map_err(|_| ErrorKind::Conflict.with_resource("chat_session"))?;

    conn.delete_chat_session(auth_state.organization_id, session.id)
        .await?;

    tracing::info!(target: TRACING_TARGET, "Chat session deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn delete_chat_session_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Delete chat session")
        .description("Deletes the session and all of its messages.")
        .response_with::<204, (), _>(|res| res.description("Chat session deleted."))
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Lists a session's messages in chronological order.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        session_id = %path_params.session_id,
    )
)]
async fn list_messages(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<ChatSessionPathParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<(StatusCode, Json<Vec<ChatMessage>>)> {
    let mut conn = state.postgres.get_connection().await?;

    let session = find_chat_session(
        &mut conn,
        auth_state.organization_id,
        path_params.session_id,
    )
    .await?;

    let messages = conn
        .list_session_messages(session.id, pagination.into())
        .await?;

    let response = messages.into_iter().map(ChatMessage::from_model).collect();

    Ok((StatusCode::OK, Json(response)))
}

fn list_messages_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List chat messages")
        .description("Lists the session's messages in chronological order.")
        .response::<200, Json<Vec<ChatMessage>>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
}

/// Sends a message and generates the assistant reply.
///
/// The user message is stored first; the assistant reply starts in the
/// loading state and transitions to complete or error. Cancellation (via
/// session deletion) aborts only this generation.
#[tracing::instrument(
    skip_all,
    fields(
        organization_id = %auth_state.organization_id,
        session_id = %path_params.session_id,
    )
)]
async fn send_message(
    State(state): State<ServiceState>,
    auth_state: AuthState,
    Path(path_params): Path<ChatSessionPathParams>,
    ValidateJson(request): ValidateJson<SendChatMessage>,
) -> Result<(StatusCode, Json<ChatExchange>)> {
    tracing::debug!(target: TRACING_TARGET, "Sending chat message");

    let mut conn = state.postgres.get_connection().await?;

    let session = find_chat_session(
        &mut conn,
        auth_state.organization_id,
        path_params.session_id,
    )
    .await?;

    let permit = state
        .guard
        .begin(session.id, OperationKind::MessageSend)
        .map_err(|_| {
            ErrorKind::Conflict
                .with_message("A message is already being processed for this session.")
        })?;

    let user_message = conn
        .append_chat_message(NewChatMessage::user(session.id, &request.content))
        .await?;
    conn.touch_chat_session(session.id, &request.content).await?;

    let assistant_loading = conn
        .append_chat_message(NewChatMessage::assistant_loading(session.id))
        .await?;

    let preprocessed = state.router.preprocess(&request.content);
    let decision = state.router.route(&preprocessed).await;

    tracing::info!(
        target: TRACING_TARGET,
        route = %decision.route,
        confidence = decision.confidence,
        "Query routed"
    );

    let options = DispatchOptions {
        limit: request.limit(),
        threshold: request.threshold(),
        return_raw_output: false,
    };

    let work = dispatch::dispatch(
        &state,
        auth_state.organization_id,
        &preprocessed,
        &decision,
        &request.data_source_ids,
        options,
    );

    let outcome = tokio::select! {
        outcome = work => outcome,
        _ = permit.token.cancelled() => {
            Err(ErrorKind::Conflict.with_message("Generation was cancelled."))
        }
    };

    let assistant_message = match outcome {
        Ok(dispatched) => {
            let content = dispatched.content();
            let metadata = dispatched.metadata(&state, &decision);

            let message = conn
                .complete_chat_message(assistant_loading.id, &content, metadata)
                .await?;
            conn.touch_chat_session(session.id, &content).await?;
            message
        }
        Err(e) => {
            // Invalid input still surfaces as a hard error; everything else
            // is recorded on the message so the session stays usable
            if matches!(e.kind(), ErrorKind::BadRequest) {
                conn.fail_chat_message(assistant_loading.id, "Invalid request.")
                    .await?;
                return Err(e);
            }

            tracing::warn!(
                target: TRACING_TARGET,
                error = %e,
                "Generation failed, recording error message"
            );

            let message = conn
                .fail_chat_message(assistant_loading.id, &e.to_string())
                .await?;
            conn.touch_chat_session(session.id, &e.to_string()).await?;
            message
        }
    };

    drop(permit);

    Ok((
        StatusCode::CREATED,
        Json(ChatExchange {
            user_message: ChatMessage::from_model(user_message),
            assistant_message: ChatMessage::from_model(assistant_message),
        }),
    ))
}

fn send_message_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Send chat message")
        .description(
            "Appends the user message, routes the query, runs the chosen \
             processing path, and returns the stored exchange.",
        )
        .response::<201, Json<ChatExchange>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Finds a chat session by id or returns NotFound.
async fn find_chat_session(
    conn: &mut voltra_postgres::PgConnection,
    organization_id: i64,
    session_id: uuid::Uuid,
) -> Result<voltra_postgres::model::ChatSession> {
    conn.find_chat_session_by_id(organization_id, session_id)
        .await?
        .ok_or_else(|| {
            ErrorKind::NotFound
                .with_message("Chat session not found.")
                .with_resource("chat_session")
        })
}

/// Returns a [`Router`] with all related routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/chat/sessions",
            post_with(create_chat_session, create_chat_session_docs)
                .get_with(list_chat_sessions, list_chat_sessions_docs),
        )
        .api_route(
            "/chat/sessions/{sessionId}",
            get_with(get_chat_session, get_chat_session_docs)
                .patch_with(update_chat_session, update_chat_session_docs)
                .delete_with(delete_chat_session, delete_chat_session_docs),
        )
        .api_route(
            "/chat/sessions/{sessionId}/messages",
            get_with(list_messages, list_messages_docs)
                .post_with(send_message, send_message_docs),
        )
        .with_path_items(|item| item.tag("Chat"))
}
