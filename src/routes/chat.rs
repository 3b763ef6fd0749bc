use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::chat::MessageDto, error::AppError, services::chat_service, state::SharedState};

/// Routes handling chat history reads. Messages are sent over the realtime
/// channel, not over HTTP.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chat", get(chat_history))
        .route("/chat/recent", get(recent_chat_history))
}

/// Full chat history, oldest first.
#[utoipa::path(
    get,
    path = "/api/chat",
    tag = "chat",
    responses((status = 200, description = "Full history", body = [MessageDto]))
)]
pub async fn chat_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let messages = chat_service::history(&state).await?;
    Ok(Json(messages))
}

/// The most recent messages, oldest first.
#[utoipa::path(
    get,
    path = "/api/chat/recent",
    tag = "chat",
    responses((status = 200, description = "Recent history", body = [MessageDto]))
)]
pub async fn recent_chat_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let messages = chat_service::recent(&state).await?;
    Ok(Json(messages))
}
