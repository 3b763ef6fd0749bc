use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        messages::MessageRepository,
        models::{MessageEntity, Role},
    },
    dto::chat::MessageDto,
    error::ServiceError,
    services::events,
    state::SharedState,
};

/// Persist a chat message and fan it out to the chat room.
///
/// The author's name and role are snapshotted on the message, so history
/// stays readable even after the author is removed.
pub async fn send_message(
    state: &SharedState,
    user_id: Uuid,
    name: String,
    role: Role,
    body: String,
) -> Result<MessageDto, ServiceError> {
    let mongo = state.require_mongo().await?;

    let body = body.trim().to_string();
    if body.is_empty() {
        return Err(ServiceError::InvalidInput(
            "message body must not be blank".into(),
        ));
    }

    let entity = MessageEntity::new(user_id, name, role, body);
    MessageRepository::new(mongo).insert(&entity).await?;
    info!(message_id = %entity.id, user_id = %user_id, "chat message stored");

    let message = MessageDto::from(entity);
    events::broadcast_new_message(state, message.clone());
    Ok(message)
}

/// Full chat history, oldest first.
pub async fn history(state: &SharedState) -> Result<Vec<MessageDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let messages = MessageRepository::new(mongo).list_all().await?;
    Ok(messages.into_iter().map(Into::into).collect())
}

/// The most recent messages, oldest first, capped by configuration.
pub async fn recent(state: &SharedState) -> Result<Vec<MessageDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let messages = MessageRepository::new(mongo)
        .list_recent(state.config().chat_history_limit())
        .await?;
    Ok(messages.into_iter().map(Into::into).collect())
}
