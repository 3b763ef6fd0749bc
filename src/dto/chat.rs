use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{MessageEntity, Role},
    dto::format_system_time,
};

/// Public projection of a chat message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Author reference.
    pub user_id: Uuid,
    /// Author name at send time.
    pub name: String,
    /// Author role at send time.
    pub role: Role,
    /// Message body.
    pub message: String,
    /// Send timestamp (RFC 3339).
    pub timestamp: String,
}

impl From<MessageEntity> for MessageDto {
    fn from(entity: MessageEntity) -> Self {
        Self {
            user_id: entity.user,
            name: entity.name,
            role: entity.role,
            message: entity.message,
            timestamp: format_system_time(entity.timestamp),
        }
    }
}
