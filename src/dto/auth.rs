use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{Role, UserEntity},
    dto::format_system_time,
};

/// Login payload: get-or-create a user by name and role.
///
/// The name is optional for students (an auto-numbered one is assigned) and
/// ignored for the teacher, whose display name is fixed by configuration.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Requested display name.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub name: Option<String>,
    /// Role to log in as.
    pub role: Role,
}

/// Public projection of a user record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Teacher or student.
    pub role: Role,
    /// Whether the user may still log in and vote.
    pub is_active: bool,
    /// First login timestamp (RFC 3339).
    pub joined_at: String,
}

impl From<UserEntity> for UserDto {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            role: entity.role,
            is_active: entity.is_active,
            joined_at: format_system_time(entity.joined_at),
        }
    }
}
