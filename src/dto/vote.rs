use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::VoteEntity, dto::format_system_time};

/// Payload used to submit a vote over HTTP.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    /// Poll being voted on.
    pub poll_id: Uuid,
    /// Voting user.
    pub user_id: Uuid,
    /// Index of the chosen option.
    pub option_index: u32,
}

/// Public projection of a committed vote.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Poll the vote belongs to.
    pub poll: Uuid,
    /// Voting user.
    pub user: Uuid,
    /// Index of the chosen option.
    pub option_index: u32,
    /// Submission timestamp (RFC 3339).
    pub voted_at: String,
}

impl From<VoteEntity> for VoteDto {
    fn from(entity: VoteEntity) -> Self {
        Self {
            id: entity.id,
            poll: entity.poll,
            user: entity.user,
            option_index: entity.option_index,
            voted_at: format_system_time(entity.voted_at),
        }
    }
}
