use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PollEntity, PollStatus},
    dto::{
        format_system_time,
        validation::{validate_non_blank, validate_options},
    },
};

/// Payload used to create a new poll in `draft` status.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    /// Question shown to voters.
    #[validate(custom(function = validate_non_blank))]
    pub question: String,
    /// Option labels; at least two, none blank.
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    /// Id of the creating user; must be the registered teacher.
    pub created_by: Uuid,
    /// Optional time box in seconds, applied when the poll is activated.
    #[serde(default)]
    pub time_limit: Option<u32>,
}

/// Payload used to push a poll status transition.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status.
    pub status: PollStatus,
    /// Id of the requesting user; must be the registered teacher.
    pub requested_by: Uuid,
}

/// Public projection of an embedded poll option.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptionDto {
    /// Option label.
    pub text: String,
    /// Cached vote counter.
    pub votes: u32,
}

/// Public projection of a poll document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollDto {
    /// Stable identifier.
    pub id: Uuid,
    /// Question shown to voters.
    pub question: String,
    /// Ordered options with their cached counters.
    pub options: Vec<OptionDto>,
    /// Owning teacher id.
    pub created_by: Uuid,
    /// Current lifecycle status.
    pub status: PollStatus,
    /// Optional time box in seconds.
    pub time_limit: Option<u32>,
    /// Voting deadline (RFC 3339), set once the poll is activated time-boxed.
    pub expires_at: Option<String>,
    /// Cached total vote counter.
    pub total_votes: u32,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<PollEntity> for PollDto {
    fn from(entity: PollEntity) -> Self {
        Self {
            id: entity.id,
            question: entity.question,
            options: entity
                .options
                .into_iter()
                .map(|option| OptionDto {
                    text: option.text,
                    votes: option.votes,
                })
                .collect(),
            created_by: entity.created_by,
            status: entity.status,
            time_limit: entity.time_limit,
            expires_at: entity.expires_at.map(format_system_time),
            total_votes: entity.total_votes,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Tally snapshot recomputed from the authoritative vote set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    /// Question shown to voters.
    pub question: String,
    /// Number of committed votes.
    pub total_votes: u32,
    /// Per-option breakdown in option order.
    pub options: Vec<OptionResult>,
}

/// Per-option slice of a tally snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptionResult {
    /// Option label.
    pub text: String,
    /// Votes recomputed from the vote set, not the cached counter.
    pub votes: u32,
    /// Share of the total, rounded to two decimal places; 0 when no votes.
    pub percentage: f64,
}
