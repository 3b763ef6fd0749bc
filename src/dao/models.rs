use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role carried by every user record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single poll-owning account.
    Teacher,
    /// A voting participant.
    Student,
}

/// Lifecycle status of a poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// Created but not yet visible to students.
    Draft,
    /// Open for voting, optionally time-boxed.
    Active,
    /// Voting over, results frozen.
    Closed,
}

/// Identity record persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Display name. Unique in practice for students, fixed for the teacher.
    pub name: String,
    /// Teacher or student.
    pub role: Role,
    /// Deactivated users keep their record but may not log in again.
    pub is_active: bool,
    /// First login timestamp.
    pub joined_at: SystemTime,
}

impl UserEntity {
    /// Build a fresh, active user record.
    pub fn new(name: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            role,
            is_active: true,
            joined_at: SystemTime::now(),
        }
    }
}

/// Option embedded inside a poll, carrying its cached vote counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionEntity {
    /// Option label shown to voters.
    pub text: String,
    /// Cached number of votes, bumped atomically with `$inc`.
    pub votes: u32,
}

/// Aggregate poll entity persisted by the storage layer.
///
/// Invariant after any committed vote: `total_votes == sum(option.votes)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollEntity {
    /// Primary key of the poll.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Question shown to voters.
    pub question: String,
    /// Ordered options; votes reference them by index.
    pub options: Vec<OptionEntity>,
    /// The teacher who owns this poll.
    pub created_by: Uuid,
    /// Current lifecycle status.
    pub status: PollStatus,
    /// Optional time box in seconds, applied on activation.
    pub time_limit: Option<u32>,
    /// Deadline computed when the poll enters `active` with a time limit set.
    pub expires_at: Option<SystemTime>,
    /// Cached total vote counter, bumped together with the option counter.
    pub total_votes: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
}

impl PollEntity {
    /// Build a draft poll owned by `created_by`.
    pub fn new(
        question: String,
        options: Vec<String>,
        created_by: Uuid,
        time_limit: Option<u32>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            question,
            options: options
                .into_iter()
                .map(|text| OptionEntity { text, votes: 0 })
                .collect(),
            created_by,
            status: PollStatus::Draft,
            time_limit,
            expires_at: None,
            total_votes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition at time `now`.
    ///
    /// `expires_at` is computed only when the poll newly enters `active` with
    /// a time limit set; re-pushing `active` on an already active poll leaves
    /// the deadline untouched.
    pub fn apply_status(&mut self, status: PollStatus, now: SystemTime) {
        if status == PollStatus::Active && self.status != PollStatus::Active {
            if let Some(seconds) = self.time_limit {
                self.expires_at = Some(now + Duration::from_secs(u64::from(seconds)));
            }
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Whether the poll's deadline has passed at time `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Single committed vote for a (poll, user) pair.
///
/// The `(poll, user)` pair is unique at the storage layer; inserting a second
/// vote for the same pair fails with a duplicate-key error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    /// Primary key of the vote.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Poll this vote belongs to.
    pub poll: Uuid,
    /// User who cast the vote.
    pub user: Uuid,
    /// Index of the chosen option inside the poll.
    pub option_index: u32,
    /// Submission timestamp.
    pub voted_at: SystemTime,
}

impl VoteEntity {
    /// Build a vote record for `(poll, user)` choosing `option_index`.
    pub fn new(poll: Uuid, user: Uuid, option_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            poll,
            user,
            option_index,
            voted_at: SystemTime::now(),
        }
    }
}

/// Append-only chat message with an author snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEntity {
    /// Primary key of the message.
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Author reference.
    pub user: Uuid,
    /// Author name at send time.
    pub name: String,
    /// Author role at send time.
    pub role: Role,
    /// Message body, trimmed.
    pub message: String,
    /// Send timestamp; history is ordered by this field.
    pub timestamp: SystemTime,
}

impl MessageEntity {
    /// Build a message record snapshotting the author's name and role.
    pub fn new(user: Uuid, name: String, role: Role, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            name,
            role,
            message,
            timestamp: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_with_limit(limit: Option<u32>) -> PollEntity {
        PollEntity::new(
            "Pick one".into(),
            vec!["A".into(), "B".into()],
            Uuid::new_v4(),
            limit,
        )
    }

    #[test]
    fn activation_with_time_limit_sets_deadline() {
        let mut poll = poll_with_limit(Some(60));
        let now = SystemTime::now();

        poll.apply_status(PollStatus::Active, now);

        assert_eq!(poll.status, PollStatus::Active);
        assert_eq!(poll.expires_at, Some(now + Duration::from_secs(60)));
    }

    #[test]
    fn activation_without_time_limit_keeps_no_deadline() {
        let mut poll = poll_with_limit(None);
        poll.apply_status(PollStatus::Active, SystemTime::now());
        assert_eq!(poll.expires_at, None);
    }

    #[test]
    fn repushing_active_does_not_move_the_deadline() {
        let mut poll = poll_with_limit(Some(60));
        let first = SystemTime::now();
        poll.apply_status(PollStatus::Active, first);
        let deadline = poll.expires_at;

        poll.apply_status(PollStatus::Active, first + Duration::from_secs(30));
        assert_eq!(poll.expires_at, deadline);
    }

    #[test]
    fn reactivating_a_closed_poll_recomputes_the_deadline() {
        let mut poll = poll_with_limit(Some(60));
        let first = SystemTime::now();
        poll.apply_status(PollStatus::Active, first);
        poll.apply_status(PollStatus::Closed, first + Duration::from_secs(10));

        let later = first + Duration::from_secs(120);
        poll.apply_status(PollStatus::Active, later);
        assert_eq!(poll.expires_at, Some(later + Duration::from_secs(60)));
    }

    #[test]
    fn closing_freezes_status_without_touching_deadline() {
        let mut poll = poll_with_limit(Some(60));
        let now = SystemTime::now();
        poll.apply_status(PollStatus::Active, now);
        let deadline = poll.expires_at;

        poll.apply_status(PollStatus::Closed, now + Duration::from_secs(5));
        assert_eq!(poll.status, PollStatus::Closed);
        assert_eq!(poll.expires_at, deadline);
    }

    #[test]
    fn expiry_check_uses_the_computed_deadline() {
        let mut poll = poll_with_limit(Some(60));
        let now = SystemTime::now();
        poll.apply_status(PollStatus::Active, now);

        assert!(!poll.is_expired(now + Duration::from_secs(59)));
        assert!(poll.is_expired(now + Duration::from_secs(60)));
        assert!(poll.is_expired(now + Duration::from_secs(61)));
    }
}
