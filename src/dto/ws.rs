use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{PollStatus, Role},
    dto::{
        chat::MessageDto,
        poll::{PollDto, PollResults},
    },
};

/// Events accepted from WebSocket clients.
///
/// Event names and field casing match the browser clients' payloads
/// (`{"type": "join-poll", "pollId": ..., "userId": ...}`).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Subscribe this connection to a poll room.
    JoinPoll {
        /// Poll room to join.
        poll_id: Uuid,
        /// User behind the connection, recorded for presence.
        user_id: Uuid,
    },
    /// Unsubscribe from a poll room.
    LeavePoll {
        /// Poll room to leave.
        poll_id: Uuid,
    },
    /// Submit a vote over the realtime channel.
    VoteSubmitted {
        /// Poll being voted on.
        poll_id: Uuid,
        /// Voting user.
        user_id: Uuid,
        /// Chosen option index.
        option_index: u32,
    },
    /// Push a poll status transition over the realtime channel.
    PollStatusChanged {
        /// Poll to transition.
        poll_id: Uuid,
        /// Target status.
        status: PollStatus,
    },
    /// Announce a freshly created poll to every connection.
    PollCreated {
        /// The poll to announce.
        poll: PollDto,
    },
    /// Subscribe this connection to the shared chat room.
    JoinChat {
        /// User behind the connection, recorded for presence.
        user_id: Uuid,
        /// Role of the user, for logging only.
        role: Role,
    },
    /// Send a chat message.
    SendMessage {
        /// Author reference.
        user_id: Uuid,
        /// Author display name.
        name: String,
        /// Author role.
        role: Role,
        /// Message body.
        message: String,
    },
    /// Unsubscribe from the shared chat room.
    LeaveChat,
    /// Anything this server version does not understand.
    #[serde(other)]
    Unknown,
}

/// Events emitted to WebSocket clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// On-demand snapshot sent to a connection that joined a poll room.
    PollJoined {
        /// Current poll state.
        poll: PollDto,
    },
    /// Live tally pushed to a poll room after an accepted vote.
    PollUpdated {
        /// Poll whose tally changed.
        poll_id: Uuid,
        /// Recomputed tally snapshot.
        results: PollResults,
    },
    /// Status transition pushed to a poll room.
    PollStatusUpdated {
        /// Poll whose status changed.
        poll_id: Uuid,
        /// New status.
        status: PollStatus,
        /// Voting deadline (RFC 3339), when the poll is time-boxed.
        expires_at: Option<String>,
    },
    /// New poll announcement pushed to every connection.
    NewPollAvailable {
        /// The freshly created poll.
        poll: PollDto,
    },
    /// Chat message pushed to the chat room.
    NewMessage {
        /// The broadcast message.
        #[serde(flatten)]
        message: MessageDto,
    },
    /// Forced-disconnect notification sent to a kicked student.
    Removed {
        /// Human-readable reason.
        reason: String,
    },
    /// Best-effort error report sent to the originating connection only.
    Error {
        /// Human-readable message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_poll_event_parses_from_client_payload() {
        let poll_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let payload = json!({
            "type": "join-poll",
            "pollId": poll_id,
            "userId": user_id,
        });

        let message: ClientMessage = serde_json::from_value(payload).unwrap();
        match message {
            ClientMessage::JoinPoll {
                poll_id: p,
                user_id: u,
            } => {
                assert_eq!(p, poll_id);
                assert_eq!(u, user_id);
            }
            other => panic!("expected join-poll, got {other:?}"),
        }
    }

    #[test]
    fn vote_submitted_event_parses_option_index() {
        let payload = json!({
            "type": "vote-submitted",
            "pollId": Uuid::new_v4(),
            "userId": Uuid::new_v4(),
            "optionIndex": 1,
        });

        let message: ClientMessage = serde_json::from_value(payload).unwrap();
        assert!(matches!(
            message,
            ClientMessage::VoteSubmitted { option_index: 1, .. }
        ));
    }

    #[test]
    fn unknown_event_types_fall_back_to_unknown() {
        let message: ClientMessage =
            serde_json::from_value(json!({ "type": "grade-homework" })).unwrap();
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn status_update_event_serializes_with_wire_names() {
        let poll_id = Uuid::new_v4();
        let message = ServerMessage::PollStatusUpdated {
            poll_id,
            status: PollStatus::Active,
            expires_at: None,
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "poll-status-updated");
        assert_eq!(value["pollId"], json!(poll_id));
        assert_eq!(value["status"], "active");
        assert!(value["expiresAt"].is_null());
    }

    #[test]
    fn new_message_event_flattens_the_message_fields() {
        let message = ServerMessage::NewMessage {
            message: MessageDto {
                user_id: Uuid::new_v4(),
                name: "Student 3".into(),
                role: Role::Student,
                message: "hello".into(),
                timestamp: "2026-08-26T10:00:00Z".into(),
            },
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "new-message");
        assert_eq!(value["name"], "Student 3");
        assert_eq!(value["role"], "student");
        assert_eq!(value["message"], "hello");
    }
}
