//! Outbound realtime event helpers, one per broadcast the system performs.

use uuid::Uuid;

use crate::{
    dao::models::PollEntity,
    dto::{
        chat::MessageDto,
        format_system_time,
        poll::{PollDto, PollResults},
        ws::ServerMessage,
    },
    state::{CHAT_ROOM, SharedState, poll_room},
};

/// Push a recomputed tally to everyone watching the poll.
pub fn broadcast_poll_updated(state: &SharedState, poll_id: Uuid, results: PollResults) {
    state.rooms().broadcast(
        &poll_room(poll_id),
        &ServerMessage::PollUpdated { poll_id, results },
    );
}

/// Push a status transition to everyone watching the poll.
pub fn broadcast_poll_status(state: &SharedState, poll: &PollEntity) {
    state.rooms().broadcast(
        &poll_room(poll.id),
        &ServerMessage::PollStatusUpdated {
            poll_id: poll.id,
            status: poll.status,
            expires_at: poll.expires_at.map(format_system_time),
        },
    );
}

/// Announce a freshly created poll to every connection, whatever room they
/// are in.
pub fn broadcast_new_poll(state: &SharedState, poll: PollDto) {
    state
        .rooms()
        .broadcast_all(&ServerMessage::NewPollAvailable { poll });
}

/// Push a chat message to the shared chat room.
pub fn broadcast_new_message(state: &SharedState, message: MessageDto) {
    state
        .rooms()
        .broadcast(CHAT_ROOM, &ServerMessage::NewMessage { message });
}
