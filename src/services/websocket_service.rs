use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::{chat_service, events, poll_service, vote_service},
    state::{CHAT_ROOM, ClientConnection, SharedState, poll_room},
};

/// Handle the full lifecycle of a classroom WebSocket connection.
///
/// Each connection gets a dedicated writer task draining an unbounded queue,
/// so broadcasts never block on a slow client. The connection is registered
/// with the room registry immediately; clients declare which rooms they want
/// with `join-poll` and `join-chat` events.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.rooms().register(ClientConnection {
        id: connection_id,
        tx: outbound_tx.clone(),
    });
    info!(connection_id = %connection_id, "client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(event) => handle_event(&state, connection_id, &outbound_tx, event).await,
                    Err(err) => {
                        warn!(connection_id = %connection_id, error = %err, "unparseable client event");
                        send_error(&outbound_tx, "malformed event payload");
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection_id = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.rooms().deregister(connection_id);
    info!(connection_id = %connection_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Dispatch a single parsed client event.
///
/// Failures are reported back to the originating connection only; they never
/// tear the connection down.
async fn handle_event(
    state: &SharedState,
    connection_id: Uuid,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    event: ClientMessage,
) {
    match event {
        ClientMessage::JoinPoll { poll_id, user_id } => {
            state.rooms().join(&poll_room(poll_id), connection_id);
            state.rooms().bind_user(user_id, connection_id);
            info!(connection_id = %connection_id, poll_id = %poll_id, user_id = %user_id, "joined poll room");

            // Snapshot on join so late joiners see the current state. A poll
            // that vanished between announcement and join is not an error,
            // the room membership simply stays dormant.
            match poll_service::get_poll(state, poll_id).await {
                Ok(poll) => {
                    state
                        .rooms()
                        .send_to(connection_id, &ServerMessage::PollJoined { poll });
                }
                Err(err) => {
                    warn!(poll_id = %poll_id, error = %err, "join snapshot unavailable");
                }
            }
        }
        ClientMessage::LeavePoll { poll_id } => {
            state.rooms().leave(&poll_room(poll_id), connection_id);
        }
        ClientMessage::VoteSubmitted {
            poll_id,
            user_id,
            option_index,
        } => {
            if let Err(err) = vote_service::submit_vote(state, poll_id, user_id, option_index).await
            {
                send_error(outbound_tx, &err.to_string());
            }
        }
        ClientMessage::PollStatusChanged { poll_id, status } => {
            if let Err(err) = poll_service::transition_status(state, poll_id, status).await {
                send_error(outbound_tx, &err.to_string());
            }
        }
        ClientMessage::PollCreated { poll } => {
            events::broadcast_new_poll(state, poll);
        }
        ClientMessage::JoinChat { user_id, role } => {
            state.rooms().join(CHAT_ROOM, connection_id);
            state.rooms().bind_user(user_id, connection_id);
            info!(connection_id = %connection_id, user_id = %user_id, role = ?role, "joined chat room");
        }
        ClientMessage::SendMessage {
            user_id,
            name,
            role,
            message,
        } => {
            if let Err(err) = chat_service::send_message(state, user_id, name, role, message).await
            {
                send_error(outbound_tx, &err.to_string());
            }
        }
        ClientMessage::LeaveChat => {
            state.rooms().leave(CHAT_ROOM, connection_id);
        }
        ClientMessage::Unknown => {
            warn!(connection_id = %connection_id, "ignoring unknown client event");
        }
    }
}

/// Best-effort error report to the originating connection.
fn send_error(outbound_tx: &mpsc::UnboundedSender<Message>, message: &str) {
    let event = ServerMessage::Error {
        message: message.to_string(),
    };
    match serde_json::to_string(&event) {
        Ok(payload) => {
            let _ = outbound_tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(error = %err, "failed to serialize error event"),
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
