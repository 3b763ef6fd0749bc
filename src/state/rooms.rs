use std::collections::HashSet;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::dto::ws::ServerMessage;

/// Name of the single shared chat room.
pub const CHAT_ROOM: &str = "chat-room";

/// Room name for a poll's subscribers.
pub fn poll_room(poll_id: Uuid) -> String {
    format!("poll-{poll_id}")
}

#[derive(Clone)]
/// Handle used to push messages to a connected client.
pub struct ClientConnection {
    /// Connection identifier, assigned at upgrade time.
    pub id: Uuid,
    /// Writer-queue side of the connection's dedicated sender task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Authoritative registry of connections, room membership, and user presence.
///
/// This is the only place connection handles live; request handlers never
/// touch a connection directly. Join and leave are idempotent membership
/// changes, broadcasting is fire-and-forget, and per-room delivery order
/// follows publish order because every connection drains a single writer
/// queue.
#[derive(Default)]
pub struct RoomRegistry {
    connections: DashMap<Uuid, ClientConnection>,
    rooms: DashMap<String, HashSet<Uuid>>,
    presence: DashMap<Uuid, Uuid>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly upgraded connection.
    pub fn register(&self, connection: ClientConnection) {
        self.connections.insert(connection.id, connection);
    }

    /// Drop a connection and every trace of it: room memberships and any
    /// presence entry pointing at it.
    pub fn deregister(&self, connection_id: Uuid) {
        self.connections.remove(&connection_id);
        self.rooms.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
        self.presence
            .retain(|_, conn| *conn != connection_id);
    }

    /// Add a connection to a room. Joining twice is a no-op.
    pub fn join(&self, room: &str, connection_id: Uuid) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id);
    }

    /// Remove a connection from a room. Leaving a room it never joined is a
    /// no-op.
    pub fn leave(&self, room: &str, connection_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
        }
    }

    /// Associate a user with their current connection.
    ///
    /// A later bind for the same user wins, mirroring a reconnecting client.
    pub fn bind_user(&self, user_id: Uuid, connection_id: Uuid) {
        self.presence.insert(user_id, connection_id);
    }

    /// Send an event to one connection. Returns `false` when the connection
    /// is gone or its writer has shut down.
    pub fn send_to(&self, connection_id: Uuid, message: &ServerMessage) -> bool {
        let Some(tx) = self
            .connections
            .get(&connection_id)
            .map(|conn| conn.tx.clone())
        else {
            return false;
        };
        let Some(payload) = encode(message) else {
            return true;
        };
        tx.send(Message::Text(payload.into())).is_ok()
    }

    /// Fan an event out to every member of a room, fire-and-forget.
    pub fn broadcast(&self, room: &str, message: &ServerMessage) {
        let Some(payload) = encode(message) else {
            return;
        };
        let Some(members) = self.rooms.get(room).map(|members| members.clone()) else {
            return;
        };

        for connection_id in members {
            if let Some(connection) = self.connections.get(&connection_id) {
                let _ = connection.tx.send(Message::Text(payload.clone().into()));
            }
        }
    }

    /// Fan an event out to every connection regardless of room membership.
    pub fn broadcast_all(&self, message: &ServerMessage) {
        let Some(payload) = encode(message) else {
            return;
        };
        for connection in self.connections.iter() {
            let _ = connection.tx.send(Message::Text(payload.clone().into()));
        }
    }

    /// Notify a user's live connection that they were removed, then close it.
    ///
    /// Returns `false` when the user had no live connection; the removal is
    /// still effective, they simply find out at their next login attempt.
    pub fn kick_user(&self, user_id: Uuid, reason: &str) -> bool {
        let Some(connection_id) = self.presence.get(&user_id).map(|entry| *entry.value()) else {
            return false;
        };
        let Some(tx) = self
            .connections
            .get(&connection_id)
            .map(|conn| conn.tx.clone())
        else {
            return false;
        };

        if let Some(payload) = encode(&ServerMessage::Removed {
            reason: reason.to_string(),
        }) {
            let _ = tx.send(Message::Text(payload.into()));
        }
        let _ = tx.send(Message::Close(None));
        true
    }

    /// Number of connections currently in a room.
    #[cfg(test)]
    fn room_size(&self, room: &str) -> usize {
        self.rooms
            .get(room)
            .map(|members| members.len())
            .unwrap_or(0)
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn connect(registry: &RoomRegistry) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        registry.register(ClientConnection { id, tx });
        (id, rx)
    }

    fn event_type(message: Message) -> String {
        match message {
            Message::Text(text) => {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                value["type"].as_str().unwrap().to_string()
            }
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    fn removed(reason: &str) -> ServerMessage {
        ServerMessage::Removed {
            reason: reason.into(),
        }
    }

    #[test]
    fn broadcast_reaches_only_room_members() {
        let registry = RoomRegistry::new();
        let (member, mut member_rx) = connect(&registry);
        let (_outsider, mut outsider_rx) = connect(&registry);

        registry.join("poll-1", member);
        registry.broadcast("poll-1", &removed("hello"));

        assert_eq!(event_type(member_rx.try_recv().unwrap()), "removed");
        assert!(outsider_rx.try_recv().is_err());
    }

    #[test]
    fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        let (member, mut rx) = connect(&registry);

        registry.join("poll-1", member);
        registry.join("poll-1", member);
        assert_eq!(registry.room_size("poll-1"), 1);

        registry.broadcast("poll-1", &removed("once"));
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "member must not receive duplicates");
    }

    #[test]
    fn leave_stops_delivery() {
        let registry = RoomRegistry::new();
        let (member, mut rx) = connect(&registry);

        registry.join("poll-1", member);
        registry.leave("poll-1", member);
        registry.broadcast("poll-1", &removed("gone"));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn room_delivery_preserves_publish_order() {
        let registry = RoomRegistry::new();
        let (member, mut rx) = connect(&registry);
        registry.join("poll-1", member);

        registry.broadcast("poll-1", &removed("first"));
        registry.broadcast(
            "poll-1",
            &ServerMessage::Error {
                message: "second".into(),
            },
        );

        assert_eq!(event_type(rx.try_recv().unwrap()), "removed");
        assert_eq!(event_type(rx.try_recv().unwrap()), "error");
    }

    #[test]
    fn broadcast_all_ignores_room_membership() {
        let registry = RoomRegistry::new();
        let (_a, mut rx_a) = connect(&registry);
        let (_b, mut rx_b) = connect(&registry);

        registry.broadcast_all(&removed("everyone"));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn kick_sends_removed_then_close() {
        let registry = RoomRegistry::new();
        let (conn, mut rx) = connect(&registry);
        let user = Uuid::new_v4();
        registry.bind_user(user, conn);

        assert!(registry.kick_user(user, "Removed by teacher"));
        assert_eq!(event_type(rx.try_recv().unwrap()), "removed");
        assert!(matches!(rx.try_recv().unwrap(), Message::Close(_)));
    }

    #[test]
    fn kick_without_live_connection_reports_false() {
        let registry = RoomRegistry::new();
        assert!(!registry.kick_user(Uuid::new_v4(), "no one home"));
    }

    #[test]
    fn deregister_cleans_rooms_and_presence() {
        let registry = RoomRegistry::new();
        let (conn, _rx) = connect(&registry);
        let user = Uuid::new_v4();

        registry.join(CHAT_ROOM, conn);
        registry.bind_user(user, conn);
        registry.deregister(conn);

        assert_eq!(registry.room_size(CHAT_ROOM), 0);
        assert!(!registry.kick_user(user, "already gone"));
    }

    #[test]
    fn later_bind_for_the_same_user_wins() {
        let registry = RoomRegistry::new();
        let (old_conn, mut old_rx) = connect(&registry);
        let (new_conn, mut new_rx) = connect(&registry);
        let user = Uuid::new_v4();

        registry.bind_user(user, old_conn);
        registry.bind_user(user, new_conn);

        assert!(registry.kick_user(user, "bye"));
        assert!(old_rx.try_recv().is_err());
        assert!(new_rx.try_recv().is_ok());
    }
}
