//! Request, response, and wire payload shapes exposed to clients.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Login and user lookup payloads.
pub mod auth;
/// Chat message payloads.
pub mod chat;
/// Health check payloads.
pub mod health;
/// Poll CRUD and results payloads.
pub mod poll;
/// Validation helpers for request DTOs.
pub mod validation;
/// Vote submission payloads.
pub mod vote;
/// WebSocket event payloads.
pub mod ws;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
