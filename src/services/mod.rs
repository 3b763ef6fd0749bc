/// Login flows and user lookup.
pub mod auth_service;
/// Chat persistence and history.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Outbound realtime event helpers.
pub mod events;
/// Background closure of expired polls.
pub mod expiry_service;
/// Health check service.
pub mod health_service;
/// Poll lifecycle and tally computation.
pub mod poll_service;
/// Student roster management.
pub mod student_service;
/// Vote admission and recording.
pub mod vote_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
