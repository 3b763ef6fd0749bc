//! Library crate for live-poll-back, exposing modules for the binary and integration tests.

/// Runtime configuration loading.
pub mod config;
/// MongoDB connection management and repositories.
pub mod dao;
/// Wire-level request, response, and event types.
pub mod dto;
/// Service and HTTP error taxonomy.
pub mod error;
/// HTTP and WebSocket route trees.
pub mod routes;
/// Application services.
pub mod services;
/// Shared state and the realtime room registry.
pub mod state;
