use axum::Router;

use crate::state::SharedState;

pub mod auth;
pub mod chat;
pub mod docs;
pub mod health;
pub mod polls;
pub mod students;
pub mod votes;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = auth::router()
        .merge(polls::router())
        .merge(votes::router())
        .merge(students::router())
        .merge(chat::router())
        .merge(health::router());

    let docs_router = docs::router(state.clone());

    Router::new()
        .nest("/api", api_router)
        .merge(websocket::router())
        .merge(docs_router)
        .with_state(state)
}
