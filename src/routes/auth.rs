use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, UserDto},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Routes handling login and user lookup.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/user/{id}", get(get_user))
}

/// Log in as the teacher or as a student, creating the record when needed.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserDto),
        (status = 403, description = "Login refused for a removed student"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<UserDto>, AppError> {
    let user = auth_service::login(&state, payload).await?;
    Ok(Json(user))
}

/// Fetch a user by id.
#[utoipa::path(
    get,
    path = "/api/auth/user/{id}",
    tag = "auth",
    params(("id" = Uuid, Path, description = "Identifier of the user")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, AppError> {
    let user = auth_service::get_user(&state, id).await?;
    Ok(Json(user))
}
