use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::poll::{CreatePollRequest, PollDto, PollResults, UpdateStatusRequest},
    error::AppError,
    services::poll_service,
    state::SharedState,
};

/// Routes handling the poll lifecycle and results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/polls", get(list_polls).post(create_poll))
        .route("/polls/active", get(list_active_polls))
        .route("/polls/{id}", get(get_poll))
        .route("/polls/{id}/status", put(update_poll_status))
        .route("/polls/{id}/results", get(get_poll_results))
}

/// List every poll, newest first.
#[utoipa::path(
    get,
    path = "/api/polls",
    tag = "polls",
    responses((status = 200, description = "All polls", body = [PollDto]))
)]
pub async fn list_polls(State(state): State<SharedState>) -> Result<Json<Vec<PollDto>>, AppError> {
    let polls = poll_service::list_polls(&state).await?;
    Ok(Json(polls))
}

/// List polls currently open for voting, newest first.
#[utoipa::path(
    get,
    path = "/api/polls/active",
    tag = "polls",
    responses((status = 200, description = "Active polls", body = [PollDto]))
)]
pub async fn list_active_polls(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PollDto>>, AppError> {
    let polls = poll_service::list_active_polls(&state).await?;
    Ok(Json(polls))
}

/// Fetch a single poll.
#[utoipa::path(
    get,
    path = "/api/polls/{id}",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Identifier of the poll")),
    responses(
        (status = 200, description = "Poll found", body = PollDto),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn get_poll(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PollDto>, AppError> {
    let poll = poll_service::get_poll(&state, id).await?;
    Ok(Json(poll))
}

/// Create a poll in `draft` status.
#[utoipa::path(
    post,
    path = "/api/polls",
    tag = "polls",
    request_body = CreatePollRequest,
    responses(
        (status = 200, description = "Poll created", body = PollDto),
        (status = 400, description = "Invalid question or options"),
        (status = 403, description = "Requester is not the registered teacher")
    )
)]
pub async fn create_poll(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreatePollRequest>>,
) -> Result<Json<PollDto>, AppError> {
    let poll = poll_service::create_poll(&state, payload).await?;
    Ok(Json(poll))
}

/// Transition a poll between `draft`, `active` and `closed`.
#[utoipa::path(
    put,
    path = "/api/polls/{id}/status",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Identifier of the poll")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = PollDto),
        (status = 403, description = "Requester is not the registered teacher"),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn update_poll_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<PollDto>, AppError> {
    let poll =
        poll_service::update_status(&state, id, payload.status, payload.requested_by).await?;
    Ok(Json(poll))
}

/// Recompute the tally snapshot for a poll.
#[utoipa::path(
    get,
    path = "/api/polls/{id}/results",
    tag = "polls",
    params(("id" = Uuid, Path, description = "Identifier of the poll")),
    responses(
        (status = 200, description = "Current tally", body = PollResults),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn get_poll_results(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PollResults>, AppError> {
    let results = poll_service::get_results(&state, id).await?;
    Ok(Json(results))
}
