use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        poll::PollResults,
        vote::{SubmitVoteRequest, VoteDto},
    },
    error::AppError,
    services::vote_service,
    state::SharedState,
};

/// Routes handling vote submission and lookup.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/votes", post(submit_vote))
        .route("/votes/user/{user_id}/poll/{poll_id}", get(get_user_vote))
        .route("/votes/poll/{poll_id}", get(list_poll_votes))
}

/// Submit a vote on an active poll.
#[utoipa::path(
    post,
    path = "/api/votes",
    tag = "votes",
    request_body = SubmitVoteRequest,
    responses(
        (status = 200, description = "Vote accepted, fresh tally returned", body = PollResults),
        (status = 400, description = "Poll not active, expired, bad option, or duplicate vote"),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn submit_vote(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitVoteRequest>,
) -> Result<Json<PollResults>, AppError> {
    let results = vote_service::submit_vote(
        &state,
        payload.poll_id,
        payload.user_id,
        payload.option_index,
    )
    .await?;
    Ok(Json(results))
}

/// Fetch the vote a user holds on a poll, if any.
#[utoipa::path(
    get,
    path = "/api/votes/user/{user_id}/poll/{poll_id}",
    tag = "votes",
    params(
        ("user_id" = Uuid, Path, description = "Identifier of the user"),
        ("poll_id" = Uuid, Path, description = "Identifier of the poll")
    ),
    responses((status = 200, description = "The user's vote, or null", body = VoteDto))
)]
pub async fn get_user_vote(
    State(state): State<SharedState>,
    Path((user_id, poll_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Option<VoteDto>>, AppError> {
    let vote = vote_service::get_user_vote(&state, user_id, poll_id).await?;
    Ok(Json(vote))
}

/// List every committed vote for a poll.
#[utoipa::path(
    get,
    path = "/api/votes/poll/{poll_id}",
    tag = "votes",
    params(("poll_id" = Uuid, Path, description = "Identifier of the poll")),
    responses((status = 200, description = "Committed votes", body = [VoteDto]))
)]
pub async fn list_poll_votes(
    State(state): State<SharedState>,
    Path(poll_id): Path<Uuid>,
) -> Result<Json<Vec<VoteDto>>, AppError> {
    let votes = vote_service::list_poll_votes(&state, poll_id).await?;
    Ok(Json(votes))
}
