use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PollStatus, VoteEntity},
        polls::PollRepository,
        votes::VoteRepository,
    },
    dto::{poll::PollResults, vote::VoteDto},
    error::ServiceError,
    services::{events, poll_service},
    state::SharedState,
};

/// Admit and record a single vote, then broadcast the fresh tally.
///
/// The checks run across several await points, so they cannot decide the
/// duplicate question by themselves: the unique `(poll, user)` index decides
/// at insert time, and any number of concurrent submissions for the same
/// pair resolve to exactly one committed vote.
pub async fn submit_vote(
    state: &SharedState,
    poll_id: Uuid,
    user_id: Uuid,
    option_index: u32,
) -> Result<PollResults, ServiceError> {
    let mongo = state.require_mongo().await?;
    let polls = PollRepository::new(mongo.clone());
    let votes = VoteRepository::new(mongo);

    let poll = polls
        .find(poll_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("poll `{poll_id}` not found")))?;

    if poll.status != PollStatus::Active {
        return Err(ServiceError::InvalidState("poll is not active".into()));
    }
    // The sweeper closes expired polls within one interval; rejecting here as
    // well removes the latency window entirely.
    if poll.is_expired(SystemTime::now()) {
        return Err(ServiceError::InvalidState("poll has expired".into()));
    }
    if option_index as usize >= poll.options.len() {
        return Err(ServiceError::InvalidInput(format!(
            "option index {option_index} is out of range (poll has {} options)",
            poll.options.len()
        )));
    }

    let vote = VoteEntity::new(poll_id, user_id, option_index);
    match votes.insert(&vote).await {
        Ok(()) => {}
        Err(err) if err.is_duplicate_key() => {
            return Err(ServiceError::DuplicateVote(
                "user has already voted on this poll".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    }

    // Counter bump is a single atomic $inc; it matches nothing when the poll
    // left `active` between the insert and now. The committed vote stands
    // either way and the broadcast tally below is recomputed from the vote
    // set, which stays authoritative.
    if !polls.record_vote(poll_id, option_index).await? {
        warn!(poll_id = %poll_id, "vote committed but poll left active before counter bump");
    }

    let all_votes = votes.find_for_poll(poll_id).await?;
    let results = poll_service::compute_results(&poll, &all_votes);

    info!(poll_id = %poll_id, user_id = %user_id, option_index, "vote accepted");
    events::broadcast_poll_updated(state, poll_id, results.clone());

    Ok(results)
}

/// Fetch the vote a user holds on a poll, if any.
pub async fn get_user_vote(
    state: &SharedState,
    user_id: Uuid,
    poll_id: Uuid,
) -> Result<Option<VoteDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let vote = VoteRepository::new(mongo)
        .find_by_poll_and_user(poll_id, user_id)
        .await?;
    Ok(vote.map(Into::into))
}

/// List every committed vote for a poll.
pub async fn list_poll_votes(
    state: &SharedState,
    poll_id: Uuid,
) -> Result<Vec<VoteDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let votes = VoteRepository::new(mongo).find_for_poll(poll_id).await?;
    Ok(votes.into_iter().map(Into::into).collect())
}
