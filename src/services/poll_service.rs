use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{PollEntity, PollStatus, Role, UserEntity, VoteEntity},
        polls::PollRepository,
        users::UserRepository,
        votes::VoteRepository,
    },
    dto::poll::{CreatePollRequest, OptionResult, PollDto, PollResults},
    error::ServiceError,
    services::events,
    state::SharedState,
};

/// Create a poll in `draft` status, owned by the registered teacher.
pub async fn create_poll(
    state: &SharedState,
    request: CreatePollRequest,
) -> Result<PollDto, ServiceError> {
    let mongo = state.require_mongo().await?;
    ensure_teacher(state, request.created_by).await?;

    let poll = PollEntity::new(
        request.question.trim().to_string(),
        request
            .options
            .into_iter()
            .map(|option| option.trim().to_string())
            .collect(),
        request.created_by,
        request.time_limit,
    );

    PollRepository::new(mongo).insert(&poll).await?;
    info!(poll_id = %poll.id, "poll created");

    Ok(poll.into())
}

/// List every poll, newest first.
pub async fn list_polls(state: &SharedState) -> Result<Vec<PollDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let polls = PollRepository::new(mongo).list_all().await?;
    Ok(polls.into_iter().map(Into::into).collect())
}

/// List polls currently open for voting, newest first.
pub async fn list_active_polls(state: &SharedState) -> Result<Vec<PollDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let polls = PollRepository::new(mongo).list_active().await?;
    Ok(polls.into_iter().map(Into::into).collect())
}

/// Fetch a single poll.
pub async fn get_poll(state: &SharedState, poll_id: Uuid) -> Result<PollDto, ServiceError> {
    Ok(find_poll(state, poll_id).await?.into())
}

/// Transition a poll's status on behalf of the teacher.
pub async fn update_status(
    state: &SharedState,
    poll_id: Uuid,
    status: PollStatus,
    requested_by: Uuid,
) -> Result<PollDto, ServiceError> {
    ensure_teacher(state, requested_by).await?;
    transition_status(state, poll_id, status).await
}

/// Transition a poll's status and broadcast the change to its room.
///
/// Re-activation is not blocked; the deadline is computed only when the poll
/// newly enters `active` with a time limit set. Used directly by the trusted
/// realtime channel and by the expiry sweeper, both of which carry no
/// requesting user.
pub async fn transition_status(
    state: &SharedState,
    poll_id: Uuid,
    status: PollStatus,
) -> Result<PollDto, ServiceError> {
    let mongo = state.require_mongo().await?;
    let repository = PollRepository::new(mongo);

    let mut poll = repository
        .find(poll_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("poll `{poll_id}` not found")))?;

    poll.apply_status(status, SystemTime::now());
    repository.update_status(&poll).await?;

    info!(poll_id = %poll.id, status = ?poll.status, "poll status changed");
    events::broadcast_poll_status(state, &poll);

    Ok(poll.into())
}

/// Recompute the tally snapshot for a poll from its committed vote set.
pub async fn get_results(state: &SharedState, poll_id: Uuid) -> Result<PollResults, ServiceError> {
    let mongo = state.require_mongo().await?;
    let poll = find_poll(state, poll_id).await?;
    let votes = VoteRepository::new(mongo).find_for_poll(poll_id).await?;
    Ok(compute_results(&poll, &votes))
}

/// Tally votes per option and derive percentages.
///
/// The counts come from the authoritative vote set, not the poll's cached
/// counters, so the two bookkeeping paths can be checked against each other.
/// Percentages are rounded to two decimal places and are all zero when no
/// vote has been committed yet.
pub fn compute_results(poll: &PollEntity, votes: &[VoteEntity]) -> PollResults {
    let total_votes = votes.len() as u32;

    let options = poll
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let option_votes = votes
                .iter()
                .filter(|vote| vote.option_index == index as u32)
                .count() as u32;
            let percentage = if total_votes > 0 {
                round2(f64::from(option_votes) / f64::from(total_votes) * 100.0)
            } else {
                0.0
            };
            OptionResult {
                text: option.text.clone(),
                votes: option_votes,
                percentage,
            }
        })
        .collect();

    PollResults {
        question: poll.question.clone(),
        total_votes,
        options,
    }
}

/// Fail unless `user_id` is the registered, active teacher.
pub async fn ensure_teacher(state: &SharedState, user_id: Uuid) -> Result<UserEntity, ServiceError> {
    let mongo = state.require_mongo().await?;
    let user = UserRepository::new(mongo).find(user_id).await?;

    match user {
        Some(user) if user.role == Role::Teacher && user.is_active => Ok(user),
        _ => Err(ServiceError::Unauthorized(
            "only the registered teacher can do this".into(),
        )),
    }
}

pub(crate) async fn find_poll(
    state: &SharedState,
    poll_id: Uuid,
) -> Result<PollEntity, ServiceError> {
    let mongo = state.require_mongo().await?;
    PollRepository::new(mongo)
        .find(poll_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("poll `{poll_id}` not found")))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(options: &[&str]) -> PollEntity {
        PollEntity::new(
            "Pick one".into(),
            options.iter().map(|s| s.to_string()).collect(),
            Uuid::new_v4(),
            None,
        )
    }

    fn vote(poll_id: Uuid, option_index: u32) -> VoteEntity {
        VoteEntity::new(poll_id, Uuid::new_v4(), option_index)
    }

    #[test]
    fn empty_vote_set_yields_zero_percentages() {
        let poll = poll(&["A", "B"]);
        let results = compute_results(&poll, &[]);

        assert_eq!(results.total_votes, 0);
        assert!(results.options.iter().all(|o| o.votes == 0));
        assert!(results.options.iter().all(|o| o.percentage == 0.0));
    }

    #[test]
    fn two_voters_split_fifty_fifty() {
        let poll = poll(&["A", "B"]);
        let votes = vec![vote(poll.id, 0), vote(poll.id, 1)];

        let results = compute_results(&poll, &votes);

        assert_eq!(results.question, "Pick one");
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.options[0].votes, 1);
        assert_eq!(results.options[0].percentage, 50.0);
        assert_eq!(results.options[1].votes, 1);
        assert_eq!(results.options[1].percentage, 50.0);
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let poll = poll(&["A", "B"]);
        let votes = vec![vote(poll.id, 0), vote(poll.id, 0), vote(poll.id, 1)];

        let results = compute_results(&poll, &votes);

        assert_eq!(results.options[0].percentage, 66.67);
        assert_eq!(results.options[1].percentage, 33.33);
    }

    #[test]
    fn percentages_sum_to_roughly_one_hundred() {
        let poll = poll(&["A", "B", "C"]);
        let votes = vec![
            vote(poll.id, 0),
            vote(poll.id, 1),
            vote(poll.id, 1),
            vote(poll.id, 2),
            vote(poll.id, 2),
            vote(poll.id, 2),
            vote(poll.id, 2),
        ];

        let results = compute_results(&poll, &votes);
        let sum: f64 = results.options.iter().map(|o| o.percentage).sum();
        assert!((sum - 100.0).abs() < 0.05, "sum was {sum}");
    }

    #[test]
    fn out_of_range_votes_are_not_counted_against_any_option() {
        // A vote referencing a vanished option index must not panic the tally.
        let poll = poll(&["A", "B"]);
        let votes = vec![vote(poll.id, 0), vote(poll.id, 7)];

        let results = compute_results(&poll, &votes);

        assert_eq!(results.total_votes, 2);
        assert_eq!(results.options[0].votes, 1);
        assert_eq!(results.options[1].votes, 0);
    }
}
