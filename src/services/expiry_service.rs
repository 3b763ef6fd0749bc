use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::{
    dao::{models::PollStatus, polls::PollRepository},
    error::ServiceError,
    services::poll_service,
    state::SharedState,
};

/// Periodically close active polls whose deadline has passed.
///
/// The sweep and a manual close are both plain status transitions, so they
/// compose idempotently: whichever lands second finds the poll already
/// closed and changes nothing observable. While the storage backend is
/// unavailable the sweeper parks on the degraded-mode watch channel instead
/// of ticking into errors.
pub async fn run_expiry_sweeper(state: SharedState) {
    let mut degraded = state.degraded_watcher();
    let period = Duration::from_secs(state.config().expiry_sweep_secs().max(1));
    let mut ticker = tokio::time::interval(period);
    info!(period_secs = period.as_secs(), "expiry sweeper started");

    loop {
        ticker.tick().await;
        if *degraded.borrow() {
            if degraded.wait_for(|flag| !*flag).await.is_err() {
                break;
            }
            continue;
        }
        if let Err(err) = sweep_once(&state).await {
            warn!(error = %err, "expiry sweep failed");
        }
    }
}

/// Close every active poll whose deadline has passed, one transition each.
async fn sweep_once(state: &SharedState) -> Result<(), ServiceError> {
    let mongo = state.require_mongo().await?;
    let polls = PollRepository::new(mongo).list_active().await?;
    let now = SystemTime::now();

    for poll in polls.into_iter().filter(|poll| poll.is_expired(now)) {
        info!(poll_id = %poll.id, "closing expired poll");
        if let Err(err) = poll_service::transition_status(state, poll.id, PollStatus::Closed).await
        {
            // Retried on the next sweep.
            warn!(poll_id = %poll.id, error = %err, "failed to close expired poll");
        }
    }

    Ok(())
}
