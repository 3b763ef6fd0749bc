use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};
use uuid::Uuid;

use crate::dao::{
    models::VoteEntity,
    mongodb::{MongoDaoError, MongoManager, is_duplicate_key_error},
    uuid_as_binary,
};

const VOTE_COLLECTION_NAME: &str = "votes";

/// Data access object for vote records.
///
/// Duplicate submissions are not filtered here by a preliminary read: the
/// unique `(poll, user)` index decides at insert time, which is what makes two
/// racing submissions from the same user resolve to exactly one commit.
#[derive(Clone)]
pub struct VoteRepository {
    mongo: MongoManager,
}

impl VoteRepository {
    /// Wrap the shared connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn collection(&self) -> Collection<VoteEntity> {
        self.mongo
            .database()
            .await
            .collection::<VoteEntity>(VOTE_COLLECTION_NAME)
    }

    /// Insert a vote, failing with a duplicate-key error when the user has
    /// already voted on this poll.
    pub async fn insert(&self, vote: &VoteEntity) -> Result<(), MongoDaoError> {
        self.collection()
            .await
            .insert_one(vote)
            .await
            .map_err(|source| {
                if is_duplicate_key_error(&source) {
                    MongoDaoError::DuplicateKey {
                        collection: VOTE_COLLECTION_NAME,
                    }
                } else {
                    MongoDaoError::SaveVote {
                        poll: vote.poll,
                        user: vote.user,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    /// Fetch every vote committed against a poll.
    pub async fn find_for_poll(&self, poll_id: Uuid) -> Result<Vec<VoteEntity>, MongoDaoError> {
        self.collection()
            .await
            .find(doc! { "poll": uuid_as_binary(poll_id) })
            .await
            .map_err(|source| MongoDaoError::QueryVotes { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryVotes { source })
    }

    /// Fetch the vote a user holds on a poll, if any.
    pub async fn find_by_poll_and_user(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<VoteEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one(doc! {
                "poll": uuid_as_binary(poll_id),
                "user": uuid_as_binary(user_id),
            })
            .await
            .map_err(|source| MongoDaoError::QueryVotes { source })
    }
}
