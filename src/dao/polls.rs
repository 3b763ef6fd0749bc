use futures::TryStreamExt;
use mongodb::{
    Collection,
    bson::{self, Document, doc},
};
use uuid::Uuid;

use crate::dao::{
    models::{PollEntity, PollStatus},
    mongodb::{MongoDaoError, MongoManager},
    uuid_as_binary,
};

const POLL_COLLECTION_NAME: &str = "polls";

/// Data access object for poll documents.
#[derive(Clone)]
pub struct PollRepository {
    mongo: MongoManager,
}

impl PollRepository {
    /// Wrap the shared connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn collection(&self) -> Collection<PollEntity> {
        self.mongo
            .database()
            .await
            .collection::<PollEntity>(POLL_COLLECTION_NAME)
    }

    /// Insert a freshly created poll.
    pub async fn insert(&self, poll: &PollEntity) -> Result<(), MongoDaoError> {
        self.collection()
            .await
            .insert_one(poll)
            .await
            .map_err(|source| MongoDaoError::SavePoll {
                id: poll.id,
                source,
            })?;
        Ok(())
    }

    /// Apply a status transition as a targeted `$set`.
    ///
    /// Only the status, deadline, and update timestamp are written. The
    /// cached vote counters are never part of this write, so a concurrent
    /// `$inc` from [`Self::record_vote`] landing between the caller's read
    /// and this update cannot be reverted by it.
    pub async fn update_status(&self, poll: &PollEntity) -> Result<(), MongoDaoError> {
        let update = status_update(poll).map_err(|source| MongoDaoError::EncodePoll {
            id: poll.id,
            source,
        })?;
        self.collection()
            .await
            .update_one(doc! { "_id": uuid_as_binary(poll.id) }, update)
            .await
            .map_err(|source| MongoDaoError::SavePoll {
                id: poll.id,
                source,
            })?;
        Ok(())
    }

    /// Fetch a poll by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<PollEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one(doc! { "_id": uuid_as_binary(id) })
            .await
            .map_err(|source| MongoDaoError::QueryPolls { source })
    }

    /// List every poll, newest first.
    pub async fn list_all(&self) -> Result<Vec<PollEntity>, MongoDaoError> {
        self.collection()
            .await
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|source| MongoDaoError::QueryPolls { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryPolls { source })
    }

    /// List polls currently open for voting, newest first.
    pub async fn list_active(&self) -> Result<Vec<PollEntity>, MongoDaoError> {
        self.collection()
            .await
            .find(doc! { "status": status_str(PollStatus::Active) })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|source| MongoDaoError::QueryPolls { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryPolls { source })
    }

    /// Atomically bump the chosen option counter and the poll total.
    ///
    /// Expressed as a single `$inc` scoped to the poll id and `active` status
    /// so concurrent accepted votes can never lose updates the way a
    /// read-modify-write of the document would. Returns `false` when nothing
    /// matched, i.e. the poll vanished or left `active` in the meantime.
    pub async fn record_vote(
        &self,
        poll_id: Uuid,
        option_index: u32,
    ) -> Result<bool, MongoDaoError> {
        let option_votes_path = format!("options.{option_index}.votes");
        let result = self
            .collection()
            .await
            .update_one(
                doc! {
                    "_id": uuid_as_binary(poll_id),
                    "status": status_str(PollStatus::Active),
                },
                doc! { "$inc": { option_votes_path: 1, "total_votes": 1 } },
            )
            .await
            .map_err(|source| MongoDaoError::RecordVote {
                id: poll_id,
                source,
            })?;

        Ok(result.modified_count == 1)
    }
}

fn status_str(status: PollStatus) -> &'static str {
    match status {
        PollStatus::Draft => "draft",
        PollStatus::Active => "active",
        PollStatus::Closed => "closed",
    }
}

/// Build the `$set` document for a status transition.
///
/// The fields are lifted out of the entity's own serialized form so the
/// updated document deserializes exactly as a freshly inserted one would.
fn status_update(poll: &PollEntity) -> Result<Document, bson::error::Error> {
    let mut full = bson::serialize_to_document(poll)?;
    let mut set = Document::new();
    for key in ["status", "expires_at", "updated_at"] {
        if let Some(value) = full.remove(key) {
            set.insert(key, value);
        }
    }
    Ok(doc! { "$set": set })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn active_poll() -> PollEntity {
        let mut poll = PollEntity::new(
            "Pick one".into(),
            vec!["A".into(), "B".into()],
            Uuid::new_v4(),
            Some(60),
        );
        poll.apply_status(PollStatus::Active, SystemTime::now());
        poll
    }

    #[test]
    fn status_update_never_touches_counter_fields() {
        // A transition racing an accepted vote must not write back stale
        // counters; the update may only carry the transition fields.
        let mut poll = active_poll();
        poll.total_votes = 5;
        poll.options[0].votes = 5;
        poll.apply_status(PollStatus::Closed, SystemTime::now());

        let update = status_update(&poll).unwrap();
        let set = update.get_document("$set").unwrap();

        let mut keys: Vec<&str> = set.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["expires_at", "status", "updated_at"]);
        assert!(!set.contains_key("total_votes"));
        assert!(!set.contains_key("options"));
    }

    #[test]
    fn status_update_encodes_fields_like_a_full_document_write() {
        let poll = active_poll();

        let update = status_update(&poll).unwrap();
        let set = update.get_document("$set").unwrap();
        let full = bson::serialize_to_document(&poll).unwrap();

        assert_eq!(set.get("status"), full.get("status"));
        assert_eq!(set.get("expires_at"), full.get("expires_at"));
        assert_eq!(set.get("updated_at"), full.get("updated_at"));
    }
}
