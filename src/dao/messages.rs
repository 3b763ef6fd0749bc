use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};

use crate::dao::{
    models::MessageEntity,
    mongodb::{MongoDaoError, MongoManager},
};

const MESSAGE_COLLECTION_NAME: &str = "messages";

/// Data access object for the append-only chat log.
#[derive(Clone)]
pub struct MessageRepository {
    mongo: MongoManager,
}

impl MessageRepository {
    /// Wrap the shared connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn collection(&self) -> Collection<MessageEntity> {
        self.mongo
            .database()
            .await
            .collection::<MessageEntity>(MESSAGE_COLLECTION_NAME)
    }

    /// Append a message to the log.
    pub async fn insert(&self, message: &MessageEntity) -> Result<(), MongoDaoError> {
        self.collection()
            .await
            .insert_one(message)
            .await
            .map_err(|source| MongoDaoError::SaveMessage {
                id: message.id,
                source,
            })?;
        Ok(())
    }

    /// Fetch the full history, oldest first.
    pub async fn list_all(&self) -> Result<Vec<MessageEntity>, MongoDaoError> {
        self.collection()
            .await
            .find(doc! {})
            .sort(doc! { "timestamp": 1 })
            .await
            .map_err(|source| MongoDaoError::QueryMessages { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryMessages { source })
    }

    /// Fetch the most recent `limit` messages, returned oldest first.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<MessageEntity>, MongoDaoError> {
        let mut messages: Vec<MessageEntity> = self
            .collection()
            .await
            .find(doc! {})
            .sort(doc! { "timestamp": -1 })
            .limit(i64::from(limit))
            .await
            .map_err(|source| MongoDaoError::QueryMessages { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryMessages { source })?;

        messages.reverse();
        Ok(messages)
    }
}
