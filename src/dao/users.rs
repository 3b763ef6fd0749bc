use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};
use uuid::Uuid;

use crate::dao::{
    models::{Role, UserEntity},
    mongodb::{MongoDaoError, MongoManager, is_duplicate_key_error},
    uuid_as_binary,
};

const USER_COLLECTION_NAME: &str = "users";

/// Data access object for user records.
///
/// Neither the teacher singleton nor name uniqueness is guarded here by
/// application logic: inserting a second teacher row trips the partial unique
/// index, and inserting a taken (name, role) pair trips the compound unique
/// index. Both surface as [`MongoDaoError::DuplicateKey`], which callers
/// resolve by re-fetching.
#[derive(Clone)]
pub struct UserRepository {
    mongo: MongoManager,
}

impl UserRepository {
    /// Wrap the shared connection manager.
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn collection(&self) -> Collection<UserEntity> {
        self.mongo
            .database()
            .await
            .collection::<UserEntity>(USER_COLLECTION_NAME)
    }

    /// Insert a new user, failing with a duplicate-key error when the teacher
    /// singleton index rejects it.
    pub async fn insert(&self, user: &UserEntity) -> Result<(), MongoDaoError> {
        self.collection()
            .await
            .insert_one(user)
            .await
            .map_err(|source| {
                if is_duplicate_key_error(&source) {
                    MongoDaoError::DuplicateKey {
                        collection: USER_COLLECTION_NAME,
                    }
                } else {
                    MongoDaoError::SaveUser {
                        id: user.id,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    /// Fetch a user by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<UserEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one(doc! { "_id": uuid_as_binary(id) })
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }

    /// Fetch a user by display name and role.
    pub async fn find_by_name_and_role(
        &self,
        name: &str,
        role: Role,
    ) -> Result<Option<UserEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one(doc! { "name": name, "role": role_str(role) })
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }

    /// Fetch the teacher row, if one has been registered.
    pub async fn find_teacher(&self) -> Result<Option<UserEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one(doc! { "role": role_str(Role::Teacher) })
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }

    /// List students that have not been deactivated, oldest first.
    pub async fn list_active_students(&self) -> Result<Vec<UserEntity>, MongoDaoError> {
        self.collection()
            .await
            .find(doc! { "role": role_str(Role::Student), "is_active": true })
            .sort(doc! { "joined_at": 1 })
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }

    /// Count every student row, active or not, for auto-numbered names.
    pub async fn count_students(&self) -> Result<u64, MongoDaoError> {
        self.collection()
            .await
            .count_documents(doc! { "role": role_str(Role::Student) })
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }

    /// Flip a user to inactive, returning the updated record.
    pub async fn deactivate(&self, id: Uuid) -> Result<Option<UserEntity>, MongoDaoError> {
        self.collection()
            .await
            .find_one_and_update(
                doc! { "_id": uuid_as_binary(id) },
                doc! { "$set": { "is_active": false } },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Teacher => "teacher",
        Role::Student => "student",
    }
}
