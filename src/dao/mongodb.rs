use mongodb::{
    Client, Database, IndexModel,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::RwLock,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_DB: &str = "live_poll";
const MAX_CONNECT_ATTEMPTS: u32 = 10;
const BASE_RETRY_DELAY_MS: u64 = 250;
const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Mongo server error code raised on unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Handle to the MongoDB connection that transparently reconnects.
#[derive(Clone)]
pub struct MongoManager {
    inner: Arc<MongoManagerInner>,
}

struct MongoManagerInner {
    state: RwLock<MongoState>,
    options: ClientOptions,
    database_name: String,
    uri: String,
}

struct MongoState {
    client: Client,
    database: Database,
}

type Result<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB data access layer.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The driver client could not be constructed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The initial connection never became healthy.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed for a collection.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Name of the index definition.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A unique index rejected an insert.
    #[error("duplicate key in collection `{collection}`")]
    DuplicateKey {
        /// Collection whose unique index fired.
        collection: &'static str,
    },
    /// Writing a user record failed.
    #[error("failed to save user `{id}`")]
    SaveUser {
        /// User primary key.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Reading or querying user records failed.
    #[error("failed to query users")]
    QueryUsers {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Building a poll update document failed.
    #[error("failed to encode update for poll `{id}`")]
    EncodePoll {
        /// Poll primary key.
        id: Uuid,
        /// Serializer-level cause.
        #[source]
        source: mongodb::bson::error::Error,
    },
    /// Writing a poll record failed.
    #[error("failed to save poll `{id}`")]
    SavePoll {
        /// Poll primary key.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Reading or querying poll records failed.
    #[error("failed to query polls")]
    QueryPolls {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The atomic vote-counter bump failed.
    #[error("failed to record vote counters on poll `{id}`")]
    RecordVote {
        /// Poll primary key.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Writing a vote record failed.
    #[error("failed to save vote for poll `{poll}` by user `{user}`")]
    SaveVote {
        /// Poll the vote targets.
        poll: Uuid,
        /// Voting user.
        user: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Reading or querying vote records failed.
    #[error("failed to query votes")]
    QueryVotes {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Writing a chat message failed.
    #[error("failed to save message `{id}`")]
    SaveMessage {
        /// Message primary key.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Reading chat history failed.
    #[error("failed to query messages")]
    QueryMessages {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
}

impl MongoDaoError {
    /// Whether this error is a unique index violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, MongoDaoError::DuplicateKey { .. })
    }
}

/// Whether a driver error is a unique index violation on insert.
pub(crate) fn is_duplicate_key_error(err: &MongoError) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

/// Connect to MongoDB and start a watcher that keeps the connection healthy.
pub async fn connect(uri: &str, db_name: Option<&str>) -> Result<MongoManager> {
    let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();
    let options = ClientOptions::parse(uri)
        .await
        .map_err(|source| MongoDaoError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?;

    let (client, database) = establish_connection(&options, &database_name).await?;

    let state = MongoState { client, database };
    let inner = Arc::new(MongoManagerInner {
        state: RwLock::new(state),
        options,
        database_name,
        uri: uri.to_owned(),
    });

    MongoManagerInner::spawn_health_task(&inner);

    Ok(MongoManager { inner })
}

/// Ensure the indexes backing the system's uniqueness constraints are present.
///
/// Most of them are correctness backstops rather than performance aids: the
/// partial unique index keeping a single teacher row, the compound unique
/// index reserving one display name per role, and the compound unique index
/// enforcing one vote per (poll, user) pair.
pub async fn ensure_indexes(database: &Database) -> Result<()> {
    let users = database.collection::<mongodb::bson::Document>("users");
    let single_teacher = IndexModel::builder()
        .keys(doc! { "role": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { "role": "teacher" })
                .build(),
        )
        .build();
    users
        .create_index(single_teacher)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: "users",
            index: "single_teacher",
            source,
        })?;

    let unique_name_per_role = IndexModel::builder()
        .keys(doc! { "name": 1, "role": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    users
        .create_index(unique_name_per_role)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: "users",
            index: "unique_name_per_role",
            source,
        })?;

    let votes = database.collection::<mongodb::bson::Document>("votes");
    let one_vote_per_user = IndexModel::builder()
        .keys(doc! { "poll": 1, "user": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    votes
        .create_index(one_vote_per_user)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: "votes",
            index: "one_vote_per_user",
            source,
        })?;

    let polls = database.collection::<mongodb::bson::Document>("polls");
    let status_created = IndexModel::builder()
        .keys(doc! { "status": 1, "created_at": -1 })
        .build();
    polls
        .create_index(status_created)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection: "polls",
            index: "status_created",
            source,
        })?;

    Ok(())
}

impl MongoManager {
    /// Clone the current database handle.
    pub async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    /// Issue a ping against the current MongoDB connection.
    pub async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }
}

impl MongoManagerInner {
    fn spawn_health_task(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(HEALTH_CHECK_INTERVAL_SECS));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };

                if let Err(err) = inner.ping().await {
                    warn!(error = %err, "MongoDB health ping failed; attempting reconnect");
                    inner.reconnect().await;
                }
            }
        });
    }

    async fn ping(&self) -> Result<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;

        Ok(())
    }

    async fn reconnect(&self) {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match establish_connection(&self.options, &self.database_name).await {
                Ok((client, database)) => {
                    {
                        let mut guard = self.state.write().await;
                        guard.client = client;
                        guard.database = database;
                    }
                    info!(attempt, "reconnected to MongoDB");
                    break;
                }
                Err(err) => {
                    error!(
                        attempt,
                        error = %err,
                        uri = %self.uri,
                        "MongoDB reconnect attempt failed"
                    );

                    sleep(retry_delay(attempt)).await;
                }
            }
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let backoff_multiplier = 1u64 << (attempt.saturating_sub(1).min(4));
    Duration::from_millis(BASE_RETRY_DELAY_MS * backoff_multiplier).min(Duration::from_secs(5))
}

async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> Result<(Client, Database)> {
    let options = options.clone();
    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;

        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                if attempt > 1 {
                    info!(attempt, "connected to MongoDB after retry");
                }
                return Ok((client, database));
            }
            Err(err) if attempt < MAX_CONNECT_ATTEMPTS => {
                let wait = retry_delay(attempt);
                warn!(
                    attempt,
                    wait_ms = wait.as_millis(),
                    error = %err,
                    "MongoDB ping failed during initial connection; retrying"
                );
                sleep(wait).await;
            }
            Err(err) => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source: err,
                });
            }
        }
    }
}
