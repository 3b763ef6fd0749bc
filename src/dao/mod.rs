/// Chat message persistence.
pub mod messages;
/// Database model definitions.
pub mod models;
/// MongoDB connection management and index bootstrap.
pub mod mongodb;
/// Poll persistence, including atomic vote counter bumps.
pub mod polls;
/// User persistence and the teacher singleton constraint.
pub mod users;
/// Vote persistence under the one-vote-per-user constraint.
pub mod votes;

use ::mongodb::bson::{Binary, spec::BinarySubtype};
use uuid::Uuid;

/// Encode a UUID the way the driver stores it, for use in query filters.
pub(crate) fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}
