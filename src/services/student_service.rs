use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{models::Role, users::UserRepository},
    dto::auth::UserDto,
    error::ServiceError,
    state::SharedState,
};

/// List the active students, in join order.
pub async fn list_students(state: &SharedState) -> Result<Vec<UserDto>, ServiceError> {
    let mongo = state.require_mongo().await?;
    let students = UserRepository::new(mongo).list_active_students().await?;
    Ok(students.into_iter().map(Into::into).collect())
}

/// Deactivate a student and force-disconnect their live connections.
///
/// Deactivation is permanent: the name stays reserved and further logins
/// under it are refused.
pub async fn remove_student(state: &SharedState, student_id: Uuid) -> Result<UserDto, ServiceError> {
    let mongo = state.require_mongo().await?;
    let users = UserRepository::new(mongo);

    let student = users
        .find(student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("student `{student_id}` not found")))?;

    if student.role != Role::Student {
        return Err(ServiceError::InvalidInput(
            "only students can be removed".into(),
        ));
    }

    let student = users.deactivate(student_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("student `{student_id}` not found"))
    })?;

    let kicked = state
        .rooms()
        .kick_user(student_id, "You have been removed by the teacher");
    info!(student_id = %student_id, kicked, "student removed");

    Ok(student.into())
}
