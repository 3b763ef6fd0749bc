use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{Role, UserEntity},
        users::UserRepository,
    },
    dto::auth::{LoginRequest, UserDto},
    error::ServiceError,
    state::SharedState,
};

/// Upper bound on attempts to find a free auto-numbered student name.
const MAX_NAME_ATTEMPTS: u64 = 1000;

/// Get-or-create a user for a login attempt.
///
/// The teacher is a singleton: its row is created insert-if-absent under the
/// partial unique index, so two racing first logins resolve to the same
/// record rather than two teachers. Students are looked up by name; a
/// deactivated student's name is permanently refused.
pub async fn login(state: &SharedState, request: LoginRequest) -> Result<UserDto, ServiceError> {
    let mongo = state.require_mongo().await?;
    let users = UserRepository::new(mongo);

    let user = match request.role {
        Role::Teacher => login_teacher(state, &users).await?,
        Role::Student => {
            let name = request
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty());
            match name {
                Some(name) => login_student(&users, name).await?,
                None => login_anonymous_student(state, &users).await?,
            }
        }
    };

    Ok(user.into())
}

/// Fetch a user by id.
pub async fn get_user(state: &SharedState, user_id: Uuid) -> Result<UserDto, ServiceError> {
    let mongo = state.require_mongo().await?;
    let user = UserRepository::new(mongo)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{user_id}` not found")))?;
    Ok(user.into())
}

async fn login_teacher(
    state: &SharedState,
    users: &UserRepository,
) -> Result<UserEntity, ServiceError> {
    if let Some(teacher) = users.find_teacher().await? {
        return Ok(teacher);
    }

    let teacher = UserEntity::new(state.config().teacher_name().to_string(), Role::Teacher);
    match users.insert(&teacher).await {
        Ok(()) => {
            info!(user_id = %teacher.id, "teacher registered");
            Ok(teacher)
        }
        // Lost the registration race: the winner's row is the teacher.
        Err(err) if err.is_duplicate_key() => {
            users.find_teacher().await?.ok_or_else(|| {
                ServiceError::InvalidState("teacher registration raced; retry login".into())
            })
        }
        Err(err) => Err(err.into()),
    }
}

async fn login_student(users: &UserRepository, name: &str) -> Result<UserEntity, ServiceError> {
    if let Some(student) = users.find_by_name_and_role(name, Role::Student).await? {
        return admit_student(student);
    }

    let student = UserEntity::new(name.to_string(), Role::Student);
    match users.insert(&student).await {
        Ok(()) => {
            info!(user_id = %student.id, name, "student registered");
            Ok(student)
        }
        // Lost the naming race: the winner's row owns this name.
        Err(err) if err.is_duplicate_key() => {
            match users.find_by_name_and_role(name, Role::Student).await? {
                Some(student) => admit_student(student),
                None => Err(ServiceError::InvalidState(
                    "student registration raced; retry login".into(),
                )),
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Admit a looked-up student, refusing deactivated ones.
fn admit_student(student: UserEntity) -> Result<UserEntity, ServiceError> {
    if !student.is_active {
        return Err(ServiceError::Unauthorized(
            "this student has been removed by the teacher".into(),
        ));
    }
    Ok(student)
}

/// Assign an auto-numbered name ("Student 3") to a login without one.
///
/// Deactivated students keep their number, so the search starts past the
/// total student count and walks forward until a free name is found. The
/// unique (name, role) index arbitrates concurrent logins claiming the same
/// number; the loser simply moves on to the next one.
async fn login_anonymous_student(
    state: &SharedState,
    users: &UserRepository,
) -> Result<UserEntity, ServiceError> {
    let prefix = state.config().student_name_prefix();
    let start = users.count_students().await? + 1;

    for offset in 0..MAX_NAME_ATTEMPTS {
        let name = numbered_name(prefix, start + offset);
        if users
            .find_by_name_and_role(&name, Role::Student)
            .await?
            .is_some()
        {
            continue;
        }

        let student = UserEntity::new(name.clone(), Role::Student);
        match users.insert(&student).await {
            Ok(()) => {
                info!(user_id = %student.id, name = %name, "anonymous student registered");
                return Ok(student);
            }
            Err(err) if err.is_duplicate_key() => continue,
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::InvalidInput(
        "could not allocate a student name; provide one explicitly".into(),
    ))
}

fn numbered_name(prefix: &str, number: u64) -> String {
    format!("{prefix} {number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_names_follow_the_prefix() {
        assert_eq!(numbered_name("Student", 3), "Student 3");
        assert_eq!(numbered_name("Eleve", 12), "Eleve 12");
    }

    #[test]
    fn active_students_are_admitted() {
        let student = UserEntity::new("Student 3".into(), Role::Student);
        let admitted = admit_student(student.clone()).unwrap();
        assert_eq!(admitted, student);
    }

    #[test]
    fn removed_students_are_refused() {
        // The refetch after a lost naming race goes through the same gate,
        // so a deactivated row is refused no matter which path found it.
        let mut student = UserEntity::new("Student 3".into(), Role::Student);
        student.is_active = false;

        assert!(matches!(
            admit_student(student),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
