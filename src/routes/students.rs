use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::auth::UserDto, error::AppError, services::student_service, state::SharedState,
};

/// Routes handling the student roster.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/students", get(list_students))
        .route("/students/{id}/remove", put(remove_student))
}

/// List the active students, in join order.
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "students",
    responses((status = 200, description = "Active students", body = [UserDto]))
)]
pub async fn list_students(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserDto>>, AppError> {
    let students = student_service::list_students(&state).await?;
    Ok(Json(students))
}

/// Deactivate a student and force-disconnect their live connections.
#[utoipa::path(
    put,
    path = "/api/students/{id}/remove",
    tag = "students",
    params(("id" = Uuid, Path, description = "Identifier of the student")),
    responses(
        (status = 200, description = "Student removed", body = UserDto),
        (status = 400, description = "Target is not a student"),
        (status = 404, description = "Unknown student")
    )
)]
pub async fn remove_student(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, AppError> {
    let student = student_service::remove_student(&state, id).await?;
    Ok(Json(student))
}
