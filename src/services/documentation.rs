use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live polling backend.
#[openapi(
    paths(
        crate::routes::auth::login,
        crate::routes::auth::get_user,
        crate::routes::polls::list_polls,
        crate::routes::polls::list_active_polls,
        crate::routes::polls::get_poll,
        crate::routes::polls::create_poll,
        crate::routes::polls::update_poll_status,
        crate::routes::polls::get_poll_results,
        crate::routes::votes::submit_vote,
        crate::routes::votes::get_user_vote,
        crate::routes::votes::list_poll_votes,
        crate::routes::students::list_students,
        crate::routes::students::remove_student,
        crate::routes::chat::chat_history,
        crate::routes::chat::recent_chat_history,
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dao::models::Role,
            crate::dao::models::PollStatus,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::UserDto,
            crate::dto::poll::CreatePollRequest,
            crate::dto::poll::UpdateStatusRequest,
            crate::dto::poll::PollDto,
            crate::dto::poll::OptionDto,
            crate::dto::poll::PollResults,
            crate::dto::poll::OptionResult,
            crate::dto::vote::SubmitVoteRequest,
            crate::dto::vote::VoteDto,
            crate::dto::chat::MessageDto,
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "auth", description = "Login and user lookup"),
        (name = "polls", description = "Poll lifecycle and results"),
        (name = "votes", description = "Vote submission and lookup"),
        (name = "students", description = "Student roster management"),
        (name = "chat", description = "Shared classroom chat"),
        (name = "health", description = "Health check endpoints"),
        (name = "realtime", description = "WebSocket channel for live classroom events"),
    )
)]
pub struct ApiDoc;
