use crate::user::{User, UserService, UserServiceError};
use crate::web::AppState;
use crate::web::api::{ApiError, ErrorResponse, MessageResponse};
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON request payload for creating a user.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Name of the user (required, unique ignoring case)
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::DuplicateName(_) => {
                ApiError::Validation("User already exists".to_string())
            }
            UserServiceError::UserNotFound(_) => ApiError::NotFound("User not found".to_string()),
            UserServiceError::Store(err) => ApiError::Storage(err),
        }
    }
}

/// Handler for GET /api/users - Returns all users.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Successfully retrieved users", body = Vec<User>)
    ),
    tag = "Users"
)]
pub async fn get_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = UserService::new(&state.store).get_all_users().await?;
    Ok(Json(users))
}

/// Handler for POST /api/users - Creates a user.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Name missing, already taken or body malformed", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(request) = payload?;
    let name = request
        .name
        .ok_or_else(|| ApiError::Validation("Name is required".to_string()))?;
    let user = UserService::new(&state.store)
        .create_user(name, request.email.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Handler for DELETE /api/users/{id} - Deletes a user and unassigns their tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<MessageResponse>, ApiError> {
    UserService::new(&state.store).delete_user(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Creates and returns the users API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users", get(get_users_handler).post(create_user_handler))
        .route("/api/users/{id}", delete(delete_user_handler))
        .with_state(state)
}
