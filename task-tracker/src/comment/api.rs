use crate::comment::{Comment, CommentService, CommentServiceError};
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

/// JSON request payload for commenting on a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    /// Comment text (required)
    #[serde(default)]
    text: Option<String>,
    /// Author name, "Anonymous" when omitted
    #[serde(default)]
    author: Option<String>,
}

impl From<CommentServiceError> for ApiError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::TaskNotFound(_) => ApiError::NotFound("Task not found".to_string()),
            CommentServiceError::CommentNotFound(_) => {
                ApiError::NotFound("Comment not found".to_string())
            }
            CommentServiceError::Store(err) => ApiError::Storage(err),
        }
    }
}

/// Handler for GET /api/tasks/{id}/comments - Returns the comments of a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/comments",
    params(("id" = u32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Comments of the task, possibly empty", body = Vec<Comment>)
    ),
    tag = "Comments"
)]
pub async fn get_comments_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = CommentService::new(&state.store)
        .get_comments_for_task(task_id)
        .await?;
    Ok(Json(comments))
}

/// Handler for POST /api/tasks/{id}/comments - Comments on a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments",
    params(("id" = u32, Path, description = "Task ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Text missing or body malformed", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u32>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let Json(request) = payload?;
    let text = request
        .text
        .ok_or_else(|| ApiError::Validation("Comment text is required".to_string()))?;
    let comment = CommentService::new(&state.store)
        .create_comment(task_id, text, request.author)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Handler for DELETE /api/comments/{id} - Deletes a comment.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = u32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn delete_comment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<MessageResponse>, ApiError> {
    CommentService::new(&state.store).delete_comment(id).await?;
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

/// Creates and returns the comments API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/tasks/{id}/comments",
            get(get_comments_handler).post(create_comment_handler),
        )
        .route("/api/comments/{id}", delete(delete_comment_handler))
        .with_state(state)
}
