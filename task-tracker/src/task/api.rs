use crate::task::{NewTask, Task, TaskService, TaskServiceError, TaskUpdate};
use crate::web::AppState;
use crate::web::api::{ApiError, ErrorResponse, MessageResponse};
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON request payload for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Title of the task (required)
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    /// ID of the user to assign the task to
    #[serde(default)]
    assigned_to: Option<u32>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = ApiError;

    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        let title = request
            .title
            .ok_or_else(|| ApiError::Validation("Title is required".to_string()))?;
        Ok(NewTask {
            title,
            description: request.description.unwrap_or_default(),
            completed: request.completed.unwrap_or_default(),
            assigned_to: request.assigned_to,
        })
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::TaskNotFound(_) => ApiError::NotFound("Item not found".to_string()),
            TaskServiceError::Store(err) => ApiError::Storage(err),
        }
    }
}

/// Handler for GET /api/items - Returns all tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = Vec<Task>)
    ),
    tag = "Items"
)]
pub async fn get_items_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = TaskService::new(&state.store).get_all_tasks().await?;
    Ok(Json(tasks))
}

/// Handler for GET /api/items/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn get_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Task>, ApiError> {
    let task = TaskService::new(&state.store).get_task_by_id(id).await?;
    Ok(Json(task))
}

/// Handler for POST /api/items - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Title missing or body malformed", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(request) = payload?;
    let new_task = NewTask::try_from(request)?;
    let task = TaskService::new(&state.store).create_task(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /api/items/{id} - Overwrites the fields present in the body.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Body malformed", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn update_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(update) = payload?;
    let task = TaskService::new(&state.store).update_task(id, update).await?;
    Ok(Json(task))
}

/// Handler for DELETE /api/items/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(("id" = u32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Data could not be saved", body = ErrorResponse)
    ),
    tag = "Items"
)]
pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<MessageResponse>, ApiError> {
    TaskService::new(&state.store)
        .delete_task(id, state.cascade_comment_deletes)
        .await?;
    Ok(Json(MessageResponse::new("Item deleted successfully")))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/items", get(get_items_handler).post(create_item_handler))
        .route(
            "/api/items/{id}",
            get(get_item_handler)
                .put(update_item_handler)
                .delete(delete_item_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_require_title() {
        let request: CreateTaskRequest =
            serde_json::from_str(r#"{"description": "no title"}"#).unwrap();

        let result = NewTask::try_from(request);

        assert!(matches!(result, Err(ApiError::Validation(message)) if message == "Title is required"));
    }

    #[test]
    fn can_fill_defaults_for_new_task() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();

        let new_task = NewTask::try_from(request).unwrap();

        assert_eq!(new_task, NewTask::new(""));
    }
}
