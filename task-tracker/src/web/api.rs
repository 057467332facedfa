use std::sync::Arc;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::comment::{self, Comment};
use crate::store::StoreError;
use crate::task::{self, Task, TaskUpdate};
use crate::user::{self, User};
use crate::web::AppState;

/// JSON response for API errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// JSON response confirming a completed operation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error type returned by the JSON API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field is missing or a value is not acceptable.
    #[error("{0}")]
    Validation(String),
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request body is not JSON of the expected shape.
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),
    /// The data file could not be written.
    #[error("Failed to save data")]
    Storage(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::MalformedBody(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            ApiError::Storage(err) => {
                tracing::error!("Failed to save data: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to save data".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        task::api::get_items_handler,
        task::api::get_item_handler,
        task::api::create_item_handler,
        task::api::update_item_handler,
        task::api::delete_item_handler,
        user::api::get_users_handler,
        user::api::create_user_handler,
        user::api::delete_user_handler,
        comment::api::get_comments_handler,
        comment::api::create_comment_handler,
        comment::api::delete_comment_handler,
    ),
    components(schemas(
        Task,
        TaskUpdate,
        User,
        Comment,
        task::api::CreateTaskRequest,
        user::api::CreateUserRequest,
        comment::api::CreateCommentRequest,
        ErrorResponse,
        MessageResponse,
    )),
    tags(
        (name = "Items", description = "Task management"),
        (name = "Users", description = "User management"),
        (name = "Comments", description = "Task comments"),
    )
)]
pub struct ApiDoc;

/// Handler for GET /api-docs/openapi.json - Returns the OpenAPI document.
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(task::api::create_api_router(state.clone()))
        .merge(user::api::create_api_router(state.clone()))
        .merge(comment::api::create_api_router(state))
        .route("/api-docs/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn into_parts(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn can_map_validation_error_to_bad_request() {
        let (status, body) = into_parts(ApiError::Validation("Title is required".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "Title is required"}));
    }

    #[tokio::test]
    async fn can_map_not_found_error() {
        let (status, body) = into_parts(ApiError::NotFound("User not found".into())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"error": "User not found"}));
    }

    #[tokio::test]
    async fn can_hide_storage_details_behind_generic_message() {
        let error = ApiError::Storage(StoreError::Write {
            path: PathBuf::from("/var/lib/tracker/data.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        });

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Failed to save data"}));
    }

    #[test]
    fn can_document_every_endpoint() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/items",
            "/api/items/{id}",
            "/api/users",
            "/api/users/{id}",
            "/api/tasks/{id}/comments",
            "/api/comments/{id}",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }
}
