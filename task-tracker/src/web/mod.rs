use askama::Template;
use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::Store;

pub mod api;

/// Shared state handed to every handler.
pub struct AppState {
    pub store: Store,
    /// Whether deleting a task also deletes its comments.
    pub cascade_comment_deletes: bool,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cascade_comment_deletes: false,
        }
    }

    /// Creates the state from the application config, backed by the configured data file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            store: Store::open(&config.data_file),
            cascade_comment_deletes: config.cascade_comment_deletes,
        }
    }
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Failed to render page: {:?}", self);
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

/// JSON response for the health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Creates the full application router: JSON API, pages and health check.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .route("/", axum::routing::get(index_handler))
        .route("/users", axum::routing::get(users_page_handler))
        .route("/task/{id}", axum::routing::get(task_detail_handler))
        .merge(api::create_api_router(state))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config));
    state.store.initialize()?;
    tracing::info!("Data file ready at {}", config.data_file.display());

    let server_address = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[tracing::instrument]
pub async fn index_handler() -> Result<Html<String>, WebError> {
    let template = IndexTemplate::new();
    template.render().map(Html).map_err(WebError::from)
}

#[tracing::instrument]
pub async fn users_page_handler() -> Result<Html<String>, WebError> {
    let template = UsersTemplate::new();
    template.render().map(Html).map_err(WebError::from)
}

#[tracing::instrument]
pub async fn task_detail_handler(Path(task_id): Path<u32>) -> Result<Html<String>, WebError> {
    let template = TaskDetailTemplate::new(task_id);
    template.render().map(Html).map_err(WebError::from)
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

impl IndexTemplate {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Template)]
#[template(path = "users.html")]
struct UsersTemplate;

impl UsersTemplate {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Template)]
#[template(path = "task_detail.html")]
struct TaskDetailTemplate {
    task_id: u32,
}

impl TaskDetailTemplate {
    pub fn new(task_id: u32) -> Self {
        Self { task_id }
    }
}
