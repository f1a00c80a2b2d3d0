use axum::Json;
use axum::Router;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, Method};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::task::SeaOrmTaskRepository;
use crate::task::api::{ApiDoc, TaskState, create_api_router};

/// Custom error type for building the web application.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// A configured CORS origin is not a valid header value.
    #[error("Invalid CORS origin '{0}'")]
    InvalidOrigin(String),
}

/// Builds the CORS layer allowing the configured browser origins to use the API.
pub fn cors_layer(config: &Config) -> Result<CorsLayer, WebError> {
    let origins = config
        .allowed_origins()
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| WebError::InvalidOrigin(origin.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([LOCATION]))
}

/// Assembles the full application: task API, health probe and OpenAPI document.
pub fn create_app(db: Arc<DatabaseConnection>, config: &Config) -> Result<Router, WebError> {
    let repository = Arc::new(SeaOrmTaskRepository::new(db));
    let task_state = Arc::new(TaskState::new(repository));

    let app = Router::new()
        .merge(create_api_router(task_state))
        .route("/health", axum::routing::get(health_check_handler))
        .route("/api-docs/openapi.json", axum::routing::get(openapi_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)?),
        );
    Ok(app)
}

/// Connects to the database and brings the schema up to date.
#[tracing::instrument(skip(db_url))]
pub async fn connect_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(db)
}

/// Serves the application on an already bound listener until the server stops.
pub async fn serve(
    listener: tokio::net::TcpListener,
    db: Arc<DatabaseConnection>,
    config: &Config,
) -> anyhow::Result<()> {
    let app = create_app(db, config)?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let db = connect_database(&config.db_url).await?;

    let server_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    serve(listener, Arc::new(db), &config).await
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
