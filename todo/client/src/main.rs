use todo_client::config::ClientConfig;
use todo_client::{TodoApi, TodoApp};

/// Loads the task list once, then serves the browser front end.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let config = ClientConfig::from_env()?;
    tracing::info!("Loading tasks from {}", config.api_url);

    let mut app = TodoApp::new(TodoApi::new(config.api_url.clone()));
    app.load().await;

    let ui_address = config.ui_address();
    let listener = tokio::net::TcpListener::bind(&ui_address).await?;
    tracing::info!("Task manager running on http://{}", ui_address);
    todo_client::web::serve(listener, app).await
}
