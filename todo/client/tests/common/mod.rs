use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use todo_server::config::Config;

/// Serves the real application on an ephemeral local port, backed by a fresh
/// in-memory SQLite database, and returns its base URL.
pub async fn spawn_server() -> anyhow::Result<String> {
    // Each in-memory SQLite connection is its own database, so the pool holds exactly one.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let config = Config::default();
        if let Err(err) = todo_server::web::serve(listener, Arc::new(db), &config).await {
            eprintln!("test server stopped: {err}");
        }
    });
    Ok(format!("http://{address}"))
}
