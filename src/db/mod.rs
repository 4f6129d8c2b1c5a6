//! Postgres pool setup for the `postgres` backend.
//!
//! Migrations live in `src/db/migrations` and create the `images`, `fonts`
//! and `screens` tables. They run on every start; sqlx skips applied ones.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Connect with at most `max_connections` and apply pending migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!(max_connections, "designer schema ready");

    Ok(pool)
}
