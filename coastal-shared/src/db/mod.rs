/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup connectivity check
/// - `migrations`: Embedded schema migrations from the workspace `migrations/` directory
///
/// Row types and their queries live in [`crate::models`].
///
/// # Example
///
/// ```no_run
/// use coastal_shared::db::pool::{create_pool, DatabaseConfig};
/// use coastal_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     })
///     .await?;
///
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
