//! Connection pool and migrations.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tandem_error::{StorageError, StorageErrorKind};

/// Pooled PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Build a connection pool for `database_url`.
///
/// Blocks until the pool has established its initial connections.
///
/// # Errors
///
/// Returns a connection error if the database cannot be reached.
pub fn establish_pool(database_url: &str, max_connections: u32) -> Result<PgPool, StorageError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_connections.max(1))
        .build(manager)
        .map_err(|e| StorageError::new(StorageErrorKind::Connection(e.to_string())))
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns a migration error if any migration fails.
pub fn run_migrations(pool: &PgPool) -> Result<(), StorageError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::new(StorageErrorKind::Migration(e.to_string())))?;
    for version in &applied {
        tracing::info!(%version, "Applied migration");
    }
    Ok(())
}
