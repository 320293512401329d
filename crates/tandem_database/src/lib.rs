//! PostgreSQL result store for Tandem.
//!
//! Persists comparison runs and per-provider results with Diesel, using an
//! r2d2 pool and embedded migrations.
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_database::PostgresResultStore;
//! use tandem_interface::ResultStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresResultStore::connect("postgres://localhost/tandem", 5).await?;
//! let run = store.create_run("ping", None).await?;
//! println!("created run {}", run.id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod models;
mod store;

/// Diesel table definitions.
#[allow(missing_docs)]
pub mod schema;

pub use connection::{MIGRATIONS, PgPool, establish_pool, run_migrations};
pub use models::{ComparisonRunRow, ProviderResultRow};
pub use store::PostgresResultStore;
