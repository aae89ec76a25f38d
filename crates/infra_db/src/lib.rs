//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the ledger engine using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! return plain row structs, and [`adapters::PostgresLedgerStore`] maps rows
//! to domain types and implements the storage ports of `domain_ledger`.
//!
//! # Amounts
//!
//! Balances and entry amounts are `NUMERIC` columns constrained to scale 0
//! and mapped through `BigDecimal`; see [`numeric`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
//!
//! let config = DatabaseConfig::new("postgres://localhost/ledger");
//! let pool = create_pool(config.clone()).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool, config.lock_timeout);
//! ```

pub mod pool;
pub mod error;
pub mod numeric;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresLedgerStore, PgUnitOfWork};
