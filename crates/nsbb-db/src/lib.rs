//! Database layer for the nsbb forum.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the user and post queries the host needs.
//!
//! Plugins ship their own migrations as [`Migration`] lists; the host runs
//! them through [`run_plugin_migrations`] after the core set, and both are
//! tracked in the same `_nsbb_migrations` table.

mod migrations;
mod pool;
pub mod posts;
pub mod users;

pub use migrations::{run_migrations, run_plugin_migrations, Migration, MigrationError};
pub use pool::{open_memory_pool, open_pool, DbPool, PoolError, BUSY_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
pub use posts::{create_post, get_post, PostError};
pub use users::{create_user, get_user, get_user_by_username, UserError};
