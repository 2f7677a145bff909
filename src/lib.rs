//! `pgsnap` — the partial-dump engine.
//!
//! Given a set of tables to dump in full and a mapping from table name to a
//! selection SQL statement, computes and dumps the transitive closure of
//! rows referenced through foreign-key relationships (including
//! self-referencing relations) into a single compressed archive, all
//! observing one repeatable-read snapshot of the database.

pub mod archive;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod external;
pub mod model;
pub mod planner;
pub mod resolver;

pub use error::{ArchiveError, PgSnapError, Result};
pub use model::{ConnectionConfig, FullTables, PartialSpec, TableId};

use std::path::Path;

/// Produces a portable archive at `archive_path` capturing a consistent
/// snapshot of the database: schema, sequence state, every row of
/// `full_tables`, and the foreign-key closure of every selection in
/// `partial_spec`.
pub async fn dump(
    conn: &ConnectionConfig,
    archive_path: &Path,
    full_tables: FullTables,
    partial_spec: PartialSpec,
) -> Result<()> {
    coordinator::dump(conn, archive_path, full_tables, partial_spec).await
}
