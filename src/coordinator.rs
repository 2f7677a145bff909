use std::path::Path;

use crate::archive::ArchiveWriter;
use crate::catalog::{Catalog, CatalogLookup};
use crate::error::{PgSnapError, Result};
use crate::executor::SnapshotExecutor;
use crate::external;
use crate::model::{ConnectionConfig, FullTables, PartialSpec};
use crate::planner::{self, PlannedTarget};

/// Orchestrates a complete dump: schema and sequence extraction (external),
/// then full tables, then partial tables and their relation closures,
/// writing entries to the archive in that order.
pub async fn dump(
    conn: &ConnectionConfig,
    archive_path: &Path,
    full_tables: FullTables,
    partial_spec: PartialSpec,
) -> Result<()> {
    match run(conn, archive_path, &full_tables, &partial_spec).await {
        Ok(()) => Ok(()),
        Err(err) => {
            // Nothing downstream should see a half-written archive.
            let _ = std::fs::remove_file(archive_path);
            Err(err)
        }
    }
}

/// Checks every table named by the caller against what the catalog reports
/// as selectable, so an unknown table is reported as a `Plan` error before
/// any `pg_dump` subprocess or planning work happens.
fn validate_known_tables(
    selectable: &FullTables,
    full_tables: &FullTables,
    partial_spec: &PartialSpec,
) -> Result<()> {
    let unknown = |table: &str| -> Result<()> {
        if crate::model::contains(selectable, table) {
            Ok(())
        } else {
            Err(PgSnapError::Plan {
                table: table.to_string(),
                message: "not found among selectable tables".to_string(),
            })
        }
    };
    for table in full_tables {
        unknown(table)?;
    }
    for (table, _) in partial_spec {
        unknown(table)?;
    }
    Ok(())
}

async fn run(
    conn: &ConnectionConfig,
    archive_path: &Path,
    full_tables: &FullTables,
    partial_spec: &PartialSpec,
) -> Result<()> {
    let mut archive = ArchiveWriter::create(archive_path)?;
    let mut executor = SnapshotExecutor::connect(conn).await?;
    let txn = executor.begin().await?;
    let catalog = Catalog::new(&txn);

    log::info!("dumping schema");
    let selectable = catalog.list_selectable_tables().await?;
    validate_known_tables(&selectable, full_tables, partial_spec)?;
    let schema_sql = external::dump_schema(conn, &selectable).await?;
    archive.write_schema(&schema_sql)?;

    log::info!("dumping sequences");
    let sequences = catalog.list_sequences().await?;
    let sequences_sql = external::dump_sequences(conn, &sequences).await?;
    archive.write_sequences(&sequences_sql)?;

    // A single planner pass over both full tables (traversal-only roots)
    // and partial roots lets relation targets reached from either side
    // coalesce into one archive entry.
    let plan: Vec<PlannedTarget> =
        planner::plan(&catalog, partial_spec, full_tables, full_tables).await?;

    for table in full_tables {
        log::info!("dumping full table {table}");
        let sql = format!("SELECT * FROM {table}");
        let csv = SnapshotExecutor::export_to_csv(&txn, table, &sql).await?;
        archive.write_table_csv(table, &csv)?;
    }

    let root_count = partial_spec.len();
    for target in &plan[..root_count] {
        log::info!("dumping partial table {}", target.table);
        log::debug!("{}: {}", target.table, target.sql);
        let csv = SnapshotExecutor::export_to_csv(&txn, &target.table, &target.sql).await?;
        archive.write_table_csv(&target.table, &csv)?;
    }

    for target in &plan[root_count..] {
        log::info!("dumping relation target {}", target.table);
        log::debug!("{}: {}", target.table, target.sql);
        let csv = SnapshotExecutor::export_to_csv(&txn, &target.table, &target.sql).await?;
        archive.write_table_csv(&target.table, &csv)?;
    }

    txn.commit()
        .await
        .map_err(|source| crate::error::PgSnapError::Transaction { source })?;
    archive.finish()?;
    Ok(())
}
