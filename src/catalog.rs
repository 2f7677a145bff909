use tokio_postgres::Transaction;

use crate::error::{PgSnapError, Result};
use crate::model::{EdgeMode, ForeignKeyEdge, FullTables, TableId};

/// The catalog reads the Relation Resolver and Query Planner need, kept
/// behind a trait so they can run against a canned foreign-key graph in
/// tests instead of a live connection.
pub trait CatalogLookup {
    async fn list_selectable_tables(&self) -> Result<Vec<TableId>>;

    async fn foreign_keys_of(
        &self,
        table: &str,
        mode: EdgeMode,
        exclude: &FullTables,
    ) -> Result<Vec<ForeignKeyEdge>>;
}

/// Three pure-read operations against the live DBMS connection. All reads
/// happen on the caller's transaction so they observe the dump's single
/// snapshot.
pub struct Catalog<'a> {
    txn: &'a Transaction<'a>,
}

const SELECTABLE_TABLES_SQL: &str = "
SELECT table_name
FROM information_schema.tables
WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
  AND table_schema NOT LIKE 'pg\\_toast%'
ORDER BY table_name
";

const SEQUENCES_SQL: &str = "
SELECT relname FROM pg_class WHERE relkind = 'S' ORDER BY relname
";

const NON_RECURSIVE_RELATIONS_SQL: &str = "
SELECT
    tc.constraint_name, kcu.column_name,
    ccu.table_name AS foreign_table_name,
    ccu.column_name AS foreign_column_name
FROM
    information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
WHERE constraint_type = 'FOREIGN KEY'
  AND tc.table_name != ccu.table_name
  AND tc.table_name = $1
";

const RECURSIVE_RELATIONS_SQL: &str = "
SELECT
    tc.constraint_name, kcu.column_name,
    ccu.table_name AS foreign_table_name,
    ccu.column_name AS foreign_column_name
FROM
    information_schema.table_constraints AS tc
    JOIN information_schema.key_column_usage AS kcu
      ON tc.constraint_name = kcu.constraint_name
    JOIN information_schema.constraint_column_usage AS ccu
      ON ccu.constraint_name = tc.constraint_name
WHERE constraint_type = 'FOREIGN KEY'
  AND tc.table_name = ccu.table_name
  AND tc.table_name = $1
";

impl<'a> Catalog<'a> {
    pub fn new(txn: &'a Transaction<'a>) -> Self {
        Catalog { txn }
    }

    /// Sequence-object names in the user's schemas.
    pub async fn list_sequences(&self) -> Result<Vec<String>> {
        let rows = self
            .txn
            .query(SEQUENCES_SQL, &[])
            .await
            .map_err(|source| PgSnapError::Catalog { source })?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|source| PgSnapError::Catalog { source })
            })
            .collect()
    }
}

impl<'a> CatalogLookup for Catalog<'a> {
    /// Tables visible to the current user's SELECT privilege, excluding
    /// system schemas. Ordering follows the DBMS's own; callers must not
    /// rely on it beyond determinism within one connection.
    async fn list_selectable_tables(&self) -> Result<Vec<TableId>> {
        let rows = self
            .txn
            .query(SELECTABLE_TABLES_SQL, &[])
            .await
            .map_err(|source| PgSnapError::Catalog { source })?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|source| PgSnapError::Catalog { source })
            })
            .collect()
    }

    /// Foreign-key edges outgoing from `table`, filtered by `mode` and with
    /// any edge whose `to_table` is in `exclude` omitted.
    async fn foreign_keys_of(
        &self,
        table: &str,
        mode: EdgeMode,
        exclude: &FullTables,
    ) -> Result<Vec<ForeignKeyEdge>> {
        let sql = match mode {
            EdgeMode::NonRecursive => NON_RECURSIVE_RELATIONS_SQL,
            EdgeMode::Recursive => RECURSIVE_RELATIONS_SQL,
        };
        let rows = self
            .txn
            .query(sql, &[&table])
            .await
            .map_err(|source| PgSnapError::Catalog { source })?;

        let mut edges = Vec::with_capacity(rows.len());
        for row in &rows {
            let constraint_name: String = row
                .try_get(0)
                .map_err(|source| PgSnapError::Catalog { source })?;
            let column_name: String = row
                .try_get(1)
                .map_err(|source| PgSnapError::Catalog { source })?;
            let foreign_table_name: String = row
                .try_get(2)
                .map_err(|source| PgSnapError::Catalog { source })?;
            let foreign_column_name: String = row
                .try_get(3)
                .map_err(|source| PgSnapError::Catalog { source })?;

            if crate::model::contains(exclude, &foreign_table_name) {
                continue;
            }

            edges.push(ForeignKeyEdge {
                from_table: table.to_string(),
                from_column: column_name,
                to_table: foreign_table_name,
                to_column: foreign_column_name,
                constraint_name,
            });
        }
        Ok(edges)
    }
}

/// An in-memory stand-in for `Catalog`, built from a fixed foreign-key
/// graph, so the planner's traversal logic can be exercised without a live
/// connection.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use super::CatalogLookup;
    use crate::error::Result;
    use crate::model::{self, EdgeMode, ForeignKeyEdge, FullTables, TableId};

    #[derive(Default)]
    pub(crate) struct FakeCatalog {
        tables: Vec<TableId>,
        non_recursive: HashMap<TableId, Vec<ForeignKeyEdge>>,
        recursive: HashMap<TableId, Vec<ForeignKeyEdge>>,
    }

    impl FakeCatalog {
        pub(crate) fn new(tables: &[&str]) -> Self {
            FakeCatalog {
                tables: tables.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }

        pub(crate) fn with_edge(mut self, edge: ForeignKeyEdge) -> Self {
            let bucket = if edge.is_recursive() {
                &mut self.recursive
            } else {
                &mut self.non_recursive
            };
            bucket.entry(edge.from_table.clone()).or_default().push(edge);
            self
        }
    }

    impl CatalogLookup for FakeCatalog {
        async fn list_selectable_tables(&self) -> Result<Vec<TableId>> {
            Ok(self.tables.clone())
        }

        async fn foreign_keys_of(
            &self,
            table: &str,
            mode: EdgeMode,
            exclude: &FullTables,
        ) -> Result<Vec<ForeignKeyEdge>> {
            let source = match mode {
                EdgeMode::NonRecursive => &self.non_recursive,
                EdgeMode::Recursive => &self.recursive,
            };
            Ok(source
                .get(table)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|edge| !model::contains(exclude, &edge.to_table))
                .collect())
        }
    }
}
