use futures_util::{pin_mut, StreamExt};
use tokio_postgres::{Client, NoTls, Transaction};

use crate::error::{PgSnapError, Result};
use crate::model::ConnectionConfig;

/// Opens a single repeatable-read transaction and streams planned
/// selections to CSV via the DBMS-native bulk-copy path. All metadata
/// reads, schema/sequence dumps, and data extractions for one `dump` call
/// share this connection, so they all observe the same snapshot.
pub struct SnapshotExecutor {
    client: Client,
}

impl SnapshotExecutor {
    pub async fn connect(conn: &ConnectionConfig) -> Result<Self> {
        let (client, connection) = conn
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|source| PgSnapError::Transaction { source })?;

        // The connection object performs the actual IO; run it on its own
        // task so query methods on `client` can be awaited independently.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgres connection error: {e}");
            }
        });

        Ok(SnapshotExecutor { client })
    }

    /// Begins the snapshot's single repeatable-read transaction.
    pub async fn begin(&mut self) -> Result<Transaction<'_>> {
        self.client
            .build_transaction()
            .isolation_level(tokio_postgres::IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .await
            .map_err(|source| PgSnapError::Transaction { source })
    }

    /// Streams `COPY (sql) TO STDOUT WITH CSV HEADER` into an owned byte
    /// buffer. Buffering fully is fine for moderate row counts;
    /// larger-than-memory streaming directly into the archive is left to a
    /// future revision.
    pub async fn export_to_csv(txn: &Transaction<'_>, table: &str, sql: &str) -> Result<Vec<u8>> {
        let copy_sql = format!("COPY ({sql}) TO STDOUT WITH CSV HEADER");
        let stream = txn
            .copy_out(&copy_sql)
            .await
            .map_err(|source| PgSnapError::Execution {
                table: table.to_string(),
                source,
            })?;
        pin_mut!(stream);

        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| PgSnapError::Execution {
                table: table.to_string(),
                source,
            })?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}
