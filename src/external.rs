use tokio::process::Command;

use crate::error::{PgSnapError, Result};
use crate::model::{ConnectionConfig, TableId};

/// Invokes the DBMS-native schema-dump utility: schema only, no
/// privileges, restricted to the given table inclusion list.
pub async fn dump_schema(conn: &ConnectionConfig, tables: &[TableId]) -> Result<Vec<u8>> {
    let mut args = vec!["-s".to_string(), "-x".to_string()];
    push_table_flags(&mut args, tables);
    run_pg_dump(conn, &args).await
}

/// Invokes the DBMS-native sequence-dump utility: data only, restricted to
/// the given sequence inclusion list.
pub async fn dump_sequences(conn: &ConnectionConfig, sequences: &[String]) -> Result<Vec<u8>> {
    let mut args = vec!["-a".to_string()];
    push_table_flags(&mut args, sequences);
    run_pg_dump(conn, &args).await
}

fn push_table_flags(args: &mut Vec<String>, names: &[String]) {
    for name in names {
        args.push("-t".to_string());
        args.push(name.clone());
    }
}

async fn run_pg_dump(conn: &ConnectionConfig, args: &[String]) -> Result<Vec<u8>> {
    let mut cmd = Command::new("pg_dump");
    cmd.arg("-U")
        .arg(&conn.user)
        .arg("-h")
        .arg(&conn.host)
        .arg("-p")
        .arg(conn.port.to_string())
        .arg("-d")
        .arg(&conn.dbname)
        .args(args);

    // The DBMS password, if supplied, is passed to the child via the
    // well-known libpq environment variable; otherwise it inherits the
    // ambient environment unchanged.
    if let Some(password) = &conn.password {
        cmd.env("PGPASSWORD", password);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| PgSnapError::ExternalTool {
            tool: "pg_dump".to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() || output.stdout.is_empty() {
        return Err(PgSnapError::ExternalTool {
            tool: "pg_dump".to_string(),
            message: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Ok(output.stdout)
}
