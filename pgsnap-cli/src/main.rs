mod config;
mod errors;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use errors::CliError;
use pgsnap::{ConnectionConfig, FullTables, PartialSpec};

/// pgsnap — partial Postgres dump tool.
#[derive(Parser)]
#[command(name = "pgsnap", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump schema, sequences, full tables, and the foreign-key closure of
    /// each partial selection into a compressed archive.
    Dump(DumpArgs),
}

#[derive(Parser)]
struct DumpArgs {
    /// Optional TOML config providing connection/full_tables/partial_spec;
    /// CLI flags below override values found here.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database name.
    #[arg(long)]
    dbname: Option<String>,

    /// Database user.
    #[arg(long)]
    user: Option<String>,

    /// Database password (prefer PGPASSWORD or --config over this flag).
    #[arg(long)]
    password: Option<String>,

    /// Database host.
    #[arg(long)]
    host: Option<String>,

    /// Database port.
    #[arg(long)]
    port: Option<u16>,

    /// A table to dump in full. May repeat.
    #[arg(long = "full-table")]
    full_table: Vec<String>,

    /// A `table=SQL` partial selection. May repeat.
    #[arg(long = "partial")]
    partial: Vec<String>,

    /// TOML file mapping table name to selection SQL, merged with
    /// `--partial` (CLI entries win on key collision).
    #[arg(long)]
    partial_spec_file: Option<PathBuf>,

    /// Output archive path.
    #[arg(long, short = 'o')]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Dump(args) => run_dump(args).await,
    }
}

async fn run_dump(args: DumpArgs) -> anyhow::Result<()> {
    let file_config = match &args.config {
        Some(path) => config::FileConfig::load(path)?,
        None => config::FileConfig::default(),
    };

    let conn = build_connection_config(&args, &file_config)?;
    let full_tables = build_full_tables(&args, &file_config);
    let partial_spec = build_partial_spec(&args, &file_config)?;

    log::info!(
        "starting dump of `{}` -> {}",
        conn.dbname,
        args.output.display()
    );
    pgsnap::dump(&conn, &args.output, full_tables, partial_spec).await?;
    log::info!("dump complete: {}", args.output.display());
    Ok(())
}

fn build_connection_config(
    args: &DumpArgs,
    file: &config::FileConfig,
) -> Result<ConnectionConfig, CliError> {
    let dbname = args
        .dbname
        .clone()
        .or_else(|| file.connection.dbname.clone())
        .or_else(|| std::env::var("PGDATABASE").ok())
        .ok_or(CliError::MissingConnectionField("dbname"))?;
    let user = args
        .user
        .clone()
        .or_else(|| file.connection.user.clone())
        .or_else(|| std::env::var("PGUSER").ok())
        .ok_or(CliError::MissingConnectionField("user"))?;
    let password = args
        .password
        .clone()
        .or_else(|| file.connection.password.clone())
        .or_else(|| std::env::var("PGPASSWORD").ok());
    let host = args
        .host
        .clone()
        .or_else(|| file.connection.host.clone())
        .or_else(|| std::env::var("PGHOST").ok())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args
        .port
        .or(file.connection.port)
        .or_else(|| std::env::var("PGPORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(5432);

    Ok(ConnectionConfig {
        dbname,
        user,
        password,
        host,
        port,
    })
}

fn build_full_tables(args: &DumpArgs, file: &config::FileConfig) -> FullTables {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for table in file.full_tables.iter().chain(args.full_table.iter()) {
        if seen.insert(table.clone()) {
            out.push(table.clone());
        }
    }
    out
}

fn build_partial_spec(args: &DumpArgs, file: &config::FileConfig) -> Result<PartialSpec, CliError> {
    let mut spec: Vec<(String, String)> = file
        .partial_spec
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(path) = &args.partial_spec_file {
        for (table, sql) in config::load_partial_spec_file(path)? {
            upsert(&mut spec, table, sql);
        }
    }

    for entry in &args.partial {
        let (table, sql) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidPartial(entry.clone()))?;
        upsert(&mut spec, table.to_string(), sql.to_string());
    }

    Ok(spec)
}

fn upsert(spec: &mut Vec<(String, String)>, table: String, sql: String) {
    if let Some(entry) = spec.iter_mut().find(|(t, _)| *t == table) {
        entry.1 = sql;
    } else {
        spec.push((table, sql));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args(output: &str) -> DumpArgs {
        DumpArgs {
            config: None,
            dbname: None,
            user: None,
            password: None,
            host: None,
            port: None,
            full_table: Vec::new(),
            partial: Vec::new(),
            partial_spec_file: None,
            output: PathBuf::from(output),
        }
    }

    #[test]
    fn full_tables_dedupes_preserving_first_occurrence() {
        let mut file = config::FileConfig::default();
        file.full_tables = vec!["groups".to_string(), "employees".to_string()];
        let mut args = empty_args("out.zip");
        args.full_table = vec!["employees".to_string(), "tickets".to_string()];

        let tables = build_full_tables(&args, &file);
        assert_eq!(tables, vec!["groups", "employees", "tickets"]);
    }

    #[test]
    fn partial_flag_overrides_file_entry_for_same_table() {
        let mut file = config::FileConfig::default();
        file.partial_spec.insert(
            "employees".to_string(),
            "SELECT * FROM employees WHERE id = 1".to_string(),
        );
        let mut args = empty_args("out.zip");
        args.partial = vec!["employees=SELECT * FROM employees WHERE id = 2".to_string()];

        let spec = build_partial_spec(&args, &file).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0].0, "employees");
        assert_eq!(spec[0].1, "SELECT * FROM employees WHERE id = 2");
    }

    #[test]
    fn invalid_partial_flag_is_rejected() {
        let file = config::FileConfig::default();
        let mut args = empty_args("out.zip");
        args.partial = vec!["no-equals-sign".to_string()];

        let err = build_partial_spec(&args, &file).unwrap_err();
        assert!(matches!(err, CliError::InvalidPartial(_)));
    }

    #[test]
    fn connection_uses_file_values_and_explicit_host_port() {
        let mut file = config::FileConfig::default();
        file.connection.dbname = Some("acme".to_string());
        file.connection.user = Some("acme_user".to_string());
        file.connection.host = Some("db.internal".to_string());
        file.connection.port = Some(6543);
        let args = empty_args("out.zip");

        let conn = build_connection_config(&args, &file).unwrap();
        assert_eq!(conn.dbname, "acme");
        assert_eq!(conn.user, "acme_user");
        assert_eq!(conn.host, "db.internal");
        assert_eq!(conn.port, 6543);
    }

    #[test]
    fn missing_dbname_is_reported() {
        let file = config::FileConfig::default();
        let args = empty_args("out.zip");
        std::env::remove_var("PGDATABASE");
        let err = build_connection_config(&args, &file).unwrap_err();
        assert!(matches!(err, CliError::MissingConnectionField("dbname")));
    }
}
