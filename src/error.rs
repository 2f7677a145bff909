use thiserror::Error;

/// Errors surfaced by the core partial-dump engine.
///
/// Each variant carries the offending table name, plus the underlying
/// error verbatim, so the CLI can report exactly what failed and where.
#[derive(Debug, Error)]
pub enum PgSnapError {
    #[error("catalog query failed: {source}")]
    Catalog {
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("plan error for table `{table}`: {message}")]
    Plan { table: String, message: String },

    #[error("execution of selection for `{table}` failed: {source}")]
    Execution {
        table: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("snapshot transaction could not be established or was lost: {source}")]
    Transaction {
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("external tool `{tool}` failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("archive write failed: {source}")]
    Archive {
        #[source]
        source: ArchiveError,
    },
}

impl From<ArchiveError> for PgSnapError {
    fn from(source: ArchiveError) -> Self {
        PgSnapError::Archive { source }
    }
}

/// Errors specific to the archive writer.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("duplicate archive path: {0}")]
    DuplicatePath(String),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PgSnapError>;
