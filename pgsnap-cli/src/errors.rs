use thiserror::Error;

/// Errors specific to the CLI's own config/argument handling. The core
/// library's `PgSnapError` covers everything past this point.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read config file `{path}`: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid --partial entry `{0}`: expected `table=SQL`")]
    InvalidPartial(String),
    #[error("missing required connection field `{0}` (pass it via flag or --config)")]
    MissingConnectionField(&'static str),
}
