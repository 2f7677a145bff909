use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::errors::CliError;

/// Optional TOML config file layering under CLI flags. Absent here
/// entirely if `--config` isn't given.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub connection: ConnectionFile,
    #[serde(default)]
    pub full_tables: Vec<String>,
    #[serde(default)]
    pub partial_spec: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectionFile {
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CliError::ParseConfig {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Parses a standalone `--partial-spec-file` (table = sql map, no
/// `[connection]`/`full_tables` sections) into an ordered list.
pub fn load_partial_spec_file(path: &Path) -> Result<Vec<(String, String)>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.display().to_string(),
        source,
    })?;
    let map: BTreeMap<String, String> =
        toml::from_str(&text).map_err(|source| CliError::ParseConfig {
            path: path.display().to_string(),
            source,
        })?;
    Ok(map.into_iter().collect())
}
