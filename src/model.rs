/// A table name in the target database. The core assumes validity; the
/// DBMS is the source of truth for uniqueness.
pub type TableId = String;

/// Connection parameters for the target database.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            dbname: String::new(),
            user: String::new(),
            password: None,
            host: "127.0.0.1".to_string(),
            port: 5432,
        }
    }
}

impl ConnectionConfig {
    /// Builds a `tokio_postgres::Config` from the connection parameters.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.dbname(&self.dbname);
        cfg.user(&self.user);
        if let Some(password) = &self.password {
            cfg.password(password);
        }
        cfg.host(&self.host);
        cfg.port(self.port);
        cfg
    }
}

/// Mode under which `Catalog::foreign_keys_of` is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    NonRecursive,
    Recursive,
}

/// A foreign-key edge `(from_table, from_column, to_table, to_column,
/// constraint_name)`. Recursive iff `from_table == to_table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ForeignKeyEdge {
    pub from_table: TableId,
    pub from_column: String,
    pub to_table: TableId,
    pub to_column: String,
    pub constraint_name: String,
}

impl ForeignKeyEdge {
    pub fn is_recursive(&self) -> bool {
        self.from_table == self.to_table
    }

    /// Identity used to coalesce duplicate edges reported by metadata:
    /// `(from_column, to_table, to_column)`.
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.from_column, &self.to_table, &self.to_column)
    }
}

/// An ordered mapping from table identifier to a root selection SQL
/// statement. Caller order is preserved and drives archive entry order for
/// the roots themselves.
pub type PartialSpec = Vec<(TableId, String)>;

/// An unordered set of tables dumped in full.
pub type FullTables = Vec<TableId>;

pub(crate) fn contains(full_tables: &FullTables, table: &str) -> bool {
    full_tables.iter().any(|t| t == table)
}
