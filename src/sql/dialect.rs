//! Database product dialects.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Oracle,
    Mysql,
    Postgres,
    Db2,
    SqlServer,
    Sqlite,
    Firebird,
    /// Fallback for backends we cannot identify.
    Standard,
}

impl Dialect {
    /// Dialect for a configured product name (case-insensitive).
    pub fn from_product_name(name: &str) -> Option<Self> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "oracle" => Dialect::Oracle,
            "mysql" | "mariadb" => Dialect::Mysql,
            "postgres" | "postgresql" => Dialect::Postgres,
            "db2" => Dialect::Db2,
            "sqlserver" | "mssql" => Dialect::SqlServer,
            "sqlite" => Dialect::Sqlite,
            "firebird" => Dialect::Firebird,
            _ => return None,
        })
    }

    /// Dialect for the backend name a driver reports for a live connection.
    pub fn detect(backend_name: &str) -> Self {
        let name = backend_name.to_ascii_lowercase();
        if name.contains("postgres") {
            Dialect::Postgres
        } else if name.contains("mysql") || name.contains("mariadb") {
            Dialect::Mysql
        } else if name.contains("sqlite") {
            Dialect::Sqlite
        } else if name.contains("oracle") {
            Dialect::Oracle
        } else if name.contains("db2") {
            Dialect::Db2
        } else if name.contains("sql server") || name.contains("mssql") {
            Dialect::SqlServer
        } else if name.contains("firebird") {
            Dialect::Firebird
        } else {
            Dialect::Standard
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            _ => "?".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Oracle => "oracle",
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Db2 => "db2",
            Dialect::SqlServer => "sqlserver",
            Dialect::Sqlite => "sqlite",
            Dialect::Firebird => "firebird",
            Dialect::Standard => "standard",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
