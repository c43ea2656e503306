//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and `LOCKFIN__*` environment variables
//! (e.g. `LOCKFIN__SERVER__PORT=8080`).
//!
//! See `settings.example.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
    /// Any connection string sea-orm understands.
    Url(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("LOCKFIN").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Address the HTTP server binds to.
    pub fn server_addr(server: &Server) -> String {
        let bind = server.bind.as_deref().unwrap_or("127.0.0.1");
        format!("{bind}:{}", server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn reads_sqlite_database_and_server() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000

            [database]
            sqlite = "./lockfin.db"
            "#,
        );

        assert_eq!(settings.app.level, "debug");
        assert!(matches!(settings.database, Database::Sqlite(ref path) if path == "./lockfin.db"));
        let server = settings.server.unwrap();
        assert_eq!(Settings::server_addr(&server), "127.0.0.1:3000");
    }

    #[test]
    fn level_defaults_to_info() {
        let settings = parse(
            r#"
            database = "memory"
            "#,
        );

        assert_eq!(settings.app.level, "info");
        assert!(matches!(settings.database, Database::Memory));
        assert!(settings.server.is_none());
    }
}
