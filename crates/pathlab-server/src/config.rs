//! Server configuration, populated from environment variables.

use pathlab_auth::AuthConfig;
use pathlab_db::DbConfig;

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds, e.g. `0.0.0.0:3000`.
    pub bind_addr: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build a configuration from `PATHLAB_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("PATHLAB_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(address) = std::env::var("PATHLAB_DB_ADDRESS") {
            config.db.address = address;
        }
        if let Ok(namespace) = std::env::var("PATHLAB_DB_NAMESPACE") {
            config.db.namespace = namespace;
        }
        if let Ok(database) = std::env::var("PATHLAB_DB_DATABASE") {
            config.db.database = database;
        }
        if let Ok(username) = std::env::var("PATHLAB_DB_USERNAME") {
            config.db.username = Some(username);
        }
        if let Ok(password) = std::env::var("PATHLAB_DB_PASSWORD") {
            config.db.password = Some(password);
        }
        if let Ok(pepper) = std::env::var("PATHLAB_AUTH_PEPPER") {
            config.auth.pepper = Some(pepper);
        }
        if let Some(secs) = std::env::var("PATHLAB_SESSION_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.auth.session_lifetime_secs = secs;
        }

        config
    }
}
