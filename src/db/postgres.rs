use crate::error::VaultPgError;
use crate::types::database::DatabaseConfig;
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of the single connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    CouldNotConnect,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("Connected"),
            Self::CouldNotConnect => f.write_str("Could not connect"),
        }
    }
}

/// Options carrying the same host/port/user/password/dbname as
/// `DatabaseConfig::connection_string`.
pub fn connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new_without_pgpass()
        .host(cfg.host())
        .port(cfg.port())
        .username(cfg.username())
        .password(cfg.password())
        .database(cfg.database())
        .application_name(env!("CARGO_PKG_NAME"))
}

/// Open one connection, check it is live, then close it.
pub async fn attempt_connection(
    cfg: &DatabaseConfig,
    timeout: Duration,
) -> Result<ConnectionStatus, VaultPgError> {
    info!(descriptor = %cfg.redacted_connection_string(), "connecting to database");
    let opts = connect_options(cfg);

    let mut conn = tokio::time::timeout(timeout, PgConnection::connect_with(&opts))
        .await
        .map_err(|_| VaultPgError::ConnectTimeout(timeout))??;

    let status = match conn.ping().await {
        Ok(()) => ConnectionStatus::Connected,
        Err(e) => {
            warn!(error = %e, "connection established but not usable");
            ConnectionStatus::CouldNotConnect
        }
    };

    if let Err(e) = conn.close().await {
        debug!(error = %e, "error while closing database connection");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::vault::DatabaseCredentials;
    use secrecy::SecretString;
    use std::collections::HashMap;

    #[test]
    fn status_renders_console_text() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected");
        assert_eq!(
            ConnectionStatus::CouldNotConnect.to_string(),
            "Could not connect"
        );
        assert!(!ConnectionStatus::CouldNotConnect.is_connected());
    }

    #[test]
    fn options_mirror_connection_string() {
        let cfg = DatabaseConfig::from_json_str(
            r#"{"database": {"host": "db.local", "port": 6543, "database": "app", "secret_role": "r"}}"#,
        )
        .unwrap()
        .merge_credentials(Some(DatabaseCredentials {
            username: "v-approle-r".to_string(),
            password: SecretString::from("pw".to_string()),
            lease_id: String::new(),
            lease_duration: Duration::from_secs(60),
            renewable: false,
        }))
        .unwrap();
        let opts = connect_options(&cfg);

        let descriptor = cfg.connection_string();
        let pairs: HashMap<&str, &str> = descriptor
            .split(' ')
            .filter_map(|kv| kv.split_once('='))
            .collect();
        assert_eq!(pairs["host"], opts.get_host());
        assert_eq!(pairs["port"], opts.get_port().to_string());
        assert_eq!(pairs["user"], opts.get_username());
        assert_eq!(Some(pairs["dbname"]), opts.get_database());
        assert_eq!(pairs["password"], cfg.password());
    }

    #[tokio::test]
    async fn unreachable_host_surfaces_database_error() {
        // Port 1 on loopback refuses connections immediately.
        let cfg = DatabaseConfig::from_json_str(
            r#"{"database": {"host": "127.0.0.1", "port": 1, "database": "app", "secret_role": "r"}}"#,
        )
        .unwrap();
        let err = attempt_connection(&cfg, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VaultPgError::Database(_) | VaultPgError::ConnectTimeout(_)
        ));
    }
}
