use crate::config::{AppRoleCredentials, Config};
use crate::db::{self, ConnectionStatus};
use crate::error::VaultPgError;
use crate::types::database::DatabaseConfig;
use crate::vault::VaultClient;
use tracing::{info, warn};

/// Load the database configuration, log in to Vault, fetch credentials for
/// the configured role and attempt one connection.
///
/// The configuration file is read before any network activity.
pub async fn run(
    cfg: &Config,
    approle: &AppRoleCredentials,
) -> Result<ConnectionStatus, VaultPgError> {
    let database = DatabaseConfig::load(&cfg.config_path)?;
    info!(
        path = %cfg.config_path.display(),
        host = %database.host(),
        port = database.port(),
        database = %database.database(),
        secret_role = %database.secret_role(),
        "database configuration loaded"
    );

    let vault = VaultClient::new(&cfg.vault)?;
    let database = acquire_credentials(&vault, approle, database).await?;

    db::attempt_connection(&database, cfg.database.connect_timeout()).await
}

/// Log in and merge freshly generated credentials into `database`.
/// Vault returning nothing for the role is an error.
pub async fn acquire_credentials(
    vault: &VaultClient,
    approle: &AppRoleCredentials,
    database: DatabaseConfig,
) -> Result<DatabaseConfig, VaultPgError> {
    info!(vault = %vault.base_url(), "authenticating to Vault with AppRole");
    let session = vault.login(approle).await?;

    let creds = vault
        .generate_credentials(&session, database.secret_role())
        .await?;
    if creds.is_none() {
        warn!(role = %database.secret_role(), "Vault issued no credentials");
        return Err(VaultPgError::CredentialsUnavailable(
            database.secret_role().to_string(),
        ));
    }
    database.merge_credentials(creds)
}
