use crate::error::VaultPgError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const ENV_PREFIX: &str = "VAULTPG_";
pub const APPROLE_ROLE_ID_ENV: &str = "APPROLE_ROLE_ID";
pub const APPROLE_SECRET_ID_ENV: &str = "APPROLE_SECRET_ID";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: String,
    /// Path of the JSON file holding the `database` section.
    pub config_path: PathBuf,
    pub vault: VaultSettings,
    pub database: DatabaseSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            config_path: PathBuf::from("config.json"),
            vault: VaultSettings::default(),
            database: DatabaseSettings::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `VAULTPG_*` environment variables, nested keys
    /// separated by `__` (e.g. `VAULTPG_VAULT__HOST`).
    pub fn load() -> Result<Self, VaultPgError> {
        Ok(Self::figment().extract()?)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub host: String,
    pub port: u16,
    pub tls_enabled: bool,
    pub approle_mount: String,
    pub database_mount: String,
    pub namespace: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            host: "dynamic-secrets-vault".to_string(),
            port: 8200,
            tls_enabled: false,
            approle_mount: "approle".to_string(),
            database_mount: "database".to_string(),
            namespace: None,
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
        }
    }
}

impl VaultSettings {
    pub fn base_url(&self) -> Result<Url, VaultPgError> {
        let scheme = if self.tls_enabled { "https" } else { "http" };
        Ok(Url::parse(&format!("{scheme}://{}:{}/", self.host, self.port))?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
        }
    }
}

impl DatabaseSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// AppRole identifiers used to log in to Vault.
#[derive(Debug)]
pub struct AppRoleCredentials {
    role_id: String,
    secret_id: SecretString,
}

impl AppRoleCredentials {
    /// Both identifiers are required; blank values count as missing.
    pub fn new(
        role_id: Option<String>,
        secret_id: Option<String>,
    ) -> Result<Self, VaultPgError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(role_id), present(secret_id)) {
            (Some(role_id), Some(secret_id)) => Ok(Self {
                role_id,
                secret_id: SecretString::from(secret_id),
            }),
            _ => Err(VaultPgError::MissingAuthIdentifiers),
        }
    }

    /// Read the identifiers verbatim; they are opaque strings even when
    /// they look like numbers or booleans.
    pub fn from_env() -> Result<Self, VaultPgError> {
        Self::new(
            dotenvy::var(APPROLE_ROLE_ID_ENV).ok(),
            dotenvy::var(APPROLE_SECRET_ID_ENV).ok(),
        )
    }

    pub fn role_id(&self) -> &str {
        &self.role_id
    }

    pub fn secret_id(&self) -> &str {
        self.secret_id.expose_secret()
    }
}
