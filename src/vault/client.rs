use super::endpoints::VaultEndpoints;
use crate::config::{AppRoleCredentials, VaultSettings};
use crate::error::VaultPgError;
use crate::types::vault::DatabaseCredentials;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::info;
use url::Url;

const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Token obtained from a successful AppRole login.
#[derive(Debug)]
pub struct VaultSession {
    client_token: SecretString,
    pub accessor: Option<String>,
    pub lease_duration: Duration,
    pub policies: Vec<String>,
}

impl VaultSession {
    pub(crate) fn token(&self) -> &str {
        self.client_token.expose_secret()
    }
}

/// Vault API client bound to one server. Every call is a single round trip.
pub struct VaultClient {
    http: reqwest::Client,
    base_url: Url,
    approle_mount: String,
    database_mount: String,
}

impl VaultClient {
    pub fn new(settings: &VaultSettings) -> Result<Self, VaultPgError> {
        let mut headers = HeaderMap::new();
        if let Some(ns) = settings.namespace.as_deref() {
            let value = HeaderValue::from_str(ns)
                .map_err(|_| VaultPgError::InvalidNamespace(ns.to_string()))?;
            headers.insert(VAULT_NAMESPACE_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("vaultpg/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url()?,
            approle_mount: settings.approle_mount.clone(),
            database_mount: settings.database_mount.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Log in with AppRole. Any failed login is `VaultPgError::NotAuthenticated`.
    pub async fn login(&self, approle: &AppRoleCredentials) -> Result<VaultSession, VaultPgError> {
        let resp =
            VaultEndpoints::approle_login(&self.http, &self.base_url, &self.approle_mount, approle)
                .await?;
        let auth = resp.auth;
        Ok(VaultSession {
            client_token: SecretString::from(auth.client_token),
            accessor: auth.accessor,
            lease_duration: Duration::from_secs(auth.lease_duration),
            policies: auth.policies,
        })
    }

    /// Ask the database secrets engine for a fresh credential pair for `role`.
    pub async fn generate_credentials(
        &self,
        session: &VaultSession,
        role: &str,
    ) -> Result<Option<DatabaseCredentials>, VaultPgError> {
        let creds = VaultEndpoints::generate_credentials(
            &self.http,
            &self.base_url,
            session.token(),
            &self.database_mount,
            role,
        )
        .await?;

        if let Some(c) = creds.as_ref() {
            info!(
                role,
                username = %c.username,
                lease_id = %c.lease_id,
                renewable = c.renewable,
                expires_at = ?c.expires_at(Utc::now()),
                "database credentials issued"
            );
        }
        Ok(creds)
    }
}
