use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of `POST /v1/auth/<mount>/login`.
#[derive(Debug, Serialize)]
pub struct AppRoleLoginRequest<'a> {
    pub role_id: &'a str,
    pub secret_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub auth: AuthInfo,
}

#[derive(Debug, Deserialize)]
pub struct AuthInfo {
    pub client_token: String,
    #[serde(default)]
    pub accessor: Option<String>,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub policies: Vec<String>,
}

/// Envelope returned by secret engines that issue leased secrets.
#[derive(Debug, Deserialize)]
pub struct LeasedSecret<T> {
    #[serde(default)]
    pub lease_id: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

/// A generated database username/password pair and its lease.
#[derive(Debug)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: SecretString,
    pub lease_id: String,
    pub lease_duration: Duration,
    pub renewable: bool,
}

impl From<LeasedSecret<CredentialPair>> for DatabaseCredentials {
    fn from(secret: LeasedSecret<CredentialPair>) -> Self {
        Self {
            username: secret.data.username,
            password: SecretString::from(secret.data.password),
            lease_id: secret.lease_id,
            lease_duration: Duration::from_secs(secret.lease_duration),
            renewable: secret.renewable,
        }
    }
}

impl DatabaseCredentials {
    /// Server-side expiry assuming the lease started at `issued_at`.
    /// `None` when Vault reported no lease duration.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.lease_duration.is_zero() {
            return None;
        }
        let ttl = TimeDelta::from_std(self.lease_duration).ok()?;
        issued_at.checked_add_signed(ttl)
    }
}
