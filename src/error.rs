use reqwest::StatusCode;
use serde::Deserialize;
use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum VaultPgError {
    #[error("APPROLE_ROLE_ID and APPROLE_SECRET_ID environment variables must be set")]
    MissingAuthIdentifiers,

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing `{0}` section in configuration file")]
    MissingSection(&'static str),

    #[error("invalid Vault namespace `{0}`")]
    InvalidNamespace(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Unable to authenticate to Vault")]
    NotAuthenticated,

    #[error("Vault denied access to {path}")]
    PermissionDenied { path: String },

    #[error("Vault responded with status {status}: {message}")]
    VaultStatus { status: StatusCode, message: String },

    #[error("Vault returned no credentials for role `{0}`")]
    CredentialsUnavailable(String),

    #[error("database credentials were already merged")]
    CredentialsAlreadyMerged,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("timed out after {0:?} connecting to the database")]
    ConnectTimeout(Duration),
}

impl VaultPgError {
    pub const CONNECTION_FAILURE_CODE: u8 = 5;

    /// Process exit status reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::MissingAuthIdentifiers
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::MissingSection(_)
            | Self::InvalidNamespace(_)
            | Self::UrlParse(_) => 2,
            Self::NotAuthenticated => 3,
            Self::PermissionDenied { .. }
            | Self::CredentialsUnavailable(_)
            | Self::CredentialsAlreadyMerged => 4,
            Self::Database(_) | Self::ConnectTimeout(_) => Self::CONNECTION_FAILURE_CODE,
            Self::Reqwest(_) | Self::VaultStatus { .. } => 1,
        }
    }

    /// Build a status error from a non-success Vault response, keeping the
    /// `errors` array when the body carries one.
    pub(crate) async fn from_vault_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let message = match resp.json::<VaultErrorBody>().await {
            Ok(body) if !body.errors.is_empty() => body.errors.join("; "),
            _ => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };
        Self::VaultStatus { status, message }
    }
}

impl From<figment::Error> for VaultPgError {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

/// Error payload returned by the Vault HTTP API.
#[derive(Debug, Default, Deserialize)]
pub struct VaultErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}
