use crate::config::AppRoleCredentials;
use crate::error::VaultPgError;
use crate::types::vault::{
    AppRoleLoginRequest, AuthResponse, CredentialPair, DatabaseCredentials, LeasedSecret,
};
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Stateless Vault API endpoints.
pub(super) struct VaultEndpoints;

impl VaultEndpoints {
    /// `POST /v1/auth/<mount>/login` with the AppRole identifiers.
    ///
    /// Any failure to obtain a token, whether transport, status or body, is
    /// `NotAuthenticated`; the cause is only logged.
    pub(super) async fn approle_login(
        http_client: &reqwest::Client,
        base_url: &Url,
        mount: &str,
        approle: &AppRoleCredentials,
    ) -> Result<AuthResponse, VaultPgError> {
        let url = api_url(base_url, &["auth", mount, "login"])?;
        let resp = http_client
            .post(url)
            .json(&AppRoleLoginRequest {
                role_id: approle.role_id(),
                secret_id: approle.secret_id(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "AppRole login request failed");
                VaultPgError::NotAuthenticated
            })?;

        if !resp.status().is_success() {
            let cause = VaultPgError::from_vault_response(resp).await;
            warn!(error = %cause, "AppRole login rejected");
            return Err(VaultPgError::NotAuthenticated);
        }

        let body: AuthResponse = resp.json().await.map_err(|e| {
            warn!(error = %e, "AppRole login returned an unreadable body");
            VaultPgError::NotAuthenticated
        })?;
        info!(
            policies = ?body.auth.policies,
            lease_duration = body.auth.lease_duration,
            "AppRole login succeeded"
        );
        Ok(body)
    }

    /// `GET /v1/<mount>/creds/<role>`. `Ok(None)` when Vault has nothing to
    /// return for the role.
    pub(super) async fn generate_credentials(
        http_client: &reqwest::Client,
        base_url: &Url,
        token: &str,
        mount: &str,
        role: &str,
    ) -> Result<Option<DatabaseCredentials>, VaultPgError> {
        let url = api_url(base_url, &[mount, "creds", role])?;
        let resp = http_client
            .get(url.clone())
            .header(VAULT_TOKEN_HEADER, token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
                debug!(role, status = %resp.status(), "no credentials issued");
                Ok(None)
            }
            status if status.is_success() => {
                let secret: LeasedSecret<CredentialPair> = resp.json().await?;
                Ok(Some(secret.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(VaultPgError::PermissionDenied {
                    path: url.path().to_string(),
                })
            }
            _ => Err(VaultPgError::from_vault_response(resp).await),
        }
    }
}

/// Join `v1/<segments..>` onto the base URL, percent-encoding each segment.
pub(super) fn api_url(base_url: &Url, segments: &[&str]) -> Result<Url, VaultPgError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .clear()
        .push("v1")
        .extend(
            segments
                .iter()
                .flat_map(|s| s.split('/'))
                .filter(|s| !s.is_empty()),
        );
    Ok(url)
}
