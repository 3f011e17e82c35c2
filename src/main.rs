use mimalloc::MiMalloc;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vaultpg::VaultPgError;
use vaultpg::config::{AppRoleCredentials, Config};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        config_path = %cfg.config_path.display(),
        vault_host = %cfg.vault.host,
        vault_port = cfg.vault.port,
        tls_enabled = cfg.vault.tls_enabled,
        loglevel = %cfg.loglevel
    );

    // Identifiers are checked before anything touches the network.
    let approle = match AppRoleCredentials::from_env() {
        Ok(approle) => approle,
        Err(e) => {
            println!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match vaultpg::service::run(&cfg, &approle).await {
        Ok(status) => {
            println!("{status}");
            if status.is_connected() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(VaultPgError::CONNECTION_FAILURE_CODE)
            }
        }
        Err(e) => {
            println!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
