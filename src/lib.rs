pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod types;
pub mod vault;

pub use error::VaultPgError;
pub use types::{DatabaseConfig, DatabaseCredentials};
pub use vault::{VaultClient, VaultSession};
