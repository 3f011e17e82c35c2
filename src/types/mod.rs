pub mod database;
pub mod vault;

pub use database::DatabaseConfig;
pub use vault::DatabaseCredentials;
