//! Database module: a single connection attempt against PostgreSQL.
//!
//! Layout:
//! - `postgres.rs`: connect options derived from `DatabaseConfig` and the
//!   connect-and-report operation

pub mod postgres;

pub use postgres::{ConnectionStatus, attempt_connection, connect_options};
