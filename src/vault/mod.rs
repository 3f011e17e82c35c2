//! Vault client: AppRole login and dynamic database credentials.
//!
//! Layout:
//! - `endpoints.rs`: stateless HTTP calls against the Vault API
//! - `client.rs`: configured HTTP client and the authenticated session

pub mod client;
mod endpoints;

pub use client::{VaultClient, VaultSession};
