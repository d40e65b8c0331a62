//! Credential handling for API-backed search providers.

pub mod credentials;

pub use credentials::{BackendCredentials, GoogleCseCredentials, SecretString};
