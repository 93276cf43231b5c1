//! Error types for the bridge.

use serde_json::Value;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CRM error: {0}")]
    Crm(#[from] CrmError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the CRM backend.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Network failure or per-call timeout.
    #[error("CRM transport error: {0}")]
    Transport(String),

    /// The CRM reported an application error in its response envelope.
    #[error("CRM remote error: {0}")]
    Remote(Value),

    /// Authentication returned an empty or falsy identity.
    #[error("CRM authentication returned no uid (check db / user / api key)")]
    Auth,

    /// The response envelope carried neither a result nor an error.
    #[error("Malformed CRM response: {0}")]
    Protocol(String),
}

/// Errors from the messaging provider.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway transport error: {0}")]
    Transport(String),

    #[error("Gateway rejected send (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Errors surfaced to the operator by the outbound relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing required field: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result type alias for the bridge.
pub type Result<T> = std::result::Result<T, Error>;
