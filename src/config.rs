//! Environment-driven configuration.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Process configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Shared token for the provider's webhook subscription handshake.
    pub verify_token: String,
    /// CRM base URL (e.g. `https://company.odoo.com`).
    pub odoo_url: String,
    /// CRM database name.
    pub odoo_db: String,
    /// Integration user login.
    pub odoo_user: String,
    /// API key for the integration user.
    pub odoo_api_key: SecretString,
    /// Sales team assigned to every deal this bridge touches.
    pub team_id: i64,
    /// WhatsApp Cloud API phone number id (the sending number).
    pub wa_phone_number_id: String,
    /// WhatsApp Cloud API access token.
    pub wa_access_token: SecretString,
    /// Shared secret for the operator send endpoint.
    pub send_secret: String,
}

impl Config {
    /// Load from the environment. Fails fast on any missing required value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("not a valid port number: {raw}"),
            })?,
            Err(_) => 10000,
        };

        let team_id_raw = require("ODOO_TEAM_ID")?;
        let team_id = team_id_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "ODOO_TEAM_ID".to_string(),
            message: format!("not a numeric team id: {team_id_raw}"),
        })?;

        Ok(Self {
            port,
            verify_token: require("META_VERIFY_TOKEN")?,
            odoo_url: require("ODOO_URL")?,
            odoo_db: require("ODOO_DB")?,
            odoo_user: require("ODOO_USER")?,
            odoo_api_key: SecretString::from(require("ODOO_API_KEY")?),
            team_id,
            wa_phone_number_id: require("META_WA_PHONE_NUMBER_ID")?,
            wa_access_token: SecretString::from(require("META_WA_ACCESS_TOKEN")?),
            send_secret: require("SEND_SECRET")?,
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
