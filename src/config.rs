use crate::types::push::VapidConfig;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 6069;
pub const DEFAULT_SERVER_URL: &str = "http://localhost:6069";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("invalid VAPID private key: {0}")]
    InvalidPrivateKey(String),
    #[error("invalid VAPID public key: {0}")]
    InvalidPublicKey(String),
    #[error("VAPID public key does not match the private key")]
    KeyMismatch,
    #[error("invalid duration '{0}'; expected <number>[s|m|h]")]
    InvalidDuration(String),
    #[error("failed to initialise push client: {0}")]
    PushClient(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub vapid: VapidConfig,
    pub delivery_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub application_server_key: String,
    pub subscribe_timeout: Duration,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            vapid: VapidConfig {
                private_key: "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE".to_string(),
                public_key: "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U".to_string(),
                subject: "mailto:test@test.com".to_string(),
            },
            delivery_timeout: DEFAULT_TIMEOUT,
        }
    }
}
