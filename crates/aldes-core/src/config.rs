// ── Runtime connection configuration ──
//
// Describes *how* to reach the Aldes API and how often to poll. Carries
// credential data but never touches disk: `aldes-config` (or any other
// consumer) builds a `HubConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::coordinator::DEFAULT_SCAN_INTERVAL;

/// Configuration for one Aldes account.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// API root (defaults to the production AldesConnect endpoint).
    pub api_url: Url,
    /// Account e-mail.
    pub username: String,
    pub password: SecretString,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Extra root certificate to trust (corporate proxies).
    pub ca_cert: Option<PathBuf>,
    /// Steady-state polling interval of every product.
    pub scan_interval: Duration,
}

impl HubConfig {
    /// Config for the production API with default tuning.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            api_url: default_api_url(),
            username: username.into(),
            password,
            timeout: Duration::from_secs(30),
            ca_cert: None,
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}

/// The production API root as a parsed URL.
pub fn default_api_url() -> Url {
    Url::parse(aldes_api::DEFAULT_API_URL).expect("default API URL is valid")
}
