//! CLI configuration: thin wrapper around `aldes_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--username, --api-url, --timeout).

use std::time::Duration;

use aldes_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use aldes_config::{
    Config, Defaults, Profile, config_path, load_config, save_config, store_password,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Human-readable list of profile names for error help.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `HubConfig` from the config file, active profile, and flags.
///
/// Without a matching profile, `--username` (or `ALDES_USERNAME`) plus
/// `ALDES_PASSWORD` are enough to connect.
pub fn resolve_hub_config(global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let ad_hoc;
    let profile = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile
    } else {
        if global.username.is_none() {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        ad_hoc = Profile::default();
        &ad_hoc
    };

    let overridden = Profile {
        username: global.username.clone().or_else(|| profile.username.clone()),
        password: profile.password.clone(),
        api_url: global.api_url.clone().or_else(|| profile.api_url.clone()),
        ca_cert: profile.ca_cert.clone(),
        timeout: global.timeout.or(profile.timeout),
        scan_interval: profile.scan_interval,
    };

    let hub = aldes_config::profile_to_hub_config(&overridden, &profile_name, &cfg.defaults)?;
    tracing::debug!(
        profile = %profile_name,
        api_url = %hub.api_url,
        timeout = ?hub.timeout,
        "resolved hub config"
    );
    Ok(hub)
}

/// Apply a `--interval` override in seconds.
pub fn with_scan_interval(mut config: HubConfig, seconds: Option<u64>) -> HubConfig {
    if let Some(secs) = seconds {
        config.scan_interval = Duration::from_secs(secs.max(1));
    }
    config
}
