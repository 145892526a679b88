// ── Core error types ──
//
// User-facing errors from aldes-core. Consumers never see HTTP status codes
// or JSON parse failures directly; `From<aldes_api::Error>` translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Mode errors ──────────────────────────────────────────────────
    /// The device reported a mode code this crate does not know.
    #[error("Mode {code} is not managed, please report.")]
    UnknownModeCode { code: String },

    #[error("Unknown display mode: {name}")]
    UnknownDisplayMode { name: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot reach the Aldes API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Aldes API request timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aldes_api::Error> for CoreError {
    fn from(err: aldes_api::Error) -> Self {
        match err {
            aldes_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            aldes_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "not authenticated".into(),
            },
            aldes_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            aldes_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aldes_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            aldes_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            aldes_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_message_asks_for_report() {
        let err = CoreError::UnknownModeCode { code: "Q".into() };
        assert_eq!(err.to_string(), "Mode Q is not managed, please report.");
    }

    #[test]
    fn api_errors_keep_status() {
        let err: CoreError = aldes_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }

    #[test]
    fn auth_errors_map_to_authentication_failed() {
        let err: CoreError = aldes_api::Error::NotAuthenticated.into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
