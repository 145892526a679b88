// Aldes API HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer-token injection and
// a single transparent re-login on HTTP 401. Endpoint methods live in
// `auth.rs` and `products.rs` as inherent impls so this module stays
// focused on transport mechanics.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Username and password kept for re-authentication.
#[derive(Clone)]
pub(crate) struct StoredCredentials {
    pub username: String,
    pub password: SecretString,
}

/// HTTP client for the Aldes cloud API.
///
/// Safe to share behind an `Arc`: the bearer token and stored credentials
/// sit behind interior locks that are never held across an `.await`.
pub struct AldesClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    credentials: RwLock<Option<StoredCredentials>>,
}

impl AldesClient {
    /// Create a client for `base_url` using the given transport settings.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
            credentials: RwLock::new(None),
        }
    }

    /// Convenience constructor taking the base URL as a string.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::with_client(http, base_url))
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a bearer token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token state ──────────────────────────────────────────────────

    pub(crate) fn set_token(&self, token: SecretString) {
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    pub(crate) fn set_credentials(&self, credentials: StoredCredentials) {
        *self.credentials.write().expect("credentials lock poisoned") = Some(credentials);
    }

    fn stored_credentials(&self) -> Option<StoredCredentials> {
        self.credentials
            .read()
            .expect("credentials lock poisoned")
            .clone()
    }

    fn bearer(&self) -> Result<String, Error> {
        self.token
            .read()
            .expect("token lock poisoned")
            .as_ref()
            .map(|t| t.expose_secret().to_owned())
            .ok_or(Error::NotAuthenticated)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Authenticated GET, decoding the JSON body into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .send_authorized(|http| http.get(url.clone()))
            .await?;
        parse_json(resp).await
    }

    /// Authenticated POST with a JSON body; the response body is discarded.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self
            .send_authorized(|http| http.post(url.clone()).json(body))
            .await?;
        trace!(status = %resp.status(), "command accepted");
        Ok(())
    }

    /// Send a request with the bearer token, re-authenticating once on 401.
    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let resp = build(&self.http)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(Error::Transport)?;

        if resp.status() != reqwest::StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }

        let Some(creds) = self.stored_credentials() else {
            return Err(Error::Authentication {
                message: "token rejected and no credentials stored".into(),
            });
        };

        debug!("token rejected, re-authenticating");
        self.authenticate(&creds.username, &creds.password).await?;

        let resp = build(&self.http)
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .map_err(Error::Transport)?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token rejected after re-authentication".into(),
            });
        }
        check_status(resp).await
    }
}

/// Turn a non-success status into `Error::Api`, carrying the body text.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.to_string()
        } else {
            message
        },
    })
}

pub(crate) async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
