// OAuth password-grant login.
//
// The token endpoint takes a form-encoded body and answers with a bearer
// token. Credentials are kept so the client can log in again by itself when
// the token is rejected later on.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{AldesClient, StoredCredentials, parse_json};
use crate::error::Error;
use crate::models::TokenResponse;

const TOKEN_PATH: &str = "oauth2/token/";

impl AldesClient {
    /// Obtain a bearer token with username/password.
    pub async fn authenticate(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url(TOKEN_PATH)?;
        debug!("requesting token at {}", url);

        let form = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password.expose_secret()),
        ];

        let resp = self
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("token request failed (HTTP {status}): {body}"),
            });
        }

        let token: TokenResponse = parse_json(resp).await?;
        self.set_token(SecretString::from(token.access_token));
        self.set_credentials(StoredCredentials {
            username: username.to_owned(),
            password: password.clone(),
        });

        debug!(expires_in = ?token.expires_in, "authenticated");
        Ok(())
    }
}
