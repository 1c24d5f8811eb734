// Controller session authentication
//
// `login` exchanges username/password for a session id (CID) that the
// client attaches to every later action; `logout` drops it.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::LoginResponse;

impl ControllerClient {
    /// Authenticate with the controller using username/password.
    ///
    /// `POST /v2/api` with `{"action": "login", ...}`. On success the
    /// returned CID is kept for all subsequent requests.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url()?;
        debug!(username, "logging in at {}", url);

        let body = json!({
            "action": "login",
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {text}"),
            });
        }

        let login: LoginResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        match (login.ok, login.cid) {
            (true, Some(cid)) => {
                self.set_session(Some(SecretString::from(cid)));
                debug!("login successful");
                Ok(())
            }
            (_, _) => Err(Error::Authentication {
                message: login
                    .reason
                    .unwrap_or_else(|| "controller returned no session id".into()),
            }),
        }
    }

    /// End the current session. The local session id is always dropped,
    /// even when the controller call fails.
    pub async fn logout(&self) -> Result<(), Error> {
        let result: Result<serde_json::Value, Error> = self.post("logout", json!({})).await;
        self.set_session(None);
        debug!("logout complete");
        result.map(|_| ())
    }
}
