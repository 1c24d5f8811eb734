// Controller API HTTP client
//
// Wraps `reqwest::Client` with the controller's single action endpoint,
// session-id injection, and envelope unwrapping. Endpoint groups
// (auth, gateways, actions) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, NotReady};
use crate::models::ApiResponse;
use crate::transport::TransportConfig;

const API_PATH: &str = "v2/api";

/// Phrase the controller uses when an addressed object is missing.
const NOT_FOUND_PHRASE: &str = "does not exist";

/// Raw HTTP client for the controller's `/v2/api` endpoint.
///
/// Handles the `{ return, results, reason }` envelope and the session id
/// (`CID`) every call after login must carry. All methods return the
/// unwrapped `results` payload.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    session: RwLock<Option<SecretString>>,
}

impl ControllerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the controller root (e.g. `https://10.0.0.10`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            session: RwLock::new(None),
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn set_session(&self, cid: Option<SecretString>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = cid;
        }
    }

    /// Whether a login has stored a session id.
    pub fn has_session(&self) -> bool {
        self.session.read().is_ok_and(|guard| guard.is_some())
    }

    fn session_id(&self) -> Result<String, Error> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|cid| cid.expose_secret().to_owned()))
            .ok_or_else(|| Error::Authentication {
                message: "not logged in".into(),
            })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/v2/api`
    pub(crate) fn api_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(API_PATH)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a read action as a GET with query parameters.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let cid = self.session_id()?;
        let endpoint = self.api_url()?;
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", action)
            .append_pair("CID", &cid)
            .extend_pairs(params);

        debug!(action, "GET {}", endpoint);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_envelope(action, resp).await
    }

    /// Send a mutating action as a POST with a JSON body.
    ///
    /// `params` must be a JSON object; `action` and `CID` are merged in.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, Error> {
        let mut body = match params {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(Error::Encoding(format!(
                    "{action} parameters must be an object, got {other}"
                )));
            }
        };
        let cid = self.session_id()?;
        body.insert("action".into(), Value::from(action));
        body.insert("CID".into(), Value::from(cid));

        let url = self.api_url()?;
        debug!(action, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_envelope(action, resp).await
    }

    /// Parse the `{ return, results, reason }` envelope, returning `results`
    /// on success and a classified error otherwise.
    async fn parse_envelope<T: DeserializeOwned>(
        action: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("{action} rejected (HTTP {status})"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        let envelope: ApiResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        if !envelope.ok {
            let reason = envelope
                .reason
                .unwrap_or_else(|| format!("HTTP {status}, no reason given"));
            return Err(classify_failure(action, reason));
        }

        serde_json::from_value(envelope.results).map_err(|e| Error::Deserialization {
            message: format!("{action}: {e}"),
            body,
        })
    }
}

/// Turn a controller failure reason into the matching error variant.
pub(crate) fn classify_failure(action: &str, reason: String) -> Error {
    if reason.to_ascii_lowercase().contains(NOT_FOUND_PHRASE) {
        return Error::NotFound { resource: reason };
    }
    let condition = NotReady::classify(&reason);
    Error::Api {
        action: action.to_owned(),
        reason,
        condition,
    }
}
