use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::envelope::{self, Payload};
use super::request::{read_body, SESSION_PARAM};
use crate::config::Credentials;
use crate::error::{Result, ZentaoError};

/// Owns the ZenTao session id.
///
/// The id handed out by `api-getSessionID` becomes the credential once the
/// login form has been posted with it; the login call does not issue a new
/// one. The lock is held while acquiring, so concurrent first callers wait for
/// a single login.
pub struct SessionManager {
    http: reqwest::Client,
    credentials: Credentials,
    token: Mutex<Option<String>>,
}

impl SessionManager {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Cached token, or a fresh one after logging in.
    pub async fn ensure_session(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(sid) = token.as_ref() {
            return Ok(sid.clone());
        }
        let sid = self.acquire().await?;
        *token = Some(sid.clone());
        Ok(sid)
    }

    /// Forget `stale` if it is still the cached token. Callers that raced on
    /// the same expired token only trigger one re-login.
    pub async fn invalidate(&self, stale: &str) {
        let mut token = self.token.lock().await;
        if token.as_deref() == Some(stale) {
            debug!("dropping expired session");
            *token = None;
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_logged_in(&self) -> bool {
        self.token.lock().await.is_some()
    }

    async fn acquire(&self) -> Result<String> {
        let sid = self.request_session_id().await?;
        self.login(&sid).await?;
        info!(user = %self.credentials.username, "logged in to ZenTao");
        Ok(sid)
    }

    async fn request_session_id(&self) -> Result<String> {
        let url = format!("{}/api-getSessionID.json", self.credentials.url);
        let response = self.http.get(&url).send().await?;
        let body = read_body(response).await?;

        let data = envelope::decode(&body, Payload::Required).map_err(|err| match err {
            ZentaoError::Api { envelope } => ZentaoError::AuthFailed {
                message: "could not obtain a session id".into(),
                payload: Some(envelope),
            },
            other => other,
        })?;

        data.get("sessionID")
            .and_then(Value::as_str)
            .filter(|sid| !sid.is_empty())
            .map(String::from)
            .ok_or_else(|| ZentaoError::AuthFailed {
                message: "session id missing from response".into(),
                payload: Some(data.clone()),
            })
    }

    async fn login(&self, sid: &str) -> Result<()> {
        let url = format!("{}/user-login.json", self.credentials.url);
        let referer = format!("{}/my/", self.credentials.url);
        let form = [
            ("account", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("keepLogin[]", "on"),
            ("referer", referer.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .query(&[(SESSION_PARAM, sid)])
            .form(&form)
            .send()
            .await?;
        let body = read_body(response).await?;

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| ZentaoError::decode("login response", e))?;
        if envelope::is_success(&envelope) {
            Ok(())
        } else {
            Err(ZentaoError::AuthFailed {
                message: format!("login rejected for {}", self.credentials.username),
                payload: Some(envelope),
            })
        }
    }
}
