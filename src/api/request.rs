use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::envelope::{self, Payload};
use super::session::SessionManager;
use super::{Params, Transport};
use crate::config::Credentials;
use crate::error::{Result, ZentaoError};

pub(crate) const SESSION_PARAM: &str = "zentaosid";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed [`Transport`] speaking the legacy envelope protocol.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    session: SessionManager,
}

impl HttpTransport {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = credentials.url.trim_end_matches('/').to_string();
        Ok(Self {
            session: SessionManager::new(http.clone(), credentials),
            http,
            base_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Run one call, logging in again and retrying once if the server says
    /// the session is gone.
    async fn call(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
        payload: Payload,
    ) -> Result<Value> {
        let sid = self.session.ensure_session().await?;
        match self.dispatch(&method, path, params, &sid, payload).await {
            Err(ZentaoError::SessionExpired) => {
                warn!(path, "session expired, logging in again");
                self.session.invalidate(&sid).await;
                let sid = self.session.ensure_session().await?;
                self.dispatch(&method, path, params, &sid, payload).await
            }
            other => other,
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        params: &Params<'_>,
        sid: &str,
        payload: Payload,
    ) -> Result<Value> {
        debug!(%method, path, "zentao request");
        let request = self
            .http
            .request(method.clone(), format!("{}{path}", self.base_url))
            .query(&[(SESSION_PARAM, sid)]);
        let request = if *method == Method::GET {
            request.query(params)
        } else {
            request.form(params)
        };

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ZentaoError::SessionExpired);
        }
        let body = read_body(response).await?;
        envelope::decode(&body, payload)
    }

    async fn download(&self, url: &str, sid: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .query(&[(SESSION_PARAM, sid)])
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ZentaoError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(unexpected_status(status, body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Params<'_>) -> Result<Value> {
        self.call(Method::GET, path, query, Payload::Required).await
    }

    async fn post(&self, path: &str, form: &Params<'_>) -> Result<Value> {
        self.call(Method::POST, path, form, Payload::Optional).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let sid = self.session.ensure_session().await?;
        match self.download(url, &sid).await {
            Err(ZentaoError::SessionExpired) => {
                self.session.invalidate(&sid).await;
                let sid = self.session.ensure_session().await?;
                self.download(url, &sid).await
            }
            other => other,
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Body of a 2xx response; anything else becomes a network error carrying the
/// status and whatever the server sent.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(unexpected_status(status, Some(body)));
    }
    Ok(body)
}

fn unexpected_status(status: StatusCode, body: Option<String>) -> ZentaoError {
    ZentaoError::Network {
        message: format!("unexpected response status {status}"),
        status: Some(status.as_u16()),
        body,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn envelope(data: Value) -> Value {
        json!({"status": "success", "data": data.to_string()})
    }

    async fn logged_in_server(sids: &[&str]) -> MockServer {
        let server = MockServer::start().await;
        let sids: Vec<String> = sids.iter().map(|s| s.to_string()).collect();
        let calls = Arc::new(AtomicUsize::new(0));
        Mock::given(method("GET"))
            .and(path("/api-getSessionID.json"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let n = calls.fetch_add(1, Ordering::SeqCst).min(sids.len() - 1);
                ResponseTemplate::new(200)
                    .set_body_json(envelope(json!({"sessionID": sids[n]})))
            })
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/user-login.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&server)
            .await;
        server
    }

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(Credentials::new(&server.uri(), "alice", "pw")).unwrap()
    }

    #[tokio::test]
    async fn get_attaches_session_and_unwraps_data() {
        let server = logged_in_server(&["sid-1"]).await;
        Mock::given(method("GET"))
            .and(path("/my-task.json"))
            .and(query_param("zentaosid", "sid-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!({"tasks": {}}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let data = transport(&server).get("/my-task.json", &[]).await.unwrap();
        assert_eq!(data, json!({"tasks": {}}));
    }

    #[tokio::test]
    async fn post_sends_form_and_tolerates_missing_data() {
        let server = logged_in_server(&["sid-1"]).await;
        Mock::given(method("POST"))
            .and(path("/bug-resolve-7.json"))
            .and(query_param("zentaosid", "sid-1"))
            .and(body_string_contains("resolution=fixed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        let form = [("resolution", "fixed".to_string())];
        let out = transport(&server).post("/bug-resolve-7.json", &form).await.unwrap();
        assert_eq!(out["status"], "success");
    }

    #[tokio::test]
    async fn failed_status_is_api_error_with_envelope() {
        let server = logged_in_server(&["sid-1"]).await;
        Mock::given(method("GET"))
            .and(path("/task-view-1.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "failed", "message": "no"})),
            )
            .mount(&server)
            .await;

        match transport(&server).get("/task-view-1.json", &[]).await {
            Err(ZentaoError::Api { envelope }) => assert_eq!(envelope["message"], "no"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_data_is_a_decode_error() {
        let server = logged_in_server(&["sid-1"]).await;
        Mock::given(method("GET"))
            .and(path("/my-bug.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "data": "{broken"})),
            )
            .mount(&server)
            .await;

        let err = transport(&server).get("/my-bug.json", &[]).await.unwrap_err();
        assert!(matches!(err, ZentaoError::Decode { .. }));
    }

    #[tokio::test]
    async fn http_error_keeps_status_and_body() {
        let server = logged_in_server(&["sid-1"]).await;
        Mock::given(method("GET"))
            .and(path("/my-bug.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
            .mount(&server)
            .await;

        match transport(&server).get("/my-bug.json", &[]).await {
            Err(ZentaoError::Network { status, body, .. }) => {
                assert_eq!(status, Some(500));
                assert_eq!(body.as_deref(), Some("Internal server error"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn expired_session_logs_in_again_once() {
        let server = logged_in_server(&["stale", "fresh"]).await;
        Mock::given(method("GET"))
            .and(path("/my-task.json"))
            .and(query_param("zentaosid", "stale"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"result": "fail", "locate": "/zentao/user-login.html"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/my-task.json"))
            .and(query_param("zentaosid", "fresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!({"tasks": []}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server);
        let data = transport.get("/my-task.json", &[]).await.unwrap();
        assert_eq!(data["tasks"], json!([]));
        assert_eq!(transport.session().ensure_session().await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn concurrent_expiries_share_one_login() {
        let server = logged_in_server(&["stale", "fresh"]).await;
        Mock::given(method("GET"))
            .and(path("/my-bug.json"))
            .and(query_param("zentaosid", "stale"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "fail", "locate": "/zentao/user-login.html"}))
                    .set_delay(Duration::from_millis(50)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/my-bug.json"))
            .and(query_param("zentaosid", "fresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(json!({"bugs": []}))),
            )
            .expect(3)
            .mount(&server)
            .await;

        let transport = transport(&server);
        let (a, b, c) = tokio::join!(
            transport.get("/my-bug.json", &[]),
            transport.get("/my-bug.json", &[]),
            transport.get("/my-bug.json", &[])
        );
        for result in [a, b, c] {
            assert_eq!(result.unwrap()["bugs"], json!([]));
        }

        let logins = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|req| req.url.path() == "/user-login.json")
            .count();
        assert_eq!(logins, 2);
    }

    #[tokio::test]
    async fn second_expiry_is_surfaced() {
        let server = logged_in_server(&["a", "b"]).await;
        Mock::given(method("GET"))
            .and(path("/my-task.json"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let err = transport(&server).get("/my-task.json", &[]).await.unwrap_err();
        assert!(matches!(err, ZentaoError::SessionExpired));
    }

    #[tokio::test]
    async fn fetch_bytes_passes_session() {
        let server = logged_in_server(&["sid-9"]).await;
        Mock::given(method("GET"))
            .and(path("/file-read-3.png"))
            .and(query_param("zentaosid", "sid-9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;

        let url = format!("{}/file-read-3.png", server.uri());
        let bytes = transport(&server).fetch_bytes(&url).await.unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
