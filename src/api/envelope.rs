//! The `{"status": ..., "data": "<json string>"}` wrapper around every
//! legacy response.

use serde::de::Error as _;
use serde_json::Value;

use crate::error::{Result, ZentaoError};

const LOGIN_PAGE: &str = "user-login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// `data` must be present.
    Required,
    /// Mutations may answer with a bare envelope.
    Optional,
}

/// Decode a response body and unwrap its double-encoded `data`.
pub fn decode(body: &str, payload: Payload) -> Result<Value> {
    let envelope: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if body.contains(LOGIN_PAGE) => return Err(ZentaoError::SessionExpired),
        Err(e) => return Err(ZentaoError::decode("response body", e)),
    };

    if !is_success(&envelope) {
        if redirects_to_login(&envelope) {
            return Err(ZentaoError::SessionExpired);
        }
        return Err(ZentaoError::Api { envelope });
    }

    match envelope.get("data") {
        Some(Value::String(raw)) if raw.is_empty() && payload == Payload::Optional => Ok(envelope),
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).map_err(|e| ZentaoError::decode("envelope data", e))
        }
        None | Some(Value::Null) => match payload {
            Payload::Optional => Ok(envelope),
            Payload::Required => Err(ZentaoError::decode(
                "envelope data",
                serde_json::Error::custom("missing `data` field"),
            )),
        },
        Some(structured) => Ok(structured.clone()),
    }
}

pub fn is_success(envelope: &Value) -> bool {
    envelope.get("status").and_then(Value::as_str) == Some("success")
}

/// ZenTao answers requests made with a dead session by pointing at the login
/// page instead of returning data.
fn redirects_to_login(envelope: &Value) -> bool {
    ["locate", "url"].iter().any(|key| {
        envelope
            .get(*key)
            .and_then(Value::as_str)
            .is_some_and(|target| target.contains(LOGIN_PAGE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_double_encoded_data() {
        let body =
            json!({"status": "success", "data": "{\"products\":{\"1\":\"Alpha\"}}"}).to_string();
        let data = decode(&body, Payload::Required).unwrap();
        assert_eq!(data["products"]["1"], "Alpha");
    }

    #[test]
    fn non_success_status_keeps_envelope() {
        let body = json!({"status": "failed", "reason": "denied"}).to_string();
        match decode(&body, Payload::Required) {
            Err(ZentaoError::Api { envelope }) => assert_eq!(envelope["reason"], "denied"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_inner_json_is_a_decode_error() {
        let body = json!({"status": "success", "data": "{not json"}).to_string();
        let err = decode(&body, Payload::Required).unwrap_err();
        assert!(matches!(err, ZentaoError::Decode { .. }));
        assert!(err.to_string().contains("envelope data"));
    }

    #[test]
    fn missing_data_depends_on_payload_mode() {
        let body = json!({"status": "success"}).to_string();
        assert!(matches!(
            decode(&body, Payload::Required),
            Err(ZentaoError::Decode { .. })
        ));
        let envelope = decode(&body, Payload::Optional).unwrap();
        assert_eq!(envelope["status"], "success");
    }

    #[test]
    fn structured_data_is_accepted() {
        let body = json!({"status": "success", "data": {"id": 5}}).to_string();
        assert_eq!(decode(&body, Payload::Required).unwrap()["id"], 5);
    }

    #[test]
    fn login_redirects_mean_expired_session() {
        let body =
            json!({"result": "fail", "locate": "/zentao/user-login-L3plbnRhby8=.html"}).to_string();
        assert!(matches!(
            decode(&body, Payload::Required),
            Err(ZentaoError::SessionExpired)
        ));

        let html = "<html><script>location='/zentao/user-login.html'</script></html>";
        assert!(matches!(
            decode(html, Payload::Required),
            Err(ZentaoError::SessionExpired)
        ));
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        assert!(matches!(
            decode("<html>maintenance</html>", Payload::Required),
            Err(ZentaoError::Decode { .. })
        ));
    }
}
