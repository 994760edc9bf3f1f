//! One authenticated round trip, normalized to bytes or a `ClientError`.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Sends `body` to `url` with the auth headers attached and returns the raw
/// response bytes when the status is below 300.
pub fn perform_request<T: Transport + ?Sized>(
    transport: &T,
    token: &str,
    method: HttpMethod,
    url: String,
    body: Option<String>,
) -> Result<Vec<u8>> {
    execute(transport, &HttpRequest::new(method, url, token, body))
}

/// Runs an already built request through `transport`.
pub fn execute<T: Transport + ?Sized>(transport: &T, request: &HttpRequest) -> Result<Vec<u8>> {
    match &request.body {
        Some(body) => debug!(
            method = %request.method,
            url = %request.url,
            body = %redact_secrets(body),
            "sending request"
        ),
        None => debug!(method = %request.method, url = %request.url, "sending request"),
    }

    let response = transport.execute(request).map_err(ClientError::Transport)?;
    debug!(status = response.status, body = %response.body_text(), "received response");

    check_status(&response)?;
    Ok(response.body)
}

/// Top-level JSON fields whose values never reach the trace.
const SECRET_FIELDS: &[&str] = &["password"];

/// Body text for tracing, with `SECRET_FIELDS` values masked.
fn redact_secrets(body: &str) -> Cow<'_, str> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut fields)) if SECRET_FIELDS.iter().any(|k| fields.contains_key(*k)) => {
            for key in SECRET_FIELDS {
                if let Some(value) = fields.get_mut(*key) {
                    *value = Value::from("[redacted]");
                }
            }
            Cow::Owned(Value::Object(fields).to_string())
        }
        _ => Cow::Borrowed(body),
    }
}

/// Statuses of 300 and above are failures carrying the body text verbatim.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status >= 300 {
        return Err(ClientError::Api {
            status: response.status,
            body: response.body_text(),
        });
    }
    Ok(())
}

/// Decodes a response body, keeping the bytes on failure.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| ClientError::Decode {
        source,
        body: String::from_utf8_lossy(bytes).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::transport::fake::{CannedTransport, RefusingTransport};
    use crate::types::ServerResponse;

    #[test]
    fn success_returns_bytes_unchanged() {
        let transport = CannedTransport::new(200, r#"{"server":{"id":"s1"}}"#);
        let bytes = perform_request(
            &transport,
            "tok",
            HttpMethod::Get,
            "http://compute/servers/s1".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(bytes, br#"{"server":{"id":"s1"}}"#);

        let sent = transport.last_request();
        assert_eq!(sent.header("X-Auth-Token"), Some("tok"));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn status_299_is_success_and_300_is_failure() {
        let ok = CannedTransport::new(299, "fine");
        assert!(perform_request(&ok, "t", HttpMethod::Get, "u".to_string(), None).is_ok());

        let redirect = CannedTransport::new(300, "moved");
        let err = perform_request(&redirect, "t", HttpMethod::Get, "u".to_string(), None).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 300, ref body } if body == "moved"));
    }

    #[test]
    fn error_body_is_kept_verbatim() {
        let body = "{\"message\": \"Authentication error\", \"type\": \"invalid_auth\"}\n";
        let transport = CannedTransport::new(401, body);
        let err = perform_request(&transport, "bad", HttpMethod::Delete, "u".to_string(), None)
            .unwrap_err();
        match err {
            ClientError::Api { status, body: got } => {
                assert_eq!(status, 401);
                assert_eq!(got, body);
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn transport_failure_is_wrapped() {
        let transport = RefusingTransport::default();
        let err = perform_request(&transport, "t", HttpMethod::Get, "u".to_string(), None)
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn decode_keeps_offending_bytes() {
        let err = decode::<ServerResponse>(b"<html>oops</html>").unwrap_err();
        match err {
            ClientError::Decode { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    #[traced_test]
    fn request_and_response_are_traced() {
        let transport = CannedTransport::new(201, r#"{"ok":true}"#);
        perform_request(
            &transport,
            "secret-token",
            HttpMethod::Post,
            "http://compute/volumes".to_string(),
            Some(r#"{"name":"data"}"#.to_string()),
        )
        .unwrap();

        assert!(logs_contain("POST"));
        assert!(logs_contain("http://compute/volumes"));
        assert!(logs_contain(r#"{"name":"data"}"#));
        assert!(logs_contain("status=201"));
        assert!(!logs_contain("secret-token"));
    }

    #[test]
    #[traced_test]
    fn password_is_masked_in_traces() {
        let transport = CannedTransport::new(201, r#"{"token":{"id":"t1"}}"#);
        let body = r#"{"email":"a@b.com","password":"hunter2-xyz","expires":true}"#;
        perform_request(
            &transport,
            "tok",
            HttpMethod::Post,
            "http://account/tokens".to_string(),
            Some(body.to_string()),
        )
        .unwrap();

        // The wire body is untouched.
        assert_eq!(transport.last_request().body.as_deref(), Some(body));
        assert!(logs_contain("a@b.com"));
        assert!(logs_contain("[redacted]"));
        assert!(!logs_contain("hunter2-xyz"));
    }

    #[test]
    fn bodies_without_secrets_are_traced_as_is() {
        let body = r#"{"name":"box","tags":["docker-machine"]}"#;
        assert!(matches!(redact_secrets(body), Cow::Borrowed(b) if b == body));
        assert!(matches!(redact_secrets("not json"), Cow::Borrowed("not json")));
    }
}
