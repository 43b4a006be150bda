//! Interpretation of repository responses
//!
//! Uploads succeed only with `201 Created`, downloads only with `200 OK`.
//! Anything else becomes [`RepoError::Server`], using the server's
//! `{"error": "..."}` body when it has one.

use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::error::{RepoError, Result};

const ERROR_KEY: &str = "error";

/// Message from a `{"error": "..."}` body
///
/// The key is matched case-insensitively, an exact `error` key winning.
fn envelope_message(body: &[u8]) -> Option<String> {
    let fields = serde_json::from_slice::<Map<String, Value>>(body).ok()?;
    let value = fields.get(ERROR_KEY).or_else(|| {
        fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(ERROR_KEY))
            .map(|(_, value)| value)
    })?;
    match value {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        _ => None,
    }
}

/// Build the error for a failed response from its status and raw body
pub fn server_error(status: u16, body: &[u8]) -> RepoError {
    let message = match envelope_message(body) {
        Some(message) => message,
        None => format!(
            "could not properly parse response JSON: {}",
            String::from_utf8_lossy(body)
        ),
    };
    RepoError::Server { status, message }
}

/// Check an upload status and body
pub fn interpret_upload(status: u16, body: &[u8]) -> Result<()> {
    if status == StatusCode::CREATED.as_u16() {
        Ok(())
    } else {
        Err(server_error(status, body))
    }
}

/// Check a download status, handing back the body on success
pub fn interpret_download(status: u16, body: Vec<u8>) -> Result<Vec<u8>> {
    if status == StatusCode::OK.as_u16() {
        Ok(body)
    } else {
        Err(server_error(status, &body))
    }
}

/// Consume an upload response
pub async fn handle_upload_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status == StatusCode::CREATED {
        return Ok(());
    }
    let body = response.bytes().await?;
    interpret_upload(status.as_u16(), &body)
}

/// Consume a download response, returning the file contents
pub async fn handle_download_response(response: reqwest::Response) -> Result<Vec<u8>> {
    let status = response.status();
    let body = response.bytes().await?;
    interpret_download(status.as_u16(), body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_upload_created() {
        assert!(interpret_upload(201, b"{}").is_ok());
    }

    #[test]
    fn test_upload_ok_is_not_success() {
        let err = interpret_upload(200, br#"{"saved":true}"#).unwrap_err();
        assert!(matches!(err, RepoError::Server { status: 200, .. }));
    }

    #[test]
    fn test_upload_error_envelope() {
        let err = interpret_upload(400, br#"{"error":"version already exists"}"#).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"400: version already exists");
    }

    #[test]
    fn test_download_ok_body_verbatim() {
        assert_eq!(interpret_download(200, b"abc".to_vec()).unwrap(), b"abc");
    }

    #[test]
    fn test_download_unparseable_body() {
        let err = interpret_download(404, b"oops".to_vec()).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"404: could not properly parse response JSON: oops");
    }

    #[test]
    fn test_empty_error_message_falls_back() {
        let err = server_error(500, br#"{"error":""}"#);
        assert_eq!(
            err.to_string(),
            r#"500: could not properly parse response JSON: {"error":""}"#
        );
    }

    #[test]
    fn test_non_string_error_falls_back() {
        let err = server_error(502, br#"{"error":42}"#);
        assert_eq!(
            err.to_string(),
            r#"502: could not properly parse response JSON: {"error":42}"#
        );
    }

    #[test]
    fn test_error_key_any_case() {
        let err = server_error(400, br#"{"Error":"version already exists"}"#);
        insta::assert_snapshot!(err.to_string(), @"400: version already exists");

        let err = server_error(400, br#"{"ERROR":"denied","error":"exact"}"#);
        assert_eq!(err.to_string(), "400: exact");
    }

    #[test]
    fn test_non_object_body_falls_back() {
        let err = server_error(500, b"[1,2]");
        assert_eq!(
            err.to_string(),
            "500: could not properly parse response JSON: [1,2]"
        );
    }

    #[tokio::test]
    async fn test_handle_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(409).set_body_string(r#"{"error":"file already exists"}"#),
            )
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = handle_upload_response(response).await.unwrap_err();
        assert_eq!(err.to_string(), "409: file already exists");

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = handle_download_response(response).await.unwrap_err();
        assert_eq!(err.to_string(), "409: file already exists");
    }
}
