// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode
//!
//! Passwords, OTPs and session tokens are masked before anything is logged.

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

const SECRET_KEYS: [&str; 3] = ["password", "otp", "token"];
const REDACTED: &str = "***";

/// Replace the values of secret keys anywhere in a JSON document
pub fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.to_lowercase().as_str()) {
                    *entry = Value::String(REDACTED.to_string());
                } else {
                    redact_secrets(entry);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

/// Body text safe to log; non-JSON bodies are summarised by size only
fn loggable_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact_secrets(&mut json);
            Some(serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
        }
        Err(_) => Some(format!("<{} bytes, not JSON>", bytes.len())),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(request_body) = loggable_body(&bytes) {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            request_body = %request_body,
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(response_body) = loggable_body(&bytes) {
        debug!(
            status = %parts.status,
            response_body = %response_body,
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_nested_secrets() {
        let mut body = json!({
            "email": "a@charusat.edu.in",
            "password": "pw1",
            "OTP": 4821,
            "nested": [{ "token": "eyJ..." }]
        });
        redact_secrets(&mut body);

        assert_eq!(body["email"], "a@charusat.edu.in");
        assert_eq!(body["password"], "***");
        assert_eq!(body["OTP"], "***");
        assert_eq!(body["nested"][0]["token"], "***");
    }

    #[test]
    fn test_loggable_body() {
        assert!(loggable_body(b"").is_none());
        assert_eq!(loggable_body(b"not json").unwrap(), "<8 bytes, not JSON>");
        assert!(!loggable_body(br#"{"password":"pw1"}"#).unwrap().contains("pw1"));
    }
}
