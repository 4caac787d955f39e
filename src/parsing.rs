//! Response parsing.
//!
//! Turns a [`RawResponse`] plus the descriptor's [`ResponseShape`] into a
//! typed value, or into the [`ApiError`] the payload encodes.

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, RateLimit, RemoteErrorDetail, TransportError};
use crate::request::ResponseShape;
use crate::transport::RawResponse;

/// Twitter error codes that turn a 403 into a credentials failure.
const AUTH_ERROR_CODES: [i64; 4] = [32, 89, 99, 220];

/// Sanitizes text for safe logging by truncating and escaping control characters.
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    match sanitized.char_indices().nth(max_len) {
        Some((cut, _)) => format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..cut],
            text.len()
        ),
        None => sanitized,
    }
}

/// Decodes a response according to `shape`.
pub(crate) fn parse_response<T: DeserializeOwned>(
    raw: &RawResponse,
    shape: &ResponseShape,
) -> Result<T, ApiError> {
    if !raw.is_success() {
        return Err(classify_failure(raw));
    }

    let value = match shape {
        ResponseShape::NoContent => Value::Null,
        ResponseShape::Raw => Value::String(String::from_utf8_lossy(&raw.body).into_owned()),
        ResponseShape::Single | ResponseShape::List => {
            let value = parse_json(raw)?;
            reject_error_payload(raw, &value)?;
            value
        }
        ResponseShape::CursoredPage { items_key } => {
            let value = parse_json(raw)?;
            reject_error_payload(raw, &value)?;
            normalize_page(value, items_key)?
        }
    };

    serde_json::from_value(value).map_err(|e| {
        debug!(
            "Response did not match expected shape {:?}: {}",
            shape,
            sanitize_for_logging(&String::from_utf8_lossy(&raw.body), 200)
        );
        ApiError::from(e)
    })
}

fn parse_json(raw: &RawResponse) -> Result<Value, ApiError> {
    Ok(serde_json::from_slice(&raw.body)?)
}

/// A 2xx body that only carries an `errors` array is still a failure.
fn reject_error_payload(raw: &RawResponse, value: &Value) -> Result<(), ApiError> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    if object.len() == 1 && object.contains_key("errors") {
        let errors = error_details(value);
        if !errors.is_empty() {
            error!("Error payload in {} response: {:?}", raw.status, errors);
            return Err(remote_or_auth(raw, errors));
        }
    }
    Ok(())
}

/// Moves the collection under `items_key` to `items` so that every cursored
/// endpoint decodes into the same page type.
fn normalize_page(value: Value, items_key: &str) -> Result<Value, ApiError> {
    let Value::Object(mut object) = value else {
        return Err(TransportError::Protocol("cursored response is not an object".into()).into());
    };

    let items = match object.remove(items_key) {
        Some(items @ Value::Array(_)) => items,
        Some(_) => {
            return Err(TransportError::Protocol(format!(
                "cursored response field '{}' is not an array",
                items_key
            ))
            .into())
        }
        None => {
            return Err(TransportError::Protocol(format!(
                "cursored response has no '{}' field",
                items_key
            ))
            .into())
        }
    };
    let next = object.remove("next_cursor").ok_or_else(|| {
        ApiError::from(TransportError::Protocol(
            "cursored response has no next_cursor".into(),
        ))
    })?;

    let mut page = Map::new();
    page.insert("items".into(), items);
    page.insert("next_cursor".into(), next);
    if let Some(previous) = object.remove("previous_cursor") {
        page.insert("previous_cursor".into(), previous);
    }
    Ok(Value::Object(page))
}

/// Maps a non-2xx response onto the error taxonomy.
pub(crate) fn classify_failure(raw: &RawResponse) -> ApiError {
    let body = String::from_utf8_lossy(&raw.body);
    let errors = serde_json::from_slice::<Value>(&raw.body)
        .map(|value| error_details(&value))
        .unwrap_or_default();

    debug!(
        "Error response ({}): {}",
        raw.status,
        sanitize_for_logging(&body, 200)
    );

    let errors = if errors.is_empty() {
        vec![RemoteErrorDetail {
            code: None,
            message: if body.trim().is_empty() {
                format!("HTTP {}", raw.status)
            } else {
                sanitize_for_logging(&body, 200)
            },
        }]
    } else {
        errors
    };

    remote_or_auth(raw, errors)
}

/// 401 is always an auth failure; 403 only when it carries an auth code.
fn remote_or_auth(raw: &RawResponse, errors: Vec<RemoteErrorDetail>) -> ApiError {
    let auth_code = errors
        .iter()
        .any(|e| e.code.is_some_and(|code| AUTH_ERROR_CODES.contains(&code)));

    if raw.status == 401 || (raw.status == 403 && auth_code) {
        warn!("Credentials rejected with status {}", raw.status);
        let message = errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "unauthorized".to_string());
        return ApiError::Auth {
            status: raw.status,
            message,
        };
    }

    let rate_limit = match (
        raw.header("x-rate-limit-limit"),
        raw.header("x-rate-limit-remaining"),
        raw.header("x-rate-limit-reset"),
    ) {
        (Some(limit), Some(remaining), Some(reset)) => {
            RateLimit::from_headers(limit, remaining, reset)
        }
        _ => None,
    };
    if raw.status == 429 {
        warn!("Rate limited, window resets at {:?}", rate_limit.map(|r| r.reset));
    }

    ApiError::RemoteApi {
        status: raw.status,
        errors,
        rate_limit,
    }
}

/// Extracts `{"errors":[...]}` entries, or a bare `{"error":"..."}` message.
fn error_details(value: &Value) -> Vec<RemoteErrorDetail> {
    if let Some(errors) = value.get("errors").and_then(|e| e.as_array()) {
        return errors
            .iter()
            .filter_map(|e| serde_json::from_value::<RemoteErrorDetail>(e.clone()).ok())
            .collect();
    }
    if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
        return vec![RemoteErrorDetail {
            code: None,
            message: message.to_string(),
        }];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{Cursor, CursoredPage};

    #[test]
    fn sanitize_strips_control_characters_and_truncates() {
        assert_eq!(sanitize_for_logging("a\nb\x07c", 10), "a b?c");
        assert_eq!(
            sanitize_for_logging("abcdef", 3),
            "abc... [truncated, 6 total bytes]"
        );
    }

    #[test]
    fn cursored_page_from_ids_payload() {
        let raw = RawResponse::new(
            200,
            r#"{"ids":[10,20],"next_cursor":5000,"next_cursor_str":"5000","previous_cursor":0,"previous_cursor_str":"0"}"#,
        );
        let page: CursoredPage<u64> =
            parse_response(&raw, &ResponseShape::CursoredPage { items_key: "ids" }).unwrap();
        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.next_cursor(), Cursor::from_raw(5000));
    }

    #[test]
    fn missing_items_field_is_a_protocol_error() {
        let raw = RawResponse::new(200, r#"{"next_cursor":0}"#);
        let result: Result<CursoredPage<u64>, _> =
            parse_response(&raw, &ResponseShape::CursoredPage { items_key: "users" });
        assert!(matches!(
            result,
            Err(ApiError::Transport(TransportError::Protocol(_)))
        ));
    }

    #[test]
    fn unauthorized_is_auth_error() {
        let raw = RawResponse::new(
            401,
            r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#,
        );
        match classify_failure(&raw) {
            ApiError::Auth { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid or expired token.");
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn auth_codes_only_count_on_forbidden() {
        let body = r#"{"errors":[{"code":220,"message":"Your credentials do not allow access to this resource."}]}"#;

        let forbidden = RawResponse::new(403, body);
        assert!(classify_failure(&forbidden).is_auth());

        let bad_request = RawResponse::new(400, body);
        assert!(matches!(
            classify_failure(&bad_request),
            ApiError::RemoteApi { status: 400, .. }
        ));

        let ok_with_errors = RawResponse::new(200, body);
        let result: Result<Value, _> = parse_response(&ok_with_errors, &ResponseShape::Single);
        assert!(matches!(
            result,
            Err(ApiError::RemoteApi { status: 200, .. })
        ));

        let forbidden_other = RawResponse::new(
            403,
            r#"{"errors":[{"code":187,"message":"Status is a duplicate."}]}"#,
        );
        assert!(!classify_failure(&forbidden_other).is_auth());
    }

    #[test]
    fn rate_limited_carries_window() {
        let raw = RawResponse::new(
            429,
            r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#,
        )
        .with_header("x-rate-limit-limit", "15")
        .with_header("x-rate-limit-remaining", "0")
        .with_header("x-rate-limit-reset", "1700000900");

        let err = classify_failure(&raw);
        assert!(err.is_rate_limited());
        assert_eq!(err.remote_code(), Some(88));
        assert_eq!(err.rate_limit().map(|r| r.limit), Some(15));
    }

    #[test]
    fn error_payload_with_success_status_is_rejected() {
        let raw = RawResponse::new(
            200,
            r#"{"errors":[{"code":187,"message":"Status is a duplicate."}]}"#,
        );
        let result: Result<Value, _> = parse_response(&raw, &ResponseShape::Single);
        assert_eq!(result.unwrap_err().remote_code(), Some(187));
    }

    #[test]
    fn non_json_failure_body_is_kept_as_message() {
        let raw = RawResponse::new(503, "Over capacity");
        match classify_failure(&raw) {
            ApiError::RemoteApi { status, errors, .. } => {
                assert_eq!(status, 503);
                assert_eq!(errors[0].message, "Over capacity");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn no_content_and_raw_shapes() {
        let raw = RawResponse::new(204, "");
        parse_response::<()>(&raw, &ResponseShape::NoContent).unwrap();

        let raw = RawResponse::new(200, "plain text");
        let text: String = parse_response(&raw, &ResponseShape::Raw).unwrap();
        assert_eq!(text, "plain text");
    }
}
