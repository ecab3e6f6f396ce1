// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! Axum's `Json` rejects bad bodies with terse plain-text errors. The tool argument
//! extractor answers with a `ServerError::JsonError` carrying the position of the problem
//! and a hint.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
    pub const NOT_AN_OBJECT: &str = "tool arguments must be a JSON object";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Arguments of a tool call
///
/// An empty body counts as no arguments and is passed on as `null`; anything else must be
/// a JSON object or `null`.
#[derive(Debug)]
pub struct ToolArguments(pub Value);

impl<S> FromRequest<S> for ToolArguments
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = read_json_body(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Null));
        }

        match parse_json(&bytes)? {
            arguments @ (Value::Object(_) | Value::Null) => Ok(Self(arguments)),
            _ => Err(ServerError::JsonError {
                message: error_hints::NOT_AN_OBJECT.to_string(),
            }),
        }
    }
}

/// Check the content type and size limit, then read the whole body
async fn read_json_body<S>(req: Request, state: &S) -> Result<Bytes, ServerError>
where
    S: Send + Sync,
{
    if let Some(content_type) = req.headers().get("content-type")
        && let Ok(content_type_str) = content_type.to_str()
        && !content_type_str.starts_with("application/json")
    {
        return Err(ServerError::JsonError {
            message: format!(
                "invalid content-type: expected 'application/json', got '{content_type_str}'"
            ),
        });
    }

    let bytes = Bytes::from_request(req, state)
        .await
        .map_err(|rejection| ServerError::JsonError {
            message: format!("failed to read request body: {rejection}"),
        })?;

    if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
        return Err(ServerError::JsonError {
            message: format!(
                "request body too large: {} bytes (max: {} bytes)",
                bytes.len(),
                MAX_JSON_PAYLOAD_SIZE
            ),
        });
    }

    Ok(bytes)
}

fn parse_json(bytes: &[u8]) -> Result<Value, ServerError> {
    serde_json::from_slice::<Value>(bytes).map_err(|err| {
        let message = if err.is_syntax() {
            format!(
                "invalid JSON syntax at line {}, column {}: {}",
                err.line(),
                err.column(),
                json_syntax_hint(&err)
            )
        } else if err.is_eof() {
            error_hints::TRUNCATED_JSON.to_string()
        } else {
            format!("JSON parsing error: {err}")
        };
        ServerError::JsonError { message }
    })
}

fn json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}
