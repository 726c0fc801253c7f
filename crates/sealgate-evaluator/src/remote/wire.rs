use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::errors::EvalError;

const SNIPPET_LIMIT: usize = 256;

/// Error object returned by the engine on non-success responses.
#[derive(Debug, Deserialize)]
struct EngineError {
    code: String,
    #[serde(default)]
    message: String,
}

pub(crate) fn decode_success(status: StatusCode, body: &Bytes) -> Result<Map<String, Value>, EvalError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice::<Map<String, Value>>(body)
        .map_err(|err| undecodable(status, body, &format!("response is not a JSON object: {err}")))
}

pub(crate) fn decode_failure(status: StatusCode, body: &Bytes) -> EvalError {
    match serde_json::from_slice::<EngineError>(body) {
        Ok(engine) => {
            let mut err = EvalError::from_engine(&engine.code, &engine.message);
            err.0.meta.insert("http_status".into(), json!(status.as_u16()));
            err
        }
        Err(_) => undecodable(status, body, "engine returned an undecodable error"),
    }
}

fn undecodable(status: StatusCode, body: &Bytes, msg: &str) -> EvalError {
    let mut err = EvalError::unknown(msg);
    err.0.meta.insert("http_status".into(), json!(status.as_u16()));
    err.0.meta.insert("body".into(), json!(snippet(body)));
    err
}

pub(crate) fn snippet(body: &[u8]) -> String {
    let end = body.len().min(SNIPPET_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
