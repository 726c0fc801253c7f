use serde::{Deserialize, Serialize};

const REDACTED: &str = "redacted";
const DEBUG_PART_LIMIT: usize = 16;

/// How the JWT is placed into the decision payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JwtMode {
    /// Send the token as received; the engine inspects its claims.
    #[default]
    Raw,
    /// Replace the signature part with `redacted`.
    RedactSignature,
}

impl JwtMode {
    pub fn apply(self, jwt: &str) -> String {
        match self {
            JwtMode::Raw => jwt.to_string(),
            JwtMode::RedactSignature => redact_signature(jwt),
        }
    }
}

/// `a.b.c` becomes `a.b.redacted`; a token without `.` becomes `redacted`.
pub fn redact_signature(jwt: &str) -> String {
    match jwt.rsplit_once('.') {
        Some((head, _signature)) => format!("{head}.{REDACTED}"),
        None => REDACTED.to_string(),
    }
}

/// Log-safe form: each part cut to 16 bytes and suffixed with `/redacted`.
pub fn redact_full(jwt: &str) -> String {
    jwt.split('.')
        .map(|part| {
            let kept = truncate_bytes(part, DEBUG_PART_LIMIT);
            format!("{kept}/{REDACTED}")
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn truncate_bytes(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
