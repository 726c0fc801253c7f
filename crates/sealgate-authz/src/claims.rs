use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

const BEARER_PREFIX: &str = "Bearer ";

/// Result of inspecting the bearer headers of a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimsOutcome {
    /// The chosen raw token, without any `Bearer ` prefix.
    pub raw_jwt: String,
    pub errors: Vec<String>,
}

impl ClaimsOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Chooses and checks the JWT carried by a request.
///
/// `new_bearer` comes from `set-authorization` and wins over `bearer` from
/// `authorization`. Signature verification, if any, belongs to the
/// implementation.
pub trait ClaimsVerifier: Send + Sync {
    fn verify(&self, bearer: Option<&str>, new_bearer: Option<&str>) -> ClaimsOutcome;
}

/// Accepts any token; only requires one to be present.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughClaims;

impl ClaimsVerifier for PassthroughClaims {
    fn verify(&self, bearer: Option<&str>, new_bearer: Option<&str>) -> ClaimsOutcome {
        match choose(bearer, new_bearer) {
            Some(jwt) => ClaimsOutcome {
                raw_jwt: jwt.to_string(),
                errors: Vec::new(),
            },
            None => ClaimsOutcome {
                raw_jwt: String::new(),
                errors: vec!["no bearer token in request metadata".to_string()],
            },
        }
    }
}

/// Also requires a compact JWS: three non-empty base64url parts.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralClaims;

impl ClaimsVerifier for StructuralClaims {
    fn verify(&self, bearer: Option<&str>, new_bearer: Option<&str>) -> ClaimsOutcome {
        let mut outcome = PassthroughClaims.verify(bearer, new_bearer);
        if !outcome.is_ok() {
            return outcome;
        }

        let parts: Vec<&str> = outcome.raw_jwt.split('.').collect();
        if parts.len() != 3 {
            outcome
                .errors
                .push(format!("expected 3 token parts, found {}", parts.len()));
            return outcome;
        }
        for (idx, part) in parts.iter().enumerate() {
            if part.is_empty() {
                outcome.errors.push(format!("token part {idx} is empty"));
            } else if URL_SAFE_NO_PAD.decode(part.trim_end_matches('=')).is_err() {
                outcome
                    .errors
                    .push(format!("token part {idx} is not base64url"));
            }
        }
        outcome
    }
}

fn choose<'a>(bearer: Option<&'a str>, new_bearer: Option<&'a str>) -> Option<&'a str> {
    [new_bearer, bearer]
        .into_iter()
        .flatten()
        .map(|value| value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim())
        .find(|value| !value.is_empty())
}
