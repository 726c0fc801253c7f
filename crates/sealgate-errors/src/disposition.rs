/// What a caller is expected to do after seeing an error.
///
/// `Deny` and `Reject` are final for the request at hand. `Retry` covers
/// engine-side trouble that may clear up on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The policy said no, or the caller could not be identified.
    Deny,
    /// The request or the decision could not be interpreted.
    Reject,
    Retry,
    /// The caller gave up before a decision was reached.
    Abandon,
}

impl Disposition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Disposition::Deny => "deny",
            Disposition::Reject => "reject",
            Disposition::Retry => "retry",
            Disposition::Abandon => "abandon",
        }
    }

    pub const fn is_final(self) -> bool {
        matches!(self, Disposition::Deny | Disposition::Reject)
    }
}
