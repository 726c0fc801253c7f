use serde::{Deserialize, Serialize};

/// `/pkg.sub.Service/Method` becomes `Service.Method`.
pub fn short_endpoint(full_method: &str) -> String {
    let last = full_method.rsplit('.').next().unwrap_or(full_method);
    last.replace('/', ".")
}

/// Reshapes `METHOD /a/b/c/d` into `METHOD /<prefix>/c/d` for HTTP transports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEndpointModifier {
    /// Trailing path segments to keep.
    pub segments: usize,
    pub prefix: String,
}

impl HttpEndpointModifier {
    pub fn new(segments: usize, prefix: impl Into<String>) -> Self {
        Self {
            segments,
            prefix: prefix.into(),
        }
    }

    pub fn apply(&self, endpoint: &str) -> String {
        let (method, path) = match endpoint.split_once(' ') {
            Some((method, path)) => (Some(method), path),
            None => (None, endpoint),
        };
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let keep = &parts[parts.len().saturating_sub(self.segments)..];

        let mut reshaped = String::new();
        let prefix = self.prefix.trim_matches('/');
        if !prefix.is_empty() {
            reshaped.push('/');
            reshaped.push_str(prefix);
        }
        for part in keep {
            reshaped.push('/');
            reshaped.push_str(part);
        }
        if reshaped.is_empty() {
            reshaped.push('/');
        }

        match method {
            Some(method) => format!("{method} {reshaped}"),
            None => reshaped,
        }
    }
}
