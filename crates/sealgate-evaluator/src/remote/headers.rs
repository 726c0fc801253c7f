use http::header::{HeaderMap, HeaderName, HeaderValue};
use sealgate_types::prelude::Metadata;
use tracing::debug;

/// Request-framing headers owned by the outgoing request itself.
const RESERVED: &[&str] = &[
    "content-type",
    "content-length",
    "transfer-encoding",
    "connection",
    "host",
    "te",
    "upgrade",
];

/// Converts inbound request metadata into outgoing HTTP headers.
///
/// Pseudo-headers, binary (`-bin`) entries, framing headers and anything that
/// is not a valid HTTP field name or value are dropped.
pub fn forward_metadata(metadata: &Metadata) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in metadata.iter() {
        if key.starts_with(':') || key.ends_with("-bin") || RESERVED.contains(&key) {
            debug!(header = key, "not forwarding reserved or binary metadata");
            continue;
        }
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            debug!(header = key, "not forwarding metadata with invalid header name");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            debug!(header = key, "not forwarding metadata with invalid header value");
            continue;
        };
        headers.append(name, value);
    }
    headers
}
