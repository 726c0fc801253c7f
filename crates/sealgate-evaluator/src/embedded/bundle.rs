use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::embedded::config::EmbeddedConfig;
use crate::errors::EvalError;

const DATA_FILE: &str = "data.json";

/// Policy modules and base data loaded from a bundle source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    /// Module name to Rego source.
    pub modules: BTreeMap<String, String>,
    /// Base document exposed under `data`.
    pub data: Value,
    pub etag: Option<String>,
    /// Bumped every time a changed bundle is installed.
    pub revision: u64,
}

/// Wire form of a bundle served over HTTP or stored as a single `.json` file.
#[derive(Debug, Deserialize)]
struct BundleDocument {
    #[serde(default)]
    modules: BTreeMap<String, String>,
    #[serde(default)]
    data: Value,
}

impl From<BundleDocument> for Bundle {
    fn from(doc: BundleDocument) -> Self {
        Bundle {
            modules: doc.modules,
            data: doc.data,
            etag: None,
            revision: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleSource {
    File(PathBuf),
    Http(String),
}

impl BundleSource {
    pub fn parse(url: &str) -> Result<Self, EvalError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(EvalError::invalid_argument("bundle_url is empty"));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(BundleSource::File(PathBuf::from(path)));
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            url::Url::parse(url)
                .map_err(|err| EvalError::invalid_argument(&format!("invalid bundle url {url}: {err}")))?;
            return Ok(BundleSource::Http(url.to_string()));
        }
        if url.contains("://") {
            return Err(EvalError::invalid_argument(&format!(
                "unsupported bundle url scheme: {url}"
            )));
        }
        Ok(BundleSource::File(PathBuf::from(url)))
    }
}

pub enum Fetched {
    Loaded(Bundle),
    /// The server answered `304 Not Modified`.
    Unchanged,
}

pub async fn fetch_bundle(
    client: &reqwest::Client,
    config: &EmbeddedConfig,
    etag: Option<&str>,
) -> Result<Fetched, EvalError> {
    match BundleSource::parse(&config.bundle_url)? {
        BundleSource::File(path) => {
            let bundle = tokio::task::spawn_blocking(move || load_path(&path))
                .await
                .map_err(|err| EvalError::internal(&format!("bundle loader task failed: {err}")))??;
            Ok(Fetched::Loaded(bundle))
        }
        BundleSource::Http(url) => fetch_http(client, &url, config, etag).await,
    }
}

async fn fetch_http(
    client: &reqwest::Client,
    url: &str,
    config: &EmbeddedConfig,
    etag: Option<&str>,
) -> Result<Fetched, EvalError> {
    let mut request = client.get(url);
    if let Some(tag) = etag {
        request = request.header(IF_NONE_MATCH, tag);
    }
    if let Some(timeout) = config.polling.long_poll_timeout() {
        request = request
            .timeout(timeout)
            .header("prefer", format!("wait={}", timeout.as_secs().max(1)));
    }

    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::NOT_MODIFIED {
        debug!(url, "bundle not modified");
        return Ok(Fetched::Unchanged);
    }
    let new_etag = response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(EvalError::unavailable(&format!(
            "bundle server returned {status} for {url}"
        )));
    }

    let doc: BundleDocument = serde_json::from_slice(&body)
        .map_err(|err| EvalError::invalid_argument(&format!("invalid bundle document from {url}: {err}")))?;
    let mut bundle = Bundle::from(doc);
    bundle.etag = new_etag;
    Ok(Fetched::Loaded(bundle))
}

/// Loads a bundle from a directory, a single `.rego` module or a `.json`
/// bundle document.
pub fn load_path(path: &Path) -> Result<Bundle, EvalError> {
    let meta = fs::metadata(path)
        .map_err(|err| EvalError::unavailable(&format!("bundle {}: {err}", path.display())))?;
    if meta.is_dir() {
        return load_dir(path);
    }

    let text = read(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("rego") => {
            let mut bundle = Bundle {
                data: Value::Object(Map::new()),
                ..Bundle::default()
            };
            bundle.modules.insert(module_name(path, path.parent()), text);
            Ok(bundle)
        }
        Some("json") => {
            let doc: BundleDocument = serde_json::from_str(&text).map_err(|err| {
                EvalError::invalid_argument(&format!("invalid bundle document {}: {err}", path.display()))
            })?;
            Ok(Bundle::from(doc))
        }
        _ => Err(EvalError::invalid_argument(&format!(
            "unsupported bundle file {}",
            path.display()
        ))),
    }
}

fn load_dir(root: &Path) -> Result<Bundle, EvalError> {
    let mut bundle = Bundle {
        data: Value::Object(Map::new()),
        ..Bundle::default()
    };

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry
            .map_err(|err| EvalError::unavailable(&format!("walking bundle {}: {err}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("rego") {
            bundle.modules.insert(module_name(path, Some(root)), read(path)?);
        } else if entry.file_name() == DATA_FILE {
            let value: Value = serde_json::from_str(&read(path)?).map_err(|err| {
                EvalError::invalid_argument(&format!("invalid data file {}: {err}", path.display()))
            })?;
            let segments = data_segments(path, root);
            merge_at(&mut bundle.data, &segments, value)?;
        }
    }

    debug!(
        root = %root.display(),
        modules = bundle.modules.len(),
        "loaded bundle directory"
    );
    Ok(bundle)
}

fn read(path: &Path) -> Result<String, EvalError> {
    fs::read_to_string(path)
        .map_err(|err| EvalError::unavailable(&format!("reading {}: {err}", path.display())))
}

fn module_name(path: &Path, root: Option<&Path>) -> String {
    let relative = root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory components between the bundle root and a `data.json` file.
fn data_segments(path: &Path, root: &Path) -> Vec<String> {
    path.parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(|dir| {
            dir.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Deep-merges `value` into `root` at `segments`.
pub(crate) fn merge_at(root: &mut Value, segments: &[String], value: Value) -> Result<(), EvalError> {
    let mut target = root;
    for segment in segments {
        let Value::Object(map) = target else {
            return Err(EvalError::invalid_argument(&format!(
                "bundle data conflict at {}",
                segments.join("/")
            )));
        };
        target = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    merge_values(target, value, segments)
}

fn merge_values(target: &mut Value, value: Value, at: &[String]) -> Result<(), EvalError> {
    match (target, value) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, incoming) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => {
                        let mut path = at.to_vec();
                        path.push(key);
                        merge_values(slot, incoming, &path)?;
                    }
                    None => {
                        existing.insert(key, incoming);
                    }
                }
            }
            Ok(())
        }
        (slot, incoming) if slot.is_null() => {
            *slot = incoming;
            Ok(())
        }
        _ => Err(EvalError::invalid_argument(&format!(
            "bundle data conflict at {}",
            at.join("/")
        ))),
    }
}
