use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use sealgate_types::prelude::RequestScope;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::embedded::bundle::{fetch_bundle, Fetched};
use crate::embedded::config::EmbeddedConfig;
use crate::embedded::engine::{rule_path, unwrap_input, Compiled};
use crate::errors::EvalError;
use crate::evaluator::Evaluator;

/// Outcome of the most recent reload attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReloadStatus {
    /// Revision of the bundle currently serving decisions.
    pub revision: u64,
    /// Developer message of the last failed attempt, cleared on success.
    pub error: Option<String>,
}

struct Shared {
    config: ArcSwap<EmbeddedConfig>,
    snapshot: ArcSwap<Compiled>,
    reload_lock: Mutex<()>,
    last_error: SyncMutex<Option<EvalError>>,
    status_tx: watch::Sender<ReloadStatus>,
    trigger: Notify,
    http: reqwest::Client,
}

impl Shared {
    async fn reload(&self) -> Result<bool, EvalError> {
        let _guard = self.reload_lock.lock().await;
        let config = self.config.load_full();
        let etag = self.snapshot.load().bundle.etag.clone();
        match self.fetch(&config, etag.as_deref()).await {
            Ok(changed) => Ok(changed),
            Err(err) => {
                *self.last_error.lock() = Some(err.clone());
                self.publish(Some(&err));
                Err(err)
            }
        }
    }

    /// Fetches and installs a bundle for `config`. Callers hold `reload_lock`.
    async fn fetch(&self, config: &EmbeddedConfig, etag: Option<&str>) -> Result<bool, EvalError> {
        let changed = match fetch_bundle(&self.http, config, etag).await? {
            Fetched::Unchanged => false,
            Fetched::Loaded(mut bundle) => {
                let current = self.snapshot.load();
                let changed =
                    bundle.modules != current.bundle.modules || bundle.data != current.bundle.data;
                let next = if changed {
                    bundle.revision = current.bundle.revision + 1;
                    let revision = bundle.revision;
                    let modules = bundle.modules.len();
                    let compiled = Compiled::new(bundle)?;
                    info!(revision, modules, "installed policy bundle");
                    compiled
                } else {
                    bundle.revision = current.bundle.revision;
                    current.refreshed(bundle)
                };
                self.snapshot.store(Arc::new(next));
                changed
            }
        };
        *self.last_error.lock() = None;
        self.publish(None);
        Ok(changed)
    }

    fn publish(&self, error: Option<&EvalError>) {
        let status = ReloadStatus {
            revision: self.snapshot.load().bundle.revision,
            error: error.map(|err| err.0.message_dev.clone().unwrap_or_else(|| err.to_string())),
        };
        self.status_tx.send_replace(status);
    }
}

/// In-process Rego engine serving decisions from a reloadable bundle.
pub struct EmbeddedEvaluator {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    reloader: SyncMutex<Option<JoinHandle<()>>>,
}

impl EmbeddedEvaluator {
    /// Loads the bundle once and starts the background reloader.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(config: EmbeddedConfig) -> Result<Self, EvalError> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|err| EvalError::unknown(&format!("failed to build http client: {err}")))?;
        let (status_tx, _status_rx) = watch::channel(ReloadStatus::default());
        let shared = Arc::new(Shared {
            config: ArcSwap::from_pointee(config.clone()),
            snapshot: ArcSwap::from_pointee(Compiled::default()),
            reload_lock: Mutex::new(()),
            last_error: SyncMutex::new(None),
            status_tx,
            trigger: Notify::new(),
            http,
        });

        {
            let _guard = shared.reload_lock.lock().await;
            shared.fetch(&config, None).await?;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_reloader(Arc::clone(&shared), cancel.clone()));
        Ok(Self {
            shared,
            cancel,
            reloader: SyncMutex::new(Some(handle)),
        })
    }

    pub fn config(&self) -> Arc<EmbeddedConfig> {
        self.shared.config.load_full()
    }

    pub fn revision(&self) -> u64 {
        self.shared.snapshot.load().bundle.revision
    }

    pub fn subscribe(&self) -> watch::Receiver<ReloadStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn last_reload_error(&self) -> Option<EvalError> {
        self.shared.last_error.lock().clone()
    }

    /// Reloads the bundle now, on the caller's task.
    pub async fn reload(&self) -> Result<bool, EvalError> {
        self.shared.reload().await
    }

    /// Wakes the background reloader without waiting for the outcome.
    pub fn trigger_reload(&self) {
        self.shared.trigger.notify_one();
    }

    /// Replaces the configuration and loads its bundle immediately.
    ///
    /// On failure the previous configuration and bundle stay in place.
    pub async fn reconfigure(&self, config: EmbeddedConfig) -> Result<(), EvalError> {
        let _guard = self.shared.reload_lock.lock().await;
        self.shared.fetch(&config, None).await?;
        self.shared.config.store(Arc::new(config));
        info!("embedded evaluator reconfigured");
        Ok(())
    }

    /// Stops the reloader and waits for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.reloader.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "bundle reloader ended abnormally");
            }
        }
    }
}

impl Drop for EmbeddedEvaluator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl Evaluator for EmbeddedEvaluator {
    async fn evaluate(
        &self,
        scope: &RequestScope,
        document: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, EvalError> {
        if scope.is_cancelled() {
            return Err(EvalError::cancelled());
        }
        let rule = rule_path(document, &self.shared.config.load());
        let snapshot = self.shared.snapshot.load_full();
        let input = unwrap_input(input).clone();
        debug!(rule = %rule, revision = snapshot.bundle.revision, "evaluating embedded decision");

        tokio::task::spawn_blocking(move || snapshot.decide(&rule, &input))
            .await
            .map_err(|err| EvalError::internal(&format!("decision task failed: {err}")))?
    }
}

async fn run_reloader(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut failures: u32 = 0;
    loop {
        let config = shared.config.load_full();
        let delay = if failures == 0 {
            config.reload_interval()
        } else {
            Some(config.polling.backoff(failures))
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.trigger.notified() => {}
            _ = wait(delay) => {}
        }

        match shared.reload().await {
            Ok(changed) => {
                if failures > 0 {
                    info!(failures, "bundle reload recovered");
                }
                failures = 0;
                debug!(changed, "bundle reload finished");
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                error!(
                    failures,
                    code = err.code().0,
                    error = %err,
                    "bundle reload failed; serving previous bundle"
                );
            }
        }
    }
    debug!("bundle reloader stopped");
}

async fn wait(delay: Option<Duration>) {
    match delay {
        Some(delay) => sleep(delay).await,
        None => std::future::pending::<()>().await,
    }
}
