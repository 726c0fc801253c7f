use http::Extensions;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::keys::{AbacType, AbacVerb};
use crate::metadata::Metadata;

/// Per-request attribute bag threaded through the decision pipeline.
///
/// Clones share the cancellation token, so cancelling the scope a handler
/// received also cancels any evaluator call made with an enriched copy.
#[derive(Clone, Debug, Default)]
pub struct RequestScope {
    pub request_id: Option<String>,
    pub metadata: Metadata,
    pub deadline: Option<Instant>,
    cancel: CancellationToken,
    extensions: Extensions,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_abac(mut self, abac_type: impl Into<String>, verb: impl Into<String>) -> Self {
        self.insert(AbacType(abac_type.into()));
        self.insert(AbacVerb(verb.into()));
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn insert<T>(&mut self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(value)
    }

    pub fn get<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get::<T>()
    }

    pub fn remove<T>(&mut self) -> Option<T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.remove::<T>()
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.get::<T>().is_some()
    }
}
