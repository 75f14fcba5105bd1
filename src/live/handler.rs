//! Event handlers and the per-session handler table.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;

/// Prefix of every handler id sent to the client.
pub const HANDLER_ID_PREFIX: &str = "event-";

static NEXT_HANDLER_KEY: AtomicU64 = AtomicU64::new(1);

type HandlerFn = dyn Fn(Option<String>) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// A server-side callback bound to a client DOM event.
///
/// Cloning a handler keeps its identity, so registering clones of the same
/// handler in a session always yields the same handler id.
#[derive(Clone)]
pub struct Handler {
    key: u64,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Build a handler that receives the optional value sent by the client.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            key: NEXT_HANDLER_KEY.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(move |value| func(value).boxed()),
        }
    }

    /// Build a handler that ignores the client value.
    pub fn from_fn<F, Fut>(func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::new(move |_| func())
    }

    /// Process-unique identity of the underlying callable.
    pub fn identity(&self) -> u64 {
        self.key
    }

    pub fn call(&self, value: Option<String>) -> BoxFuture<'static, Result<()>> {
        (self.func)(value)
    }
}

impl From<&Handler> for Handler {
    fn from(handler: &Handler) -> Self {
        handler.clone()
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler#{}", self.key)
    }
}

/// Deterministic element id for an element that only has event bindings.
///
/// Lowercase hex, 8 chars, derived from the concatenated handler identities.
pub fn element_id_for<'a>(handlers: impl IntoIterator<Item = &'a Handler>) -> String {
    let mut hasher = Sha256::new();
    for handler in handlers {
        hasher.update(format!("handler-{};", handler.identity()).as_bytes());
    }
    let digest = hasher.finalize();
    digest
        .iter()
        .take(4)
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Bijective mapping between handler ids and handlers.
#[derive(Default)]
pub struct HandlerTable {
    by_id: HashMap<String, Handler>,
    by_identity: HashMap<u64, String>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, reusing the id it already has.
    pub fn register(&mut self, handler: &Handler) -> String {
        if let Some(existing) = self.by_identity.get(&handler.identity()) {
            return existing.clone();
        }
        let id = format!("{}{}", HANDLER_ID_PREFIX, Uuid::new_v4());
        self.by_identity.insert(handler.identity(), id.clone());
        self.by_id.insert(id.clone(), handler.clone());
        id
    }

    pub fn get(&self, id: &str) -> Option<Handler> {
        self.by_id.get(id).cloned()
    }

    pub fn id_of(&self, handler: &Handler) -> Option<&str> {
        self.by_identity.get(&handler.identity()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_identity.clear();
    }
}
