//! Instrumented async actions.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{notify_all, Callback};
use crate::error::Result;
use crate::live::handler::Handler;

type Body = dyn Fn(Option<String>) -> BoxFuture<'static, Result<()>> + Send + Sync;

struct EffectorInner {
    name: String,
    body: Box<Body>,
    pre_actions: Mutex<Vec<Callback>>,
    subscribers: Mutex<Vec<Callback>>,
    handler: OnceLock<Handler>,
}

/// An async action wrapped with pre-actions and post-subscribers.
///
/// Calling it runs every pre-action concurrently, then the body, then each
/// subscriber in registration order.
#[derive(Clone)]
pub struct Effector {
    inner: Arc<EffectorInner>,
}

impl fmt::Debug for Effector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effector")
            .field("name", &self.inner.name)
            .field("pre_actions", &self.inner.pre_actions.lock().len())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

impl Effector {
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            inner: Arc::new(EffectorInner {
                name: name.into(),
                body: Box::new(move |arg| body(arg).boxed()),
                pre_actions: Mutex::new(Vec::new()),
                subscribers: Mutex::new(Vec::new()),
                handler: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Invoke with an optional argument.
    ///
    /// A failing body aborts the call before any subscriber runs. Failing
    /// pre-actions and subscribers are logged and do not.
    pub async fn call(&self, arg: Option<String>) -> Result<()> {
        let pre_actions = self.inner.pre_actions.lock().clone();
        if !pre_actions.is_empty() {
            let results = join_all(pre_actions.iter().map(Callback::call)).await;
            for e in results.into_iter().filter_map(|r| r.err()) {
                warn!(effector = %self.inner.name, error = %e, "pre-action failed");
            }
        }

        debug!(effector = %self.inner.name, "running effector body");
        (self.inner.body)(arg).await?;

        let subscribers = self.inner.subscribers.lock().clone();
        notify_all(&self.inner.name, subscribers).await;
        Ok(())
    }

    pub async fn fire(&self) -> Result<()> {
        self.call(None).await
    }

    /// Run `f` after every successful body.
    pub fn subscribe<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.subscribers.lock().push(Callback::new(f));
    }

    /// Run `f` concurrently with the other pre-actions before every body.
    pub fn prepend<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.pre_actions.lock().push(Callback::new(f));
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    pub fn pre_action_count(&self) -> usize {
        self.inner.pre_actions.lock().len()
    }

    /// The event handler that invokes this effector, stable across calls.
    pub fn handler(&self) -> Handler {
        self.inner
            .handler
            .get_or_init(|| {
                let weak = Arc::downgrade(&self.inner);
                Handler::new(move |arg| {
                    let weak = weak.clone();
                    async move {
                        match weak.upgrade() {
                            Some(inner) => Effector { inner }.call(arg).await,
                            None => Ok(()),
                        }
                    }
                })
            })
            .clone()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<&Effector> for Handler {
    fn from(effector: &Effector) -> Self {
        effector.handler()
    }
}

impl From<Effector> for Handler {
    fn from(effector: Effector) -> Self {
        effector.handler()
    }
}
