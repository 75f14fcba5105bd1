//! Observable state: signals, effectors and reactive models.

pub mod effector;
pub mod model;
pub mod signal;
pub mod when;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::warn;

use crate::error::{Error, Result};

pub use effector::Effector;
pub use model::{Model, ReactiveModel, State};
pub use signal::Signal;
pub use when::{when, When};

/// A nullary async callback, used for subscribers and pre-actions.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>);

impl Callback {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    pub fn call(&self) -> BoxFuture<'static, Result<()>> {
        (self.0)()
    }
}

/// Await each callback in order.
///
/// Failures are logged and skipped, so every callback runs. They come back as
/// [`Error::SubscriberFailure`]s.
pub(crate) async fn notify_all(source: &str, callbacks: Vec<Callback>) -> Vec<Error> {
    let mut failures = Vec::new();
    for (index, callback) in callbacks.into_iter().enumerate() {
        if let Err(e) = callback.call().await {
            let failure = Error::subscriber(source, index, &e);
            warn!(error = %failure, "subscriber failed");
            failures.push(failure);
        }
    }
    failures
}
