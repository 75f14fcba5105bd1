//! Observable value cells.

use std::fmt::{self, Display};
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{notify_all, Callback};
use crate::error::{Error, Result};
use crate::live::handler::Handler;

struct SignalInner<T> {
    value: RwLock<Arc<T>>,
    subscribers: Mutex<Vec<Callback>>,
    input_handler: OnceLock<Handler>,
}

/// A shared cell whose changes are pushed to subscribers.
///
/// Clones share the same value and subscriber list.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &**self.inner.value.read())
            .field("subscribers", &self.inner.subscribers.lock().len())
            .finish()
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(Arc::new(value)),
                subscribers: Mutex::new(Vec::new()),
                input_handler: OnceLock::new(),
            }),
        }
    }

    pub fn get(&self) -> T {
        T::clone(&self.inner.value.read())
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` sees a snapshot and runs without the lock held, so it may set
    /// this signal; the new value is not visible to `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let snapshot = Arc::clone(&self.inner.value.read());
        f(&snapshot)
    }

    /// Assign and notify every subscriber.
    pub async fn set(&self, value: T) {
        self.update(value, false).await
    }

    /// Assign, notifying subscribers unless `skip_notify`.
    pub async fn update(&self, value: T, skip_notify: bool) {
        self.set_silent(value);
        if !skip_notify {
            self.notify().await;
        }
    }

    /// Assign without notifying.
    pub fn set_silent(&self, value: T) {
        *self.inner.value.write() = Arc::new(value);
    }

    /// Run subscribers in insertion order.
    ///
    /// The list is snapshotted first, so a subscriber may subscribe or set
    /// again without deadlocking; a nested `set` notifies the list as it is
    /// at that moment.
    pub async fn notify(&self) {
        let subscribers = self.inner.subscribers.lock().clone();
        notify_all("signal", subscribers).await;
    }

    pub fn subscribe<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.subscribers.lock().push(Callback::new(f));
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Set to `value` for the duration of `body`, then restore.
    ///
    /// The prior value comes back on every exit path. When the future is
    /// dropped mid-way the restore happens silently, since no notification
    /// can be awaited from a destructor.
    pub async fn scoped<Fut>(&self, value: T, body: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        let prior = self.get();
        self.set(value).await;
        let mut guard = RestoreGuard {
            signal: self,
            prior: Some(prior),
        };
        let output = body.await;
        if let Some(prior) = guard.prior.take() {
            self.set(prior).await;
        }
        output
    }

    /// A handler that sets the signal to `value` when fired.
    pub fn setter(&self, value: T) -> Handler {
        let weak = Arc::downgrade(&self.inner);
        Handler::from_fn(move || {
            let weak = weak.clone();
            let value = value.clone();
            async move {
                if let Some(signal) = upgrade(&weak) {
                    signal.set(value).await;
                }
                Ok(())
            }
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Signal<T>
where
    T: Clone + Display + FromStr + Send + Sync + 'static,
    T::Err: Display,
{
    /// The handler behind two-way bindings: parses the client value and sets
    /// the signal. The same handler is returned on every call.
    pub fn input_handler(&self) -> Handler {
        self.inner
            .input_handler
            .get_or_init(|| {
                let weak = Arc::downgrade(&self.inner);
                Handler::new(move |raw: Option<String>| {
                    let weak = weak.clone();
                    async move {
                        let raw = raw.unwrap_or_default();
                        let value = raw.parse::<T>().map_err(|e| {
                            Error::handler(format!("cannot parse input '{}': {}", raw, e))
                        })?;
                        if let Some(signal) = upgrade(&weak) {
                            signal.set(value).await;
                        }
                        Ok(())
                    }
                })
            })
            .clone()
    }
}

fn upgrade<T>(weak: &Weak<SignalInner<T>>) -> Option<Signal<T>> {
    match weak.upgrade() {
        Some(inner) => Some(Signal { inner }),
        None => {
            debug!("signal dropped before its handler fired");
            None
        }
    }
}

struct RestoreGuard<'a, T: Clone + Send + Sync + 'static> {
    signal: &'a Signal<T>,
    prior: Option<T>,
}

impl<T: Clone + Send + Sync + 'static> Drop for RestoreGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            self.signal.set_silent(prior);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter(signal: &Signal<i32>) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        signal.subscribe(move || {
            let sink = sink.clone();
            async move {
                sink.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        hits
    }

    #[tokio::test]
    async fn test_skip_notify_then_notify() {
        let signal = Signal::new(0);
        let hits = counter(&signal);
        signal.update(1, true).await;
        assert_eq!(signal.get(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        signal.set(2).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribers_run_in_order_and_survive_failures() {
        let signal = Signal::new(0);
        let trace = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let trace = trace.clone();
            signal.subscribe(move || {
                let trace = trace.clone();
                async move {
                    trace.lock().push(i);
                    if i == 1 {
                        return Err(Error::handler("subscriber 1 fails"));
                    }
                    Ok(())
                }
            });
        }
        signal.set(5).await;
        assert_eq!(*trace.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reentrant_set_from_subscriber() {
        let signal = Signal::new(0);
        let inner = signal.clone();
        signal.subscribe(move || {
            let inner = inner.clone();
            async move {
                if inner.get() < 3 {
                    let next = inner.get() + 1;
                    inner.set(next).await;
                }
                Ok(())
            }
        });
        let hits = counter(&signal);
        Box::pin(signal.set(1)).await;
        assert_eq!(signal.get(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_scoped_restores_and_notifies() {
        let signal = Signal::new(false);
        let seen = signal
            .scoped(true, async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                signal.get()
            })
            .await;
        assert!(seen);
        assert!(!signal.get());
    }

    #[tokio::test]
    async fn test_scoped_restores_on_cancellation() {
        let signal = Signal::new(0);
        let result = tokio::time::timeout(
            Duration::from_millis(10),
            signal.scoped(7, tokio::time::sleep(Duration::from_secs(5))),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(signal.get(), 0);
    }

    #[test]
    fn test_with_may_set_the_signal() {
        let signal = Signal::new(vec![1, 2]);
        let seen = signal.with(|items| {
            signal.set_silent(vec![9]);
            items.len()
        });
        assert_eq!(seen, 2);
        assert_eq!(signal.get(), vec![9]);
    }

    #[tokio::test]
    async fn test_input_handler_parses_and_is_cached() {
        let signal = Signal::new(0_i64);
        let handler = signal.input_handler();
        assert_eq!(handler, signal.input_handler());
        handler.call(Some("42".into())).await.unwrap();
        assert_eq!(signal.get(), 42);
        assert!(handler.call(Some("nope".into())).await.is_err());
        assert_eq!(signal.get(), 42);
    }

    #[tokio::test]
    async fn test_setter_sets_fixed_value() {
        let signal = Signal::new("a".to_string());
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = hits.clone();
        signal.subscribe(move || {
            let sink = sink.clone();
            async move {
                sink.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        signal.setter("b".to_string()).call(None).await.unwrap();
        assert_eq!(signal.get(), "b");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
