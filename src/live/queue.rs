//! The per-page render queue.
//!
//! Handler tasks run with their page's queue installed as the task-local
//! current queue, so bound components can enqueue themselves without holding
//! a reference to the page.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::component::Component;

tokio::task_local! {
    static CURRENT_QUEUE: RenderQueue;
}

/// A unit of work for the emitter.
#[derive(Clone)]
pub enum QueueItem {
    /// Re-render the component in place.
    Component(Arc<dyn Component>),
    /// Show `fallback` inside the component's root until the next render.
    Fallback {
        component: Arc<dyn Component>,
        fallback: Arc<dyn Component>,
    },
}

impl QueueItem {
    /// Element id the resulting frame targets.
    pub fn target(&self) -> &str {
        match self {
            Self::Component(component) => component.id(),
            Self::Fallback { component, .. } => component.id(),
        }
    }

    fn dedupe_key(&self) -> (String, bool) {
        (
            self.target().to_string(),
            matches!(self, Self::Fallback { .. }),
        )
    }
}

impl fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(_) => write!(f, "Component({})", self.target()),
            Self::Fallback { .. } => write!(f, "Fallback({})", self.target()),
        }
    }
}

struct QueueInner {
    tx: async_channel::Sender<QueueItem>,
    rx: async_channel::Receiver<QueueItem>,
    dedupe: bool,
    pending: Mutex<HashSet<(String, bool)>>,
}

/// Unbounded FIFO of dirty components.
#[derive(Clone)]
pub struct RenderQueue {
    inner: Arc<QueueInner>,
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RenderQueue {
    /// With `dedupe`, an item already waiting in the queue is not added twice.
    pub fn new(dedupe: bool) -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self {
            inner: Arc::new(QueueInner {
                tx,
                rx,
                dedupe,
                pending: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Non-blocking put. Returns whether the item was queued.
    pub fn put(&self, item: QueueItem) -> bool {
        if self.inner.dedupe && !self.inner.pending.lock().insert(item.dedupe_key()) {
            debug!(target_id = item.target(), "render already pending");
            return false;
        }
        let key = item.dedupe_key();
        match self.inner.tx.try_send(item) {
            Ok(()) => true,
            Err(_) => {
                self.inner.pending.lock().remove(&key);
                debug!(target_id = %key.0, "render queue is closed");
                false
            }
        }
    }

    /// Wait for the next item; `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<QueueItem> {
        let item = self.inner.rx.recv().await.ok()?;
        if self.inner.dedupe {
            self.inner.pending.lock().remove(&item.dedupe_key());
        }
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }

    pub fn close(&self) {
        self.inner.tx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }

    /// Run `fut` with this queue as the current one.
    pub fn scope<F: Future>(&self, fut: F) -> impl Future<Output = F::Output> {
        CURRENT_QUEUE.scope(self.clone(), fut)
    }

    /// The queue installed on the current task, if any.
    pub fn current() -> Option<RenderQueue> {
        CURRENT_QUEUE.try_with(Clone::clone).ok()
    }
}

/// Put `item` on the current task's queue.
pub fn enqueue(item: QueueItem) -> bool {
    match RenderQueue::current() {
        Some(queue) => queue.put(item),
        None => {
            warn!(target_id = item.target(), "no render queue on this task, update dropped");
            false
        }
    }
}
