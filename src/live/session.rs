//! Per-client sessions and the process-wide session map.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};
use tungstenite::Message;
use uuid::Uuid;

use crate::component::Page;
use crate::error::{Error, Result};
use crate::live::handler::{Handler, HandlerTable};
use crate::live::message::{ClientMessage, ServerMessage};

/// Prefix of every session id.
pub const SESSION_ID_PREFIX: &str = "sle-";

/// Lifecycle of a session: `New -> Connected -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    New,
    Connected,
    Closed,
}

struct SessionInner {
    status: SessionStatus,
    handlers: HandlerTable,
    tasks: Vec<JoinHandle<()>>,
    outbound: Option<async_channel::Sender<Message>>,
    page: Option<Arc<Page>>,
    emitter: Option<AbortHandle>,
}

/// One browser tab: its handler table, live socket and in-flight handlers.
pub struct Session {
    id: String,
    inner: Mutex<SessionInner>,
    state: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: format!("{}{}", SESSION_ID_PREFIX, Uuid::new_v4()),
            inner: Mutex::new(SessionInner {
                status: SessionStatus::New,
                handlers: HandlerTable::new(),
                tasks: Vec::new(),
                outbound: None,
                page: None,
                emitter: None,
            }),
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == SessionStatus::Connected
    }

    /// Register `handler`, returning the id it already has if any.
    pub fn register_handler(&self, handler: &Handler) -> String {
        self.inner.lock().handlers.register(handler)
    }

    pub fn handler(&self, handler_id: &str) -> Option<Handler> {
        self.inner.lock().handlers.get(handler_id)
    }

    pub fn handler_id_of(&self, handler: &Handler) -> Option<String> {
        self.inner
            .lock()
            .handlers
            .id_of(handler)
            .map(str::to_string)
    }

    pub fn handler_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    pub fn attach_page(&self, page: Arc<Page>) {
        self.inner.lock().page = Some(page);
    }

    pub fn page(&self) -> Option<Arc<Page>> {
        self.inner.lock().page.clone()
    }

    /// Bind the outbound socket channel. A session connects at most once.
    pub fn connect(&self, outbound: async_channel::Sender<Message>) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.status {
            SessionStatus::New => {
                inner.status = SessionStatus::Connected;
                inner.outbound = Some(outbound);
                info!(session_id = %self.id, "session connected");
                Ok(())
            }
            SessionStatus::Connected => Err(Error::SessionAlreadyConnected(self.id.clone())),
            SessionStatus::Closed => Err(Error::SessionMissing),
        }
    }

    pub(crate) fn set_emitter(&self, emitter: AbortHandle) {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.emitter.replace(emitter) {
            previous.abort();
        }
    }

    /// Encode and queue a frame on the socket.
    pub fn send(&self, message: &ServerMessage) -> Result<()> {
        let bytes = message.encode()?;
        let outbound = self
            .inner
            .lock()
            .outbound
            .clone()
            .ok_or_else(|| Error::Io(format!("session '{}' has no live socket", self.id)))?;
        outbound
            .try_send(Message::binary(bytes))
            .map_err(|_| Error::Io(format!("socket of session '{}' is closed", self.id)))
    }

    pub fn morph(&self, target: &str, html: impl Into<String>) -> Result<()> {
        self.send(&ServerMessage::morph(target, html))
    }

    pub fn send_render(
        &self,
        target: &str,
        payload: Vec<u8>,
        meta: Option<serde_json::Value>,
    ) -> Result<()> {
        self.send(&ServerMessage::render(target, payload, meta))
    }

    /// Run the handler a client event refers to.
    ///
    /// Unknown ids are ignored. The handler runs as its own task with the
    /// page's render queue installed; a failing handler is logged and the
    /// session stays up. Returns whether a task was started.
    pub fn dispatch(&self, message: ClientMessage) -> bool {
        let Some(handler) = self.handler(&message.handler_id) else {
            debug!(
                session_id = %self.id,
                handler_id = %message.handler_id,
                "ignoring event for unknown handler"
            );
            return false;
        };

        let session_id = self.id.clone();
        let handler_id = message.handler_id;
        let value = message.value;
        let run = async move {
            if let Err(e) = handler.call(value).await {
                warn!(%session_id, %handler_id, error = %e, "event handler failed");
            }
        };

        let task = match self.page() {
            Some(page) => tokio::spawn(page.queue().scope(run)),
            None => tokio::spawn(run),
        };

        let mut inner = self.inner.lock();
        inner.tasks.retain(|task| !task.is_finished());
        inner.tasks.push(task);
        true
    }

    /// Handler tasks still running.
    pub fn pending_tasks(&self) -> usize {
        self.inner
            .lock()
            .tasks
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Per-session instance of `T`, created by `init` on first use.
    pub fn state<T, F>(&self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let mut state = self.state.lock();
        if let Some(existing) = state.get(&TypeId::of::<T>()) {
            if let Ok(value) = existing.clone().downcast::<T>() {
                return value;
            }
        }
        let value = Arc::new(init());
        state.insert(TypeId::of::<T>(), value.clone());
        value
    }

    /// Cancel handler tasks, stop the emitter, close the socket and release
    /// every handler id.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        self.shutdown(&mut inner);
    }

    /// Close the session only if no socket ever connected to it.
    ///
    /// The check and the transition happen under one lock, so a socket that
    /// connects concurrently either wins or is refused.
    pub fn expire_unconnected(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.status != SessionStatus::New {
            return false;
        }
        self.shutdown(&mut inner);
        true
    }

    fn shutdown(&self, inner: &mut SessionInner) {
        if inner.status == SessionStatus::Closed {
            return;
        }
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        if let Some(emitter) = inner.emitter.take() {
            emitter.abort();
        }
        if let Some(outbound) = inner.outbound.take() {
            let _ = outbound.try_send(Message::Close(None));
            outbound.close();
        }
        if let Some(page) = &inner.page {
            page.queue().close();
        }
        inner.handlers.clear();
        inner.status = SessionStatus::Closed;
        info!(session_id = %self.id, "session closed");
    }
}

/// All sessions of the process, keyed by session id.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .insert(session.id().to_string(), session.clone());
        debug!(session_id = %session.id(), "session created");
        session
    }

    pub fn get_session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Drop the session and close it. Removing an unknown id is a no-op.
    pub fn remove_session(&self, session_id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.write().remove(session_id);
        if let Some(session) = &removed {
            session.close();
        }
        removed
    }

    /// Remove the session if it is still waiting for its socket.
    pub fn expire_if_unconnected(&self, session_id: &str) -> bool {
        let Some(session) = self.get_session(session_id) else {
            return false;
        };
        if !session.expire_unconnected() {
            return false;
        }
        self.sessions.write().remove(session_id);
        info!(session_id, "session evicted, socket never connected");
        true
    }

    /// Evict `session_id` after `timeout` unless its socket connected.
    pub fn spawn_connect_deadline(
        self: &Arc<Self>,
        session_id: &str,
        timeout: Duration,
    ) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(manager) = manager.upgrade() {
                manager.expire_if_unconnected(&session_id);
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
