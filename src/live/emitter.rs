//! The per-session render loop.
//!
//! Drains the page's render queue, renders each item in a fresh context and
//! pushes the result as a `morph` frame. Any render or send failure ends the
//! loop and removes the session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::component::{component_root, Component};
use crate::error::Result;
use crate::live::message::ServerMessage;
use crate::live::queue::QueueItem;
use crate::live::session::{Session, SessionManager};
use crate::render::render;

/// Render one queue item into the frame that updates it on the client.
pub fn render_item(session: &Arc<Session>, item: &QueueItem) -> Result<ServerMessage> {
    let html = match item {
        QueueItem::Component(component) => render(Some(session.clone()), || component.add())?,
        QueueItem::Fallback {
            component,
            fallback,
        } => render(Some(session.clone()), || {
            component_root(component.as_ref()).children(|| fallback.add())
        })?,
    };
    Ok(ServerMessage::morph(item.target(), html))
}

/// Run until the queue closes or a frame cannot be produced or delivered.
pub async fn run(manager: Arc<SessionManager>, session: Arc<Session>) {
    let Some(page) = session.page() else {
        error!(session_id = %session.id(), "emitter started for a session without a page");
        return;
    };
    let queue = page.queue().clone();

    while let Some(item) = queue.next().await {
        let outcome = render_item(&session, &item).and_then(|message| session.send(&message));
        match outcome {
            Ok(()) => debug!(session_id = %session.id(), target_id = item.target(), "morph sent"),
            Err(e) => {
                error!(
                    session_id = %session.id(),
                    target_id = item.target(),
                    error = %e,
                    "render loop stopped"
                );
                break;
            }
        }
    }

    manager.remove_session(session.id());
}

/// Start the render loop of `session` in the background.
pub fn spawn_emitter(manager: Arc<SessionManager>, session: Arc<Session>) -> JoinHandle<()> {
    let handle = tokio::spawn(run(manager, session.clone()));
    session.set_emitter(handle.abort_handle());
    handle
}
