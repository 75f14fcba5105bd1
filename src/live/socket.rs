//! The events WebSocket: accepts a session, dispatches client events and
//! forwards server frames.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::CloseFrame;
use tungstenite::Message;

use crate::error::{Error, Result};
use crate::live::emitter::spawn_emitter;
use crate::live::message::ClientMessage;
use crate::live::session::{Session, SessionManager};

/// Extract a cookie value from a `Cookie` header.
pub fn extract_cookie(header: Option<&str>, name: &str) -> Option<String> {
    header?.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// `Set-Cookie` value binding the browser to `session_id`.
pub fn session_cookie(name: &str, session_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, session_id)
}

/// Attach a socket's outbound channel to the session named by the cookie.
///
/// Fails if the cookie is absent, names no live session, or the session
/// already has a socket.
pub fn accept_session(
    manager: &SessionManager,
    session_id: Option<&str>,
    outbound: async_channel::Sender<Message>,
) -> Result<Arc<Session>> {
    let session = session_id
        .and_then(|id| manager.get_session(id))
        .ok_or(Error::SessionMissing)?;
    session.connect(outbound)?;
    Ok(session)
}

/// Serve one events socket until either side closes it.
///
/// On exit the session is removed, which cancels its handler tasks.
pub async fn serve_socket<S>(
    mut stream: WebSocketStream<S>,
    manager: Arc<SessionManager>,
    session_id: Option<String>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = async_channel::unbounded::<Message>();
    let session = match accept_session(&manager, session_id.as_deref(), tx) {
        Ok(session) => session,
        Err(e) => {
            warn!(session_id = ?session_id, error = %e, "rejecting events socket");
            let frame = CloseFrame {
                code: CloseCode::Policy,
                reason: e.to_string().into(),
            };
            if let Err(e) = stream.close(Some(frame)).await {
                debug!(error = %e, "failed to close rejected socket");
            }
            return;
        }
    };
    info!(session_id = %session.id(), "events socket opened");

    let (mut ws_write, mut ws_read) = stream.split();

    let writer = tokio::spawn(async move {
        while let Ok(message) = rx.recv().await {
            let closing = message.is_close();
            if ws_write.send(message).await.is_err() || closing {
                break;
            }
        }
        let _ = ws_write.close().await;
    });

    spawn_emitter(manager.clone(), session.clone());

    while let Some(frame) = ws_read.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_frame(&session, text.as_bytes()),
            Ok(Message::Binary(bytes)) => handle_frame(&session, &bytes),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(session_id = %session.id(), error = %e, "events socket read failed");
                break;
            }
        }
        if !session.is_connected() {
            break;
        }
    }

    manager.remove_session(session.id());
    let _ = writer.await;
    info!(session_id = %session.id(), "events socket closed");
}

fn handle_frame(session: &Session, raw: &[u8]) {
    if !session.is_connected() {
        return;
    }
    match ClientMessage::parse(raw) {
        Ok(message) => {
            session.dispatch(message);
        }
        Err(e) => warn!(session_id = %session.id(), error = %e, "dropping malformed client frame"),
    }
}
