//! Live sessions: handler registry, wire protocol, render queue and the
//! events socket.
//!
//! A page GET creates a [`Session`]; the client then opens the events socket
//! with the session cookie. Client events run registered handlers, bound
//! components enqueue themselves, and the emitter streams `morph` frames back.

pub mod emitter;
pub mod handler;
pub mod message;
pub mod queue;
pub mod session;
pub mod socket;

pub use emitter::{render_item, spawn_emitter};
pub use handler::{Handler, HandlerTable};
pub use message::{Action, ClientMessage, ServerMessage};
pub use queue::{enqueue, QueueItem, RenderQueue};
pub use session::{Session, SessionManager, SessionStatus};
pub use socket::{accept_session, extract_cookie, serve_socket, session_cookie};
