//! Schorle: a server-driven UI framework.
//!
//! Pages are trees of components rendered to HTML on the server. Client
//! events travel over a WebSocket to registered handlers; handlers update
//! signals and models, bound components re-render and the fresh markup is
//! morphed into the browser.
//!
//! # Layers
//!
//! - **element / render**: element builders that attach to a task-local
//!   rendering context, and the HTML serializer
//! - **reactive**: `Signal`, `Effector` and `Model`
//! - **component**: the `Component` trait, pages and the document shell
//! - **live**: sessions, the handler registry, the render queue and the
//!   events socket
//! - **serve**: the hyper HTTP server

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::let_underscore_future)]

pub mod component;
pub mod config;
pub mod element;
pub mod error;
pub mod live;
pub mod logging;
pub mod reactive;
pub mod render;
pub mod serve;

pub use component::{mount, Bindable, Component, ComponentId, Document, Page, Suspense};
pub use config::{RunningMode, Settings};
pub use element::{text, Classes, Element, ElementBuilder, Tag};
pub use error::{Error, Result};
pub use live::{Handler, Session, SessionManager};
pub use reactive::{when, Effector, Model, ReactiveModel, Signal, State};
pub use render::{render, render_tree};
pub use serve::App;
