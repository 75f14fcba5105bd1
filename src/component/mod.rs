//! Components: reusable render units that re-render when their models change.

pub mod document;
pub mod page;
pub mod suspense;
pub mod widgets;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::element::{element, Classes, ElementBuilder, On, Tag};
use crate::error::Result;
use crate::live::queue::{enqueue, QueueItem};
use crate::reactive::{ReactiveModel, Signal};
use crate::render;

pub use document::Document;
pub use page::{Page, PAGE_ID};
pub use suspense::Suspense;

/// Prefix of generated component ids.
pub const COMPONENT_ID_PREFIX: &str = "cid-";

/// The element id of a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId(String);

impl ComponentId {
    /// A fresh `cid-xxxxxxxx` id.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", COMPONENT_ID_PREFIX, &uuid[..8]))
    }

    /// An explicit id, kept as given.
    pub fn fixed(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of UI with its own root element.
///
/// Implementors provide an id and `render`, which calls element builders to
/// produce the children of the root. The root itself is opened by
/// [`add`](Component::add).
pub trait Component: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn render(&self) -> Result<()>;

    fn tag(&self) -> Tag {
        Tag::Component
    }

    fn classes(&self) -> Classes {
        Classes::new()
    }

    fn attributes(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Event bindings on the root element.
    fn events(&self) -> Vec<On> {
        Vec::new()
    }

    /// Called once by [`mount`], after the id is assigned.
    fn initialize(self: &Arc<Self>) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Render into the active context, wrapped in the component root.
    fn add(&self) -> Result<()> {
        component_root(self).children(|| self.render())
    }
}

/// Builder for the root element of `component`.
///
/// Under a live session the root carries `hx-swap-oob="morph"` so the client
/// morphs it in place.
pub fn component_root<C: Component + ?Sized>(component: &C) -> ElementBuilder {
    let mut root = element(component.tag())
        .id(component.id())
        .classes(component.classes())
        .attrs(component.attributes());
    for on in component.events() {
        root = root.on(on.event, on.handler);
    }
    if render::current_session().is_some() {
        root = root.attr("hx-swap-oob", "morph");
    }
    root
}

/// Share `component` and run its `initialize` hook.
pub fn mount<C: Component>(component: C) -> Result<Arc<C>> {
    let component = Arc::new(component);
    component.initialize()?;
    Ok(component)
}

/// Re-render when reactive state changes.
pub trait Bindable {
    /// Re-render after every effector call of `model`.
    fn bind(&self, model: &dyn ReactiveModel);

    /// Re-render after every notified change of `signal`.
    fn watch<T: Clone + Send + Sync + 'static>(&self, signal: &Signal<T>);
}

impl<C: Component> Bindable for Arc<C> {
    fn bind(&self, model: &dyn ReactiveModel) {
        for effector in model.effectors() {
            let weak = Arc::downgrade(self);
            effector.subscribe(move || {
                let weak = weak.clone();
                async move {
                    if let Some(component) = weak.upgrade() {
                        enqueue(QueueItem::Component(component));
                    }
                    Ok(())
                }
            });
        }
    }

    fn watch<T: Clone + Send + Sync + 'static>(&self, signal: &Signal<T>) {
        let weak = Arc::downgrade(self);
        signal.subscribe(move || {
            let weak = weak.clone();
            async move {
                if let Some(component) = weak.upgrade() {
                    enqueue(QueueItem::Component(component));
                }
                Ok(())
            }
        });
    }
}
