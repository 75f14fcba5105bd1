//! The element tree and its declarative builders.
//!
//! Builders attach to the current parent of the active rendering context:
//!
//! ```ignore
//! div().classes("card").children(|| {
//!     h1().text("Counter")?;
//!     button().on("click", &model.effector("increment")?).text("Click me")
//! })?;
//! ```

pub mod builders;
pub mod classes;
pub mod tag;

use std::fmt::Display;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::Result;
use crate::live::handler::Handler;
use crate::reactive::Signal;
use crate::render::{self, ScopeGuard};

pub use builders::*;
pub use classes::Classes;
pub use tag::Tag;

/// An event binding: client `event` fires `handler` on the server.
#[derive(Debug, Clone)]
pub struct On {
    pub event: String,
    pub handler: Handler,
}

/// Two-way binding of an element property to a signal.
#[derive(Debug, Clone)]
pub struct Bind {
    pub property: String,
    /// Sets the signal from the value the client sends on `input`.
    pub handler: Handler,
}

/// A node of the server-side element tree.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    pub id: Option<String>,
    pub classes: Classes,
    pub style: IndexMap<String, String>,
    pub attrs: IndexMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
    pub on: Vec<On>,
    pub bind: Option<Bind>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Classes::new(),
            style: IndexMap::new(),
            attrs: IndexMap::new(),
            text: None,
            children: Vec::new(),
            on: Vec::new(),
            bind: None,
        }
    }

    /// Every `(event, handler)` pair, two-way bindings included.
    pub fn event_bindings(&self) -> Vec<(&str, &Handler)> {
        let mut bindings: Vec<(&str, &Handler)> = self
            .on
            .iter()
            .map(|on| (on.event.as_str(), &on.handler))
            .collect();
        if let Some(bind) = &self.bind {
            bindings.push(("input", &bind.handler));
        }
        bindings
    }

    pub fn has_event_bindings(&self) -> bool {
        !self.on.is_empty() || self.bind.is_some()
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Fluent builder for one element.
///
/// Nothing is attached until one of the terminal operations runs:
/// [`add`](Self::add), [`children`](Self::children) or [`text`](Self::text).
#[must_use = "builders attach nothing until add(), children() or text() is called"]
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    element: Element,
}

impl ElementBuilder {
    pub fn new(tag: Tag) -> Self {
        Self {
            element: Element::new(tag),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.element.id = Some(id.into());
        self
    }

    pub fn classes(mut self, classes: impl Into<Classes>) -> Self {
        self.element.classes.append(classes);
        self
    }

    pub fn style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.element.style.insert(key.into(), value.into());
        self
    }

    /// Free-form attribute. `_` in keys becomes `-` when serialized.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.element.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attrs<K, V>(mut self, attrs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in attrs {
            self.element.attrs.insert(key.into(), value.into());
        }
        self
    }

    pub fn on(mut self, event: impl Into<String>, handler: impl Into<Handler>) -> Self {
        self.element.on.push(On {
            event: event.into(),
            handler: handler.into(),
        });
        self
    }

    /// Bind `property` to `signal`: the current value is rendered now and
    /// client `input` events write back into the signal.
    pub fn bind<T>(mut self, property: impl Into<String>, signal: &Signal<T>) -> Self
    where
        T: Clone + Display + FromStr + Send + Sync + 'static,
        T::Err: Display,
    {
        let property = property.into();
        self.element
            .attrs
            .insert(property.clone(), signal.get().to_string());
        self.element.bind = Some(Bind {
            property,
            handler: signal.input_handler(),
        });
        self
    }

    /// Attach to the current parent without opening a scope.
    pub fn add(self) -> Result<()> {
        render::with_context(|ctx| ctx.attach(self.element))
    }

    /// Attach with text content.
    pub fn text(mut self, value: impl Display) -> Result<()> {
        self.element.text = Some(value.to_string());
        self.add()
    }

    /// Open a scope: builders called inside `body` become children.
    ///
    /// The scope is closed on every exit path, including errors and panics.
    pub fn children<F>(self, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        render::with_context(|ctx| ctx.push(self.element))?;
        let guard = ScopeGuard::new();
        let result = body();
        guard.close()?;
        result
    }

    /// Take the element without attaching it.
    pub fn build(self) -> Element {
        self.element
    }
}

impl From<Element> for ElementBuilder {
    fn from(element: Element) -> Self {
        Self { element }
    }
}

/// Write `value` into the text slot of the current parent.
pub fn text(value: impl Display) -> Result<()> {
    let value = value.to_string();
    render::with_context(move |ctx| ctx.set_text(value))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::render::render;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_outside_context_fails() {
        assert!(matches!(text("x"), Err(Error::NoRenderingContext)));
        assert!(matches!(div().add(), Err(Error::NoRenderingContext)));
    }

    #[test]
    fn test_nested_scopes_build_tree() {
        let html = render(None, || {
            div().id("outer").children(|| {
                span().text("a")?;
                p().children(|| text("b"))
            })
        })
        .unwrap();
        assert_eq!(
            html,
            r#"<div id="outer"><span>a</span><p>b</p></div>"#
        );
    }

    #[test]
    fn test_scope_closes_on_error() {
        let html = render(None, || {
            let failed = div().id("a").children(|| {
                span().add()?;
                Err(Error::handler("boom"))
            });
            assert!(failed.is_err());
            // Sibling of the failed scope, not its child.
            p().id("b").add()
        })
        .unwrap();
        assert_eq!(html, r#"<div id="a"><span></span></div><p id="b"></p>"#);
    }

    #[test]
    fn test_build_does_not_attach() {
        let element = div().id("x").classes("a b").attr("data_role", "main").build();
        assert_eq!(element.id.as_deref(), Some("x"));
        assert_eq!(element.classes.render(), "a b");
        assert_eq!(element.attrs.get("data_role").map(String::as_str), Some("main"));
        let html = render(None, || Ok(())).unwrap();
        assert_eq!(html, "");
    }

    #[test]
    fn test_bind_snapshots_value() {
        let signal = Signal::new("hello".to_string());
        let element = input_().bind("value", &signal).build();
        assert_eq!(element.attrs.get("value").map(String::as_str), Some("hello"));
        assert!(element.has_event_bindings());
        assert_eq!(element.event_bindings()[0].0, "input");
    }
}
