//! The task-local rendering context.
//!
//! A render installs a fresh context for the current task, runs the user
//! closure (which calls element builders), then serializes what was built.
//! Rendering never suspends, so the context lives in a synchronous scope and
//! concurrent sessions on the same runtime never observe each other's trees.

pub mod html;

use std::cell::RefCell;
use std::sync::Arc;

use crate::element::{Element, Tag};
use crate::error::{Error, Result};
use crate::live::session::Session;

tokio::task_local! {
    static RENDERING_CONTEXT: RefCell<RenderingContext>;
}

/// Builder target for one render.
///
/// The bottom of the stack is a synthetic root element; the top is the
/// current parent.
pub struct RenderingContext {
    stack: Vec<Element>,
    session: Option<Arc<Session>>,
}

impl RenderingContext {
    fn new(session: Option<Arc<Session>>) -> Self {
        Self {
            stack: vec![Element::new(Tag::Root)],
            session,
        }
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn current(&mut self) -> &mut Element {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    pub fn attach(&mut self, element: Element) {
        self.current().children.push(element);
    }

    pub fn push(&mut self, element: Element) {
        self.stack.push(element);
    }

    /// Close the innermost scope, attaching it to its parent.
    pub fn pop(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(Error::malformed("closing a scope that was never opened"));
        }
        if let Some(element) = self.stack.pop() {
            self.attach(element);
        }
        Ok(())
    }

    /// Fill the text slot of the current parent.
    ///
    /// Fails when no element scope is open, since the synthetic root never
    /// serializes its own text.
    pub fn set_text(&mut self, value: String) -> Result<()> {
        let current = self.current();
        if current.tag.is_synthetic() {
            return Err(Error::malformed("text() called outside any element scope"));
        }
        current.text = Some(value);
        Ok(())
    }

    fn into_root(mut self) -> Result<Element> {
        if self.stack.len() != 1 {
            return Err(Error::malformed(format!(
                "{} scope(s) left open at the end of render",
                self.stack.len() - 1
            )));
        }
        self.stack
            .pop()
            .ok_or_else(|| Error::malformed("rendering context lost its root"))
    }
}

/// Run `f` against the active rendering context.
pub fn with_context<R>(f: impl FnOnce(&mut RenderingContext) -> R) -> Result<R> {
    RENDERING_CONTEXT
        .try_with(|cell| {
            let mut ctx = cell
                .try_borrow_mut()
                .map_err(|_| Error::malformed("rendering context is already in use"))?;
            Ok(f(&mut ctx))
        })
        .map_err(|_| Error::NoRenderingContext)?
}

/// Whether a rendering context is active on this task.
pub fn is_rendering() -> bool {
    RENDERING_CONTEXT.try_with(|_| ()).is_ok()
}

/// The session of the active render, if any.
pub fn current_session() -> Option<Arc<Session>> {
    with_context(|ctx| ctx.session.clone()).ok().flatten()
}

/// Closes the scope it was created for, on every exit path.
pub(crate) struct ScopeGuard {
    depth: usize,
    closed: bool,
}

impl ScopeGuard {
    pub(crate) fn new() -> Self {
        Self {
            depth: with_context(|ctx| ctx.depth()).unwrap_or(0),
            closed: false,
        }
    }

    pub(crate) fn close(mut self) -> Result<()> {
        self.closed = true;
        self.unwind()
    }

    fn unwind(&self) -> Result<()> {
        with_context(|ctx| {
            while ctx.depth() >= self.depth && ctx.depth() > 1 {
                ctx.pop()?;
            }
            Ok(())
        })?
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.unwind();
        }
    }
}

/// Build a tree with `f` and return it without serializing.
pub fn render_tree<F>(session: Option<Arc<Session>>, f: F) -> Result<Element>
where
    F: FnOnce() -> Result<()>,
{
    RENDERING_CONTEXT.sync_scope(RefCell::new(RenderingContext::new(session)), || {
        f()?;
        let ctx = RENDERING_CONTEXT.with(|cell| {
            cell.replace(RenderingContext::new(None))
        });
        ctx.into_root()
    })
}

/// Render `f` into HTML.
///
/// With a session, event bindings are registered in its handler table and
/// emitted as `sle-on`; without one they are dropped with a warning.
pub fn render<F>(session: Option<Arc<Session>>, f: F) -> Result<String>
where
    F: FnOnce() -> Result<()>,
{
    let root = render_tree(session.clone(), f)?;
    html::to_html(&root, session.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{div, span, text};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_context_outside_render() {
        assert!(!is_rendering());
        assert!(current_session().is_none());
        assert!(matches!(
            with_context(|ctx| ctx.depth()),
            Err(Error::NoRenderingContext)
        ));
    }

    #[test]
    fn test_text_under_root_is_rejected() {
        let err = render(None, || text("lost")).unwrap_err();
        assert!(matches!(err, Error::MalformedElement { .. }));

        let html = render(None, || div().children(|| text("kept"))).unwrap();
        assert_eq!(html, "<div>kept</div>");
    }

    #[test]
    fn test_tree_is_returned_under_root() {
        let root = render_tree(None, || {
            div().id("a").children(|| span().text("x"))
        })
        .unwrap();
        assert_eq!(root.tag, Tag::Root);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.find("a").unwrap().children[0].text.as_deref(), Some("x"));
    }

    #[test]
    fn test_nested_render_is_isolated() {
        let html = render(None, || {
            div().id("outer").children(|| {
                let inner = render(None, || span().text("inner")).unwrap();
                assert_eq!(inner, "<span>inner</span>");
                text("outer text")
            })
        })
        .unwrap();
        assert_eq!(html, r#"<div id="outer">outer text</div>"#);
    }

    #[tokio::test]
    async fn test_concurrent_tasks_do_not_share_context() {
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                tokio::spawn(async move {
                    render(None, || div().id(format!("d{}", i)).text(i)).unwrap()
                })
            })
            .collect();
        for (i, task) in tasks.into_iter().enumerate() {
            assert_eq!(task.await.unwrap(), format!(r#"<div id="d{}">{}</div>"#, i, i));
        }
    }
}
