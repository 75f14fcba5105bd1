//! The page: root component of a route, owner of the render queue.

use std::sync::Arc;

use super::Component;
use crate::element::Tag;
use crate::error::Result;
use crate::live::queue::RenderQueue;

/// Element id of the page container.
pub const PAGE_ID: &str = "schorle-page";

/// Wraps the root component of a route as `<div id="schorle-page">`.
pub struct Page {
    root: Arc<dyn Component>,
    queue: RenderQueue,
}

impl Page {
    pub fn new(root: Arc<dyn Component>) -> Self {
        Self {
            root,
            queue: RenderQueue::default(),
        }
    }

    /// Collapse duplicate pending renders of the same component.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.queue = RenderQueue::new(dedupe);
        self
    }

    pub fn root(&self) -> &Arc<dyn Component> {
        &self.root
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }
}

impl Component for Page {
    fn id(&self) -> &str {
        PAGE_ID
    }

    fn tag(&self) -> Tag {
        Tag::Div
    }

    fn render(&self) -> Result<()> {
        self.root.add()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentId;
    use crate::element::p;
    use crate::render::render;
    use pretty_assertions::assert_eq;

    struct Hello(ComponentId);

    impl Component for Hello {
        fn id(&self) -> &str {
            self.0.as_str()
        }

        fn render(&self) -> Result<()> {
            p().text("hello")
        }
    }

    #[test]
    fn test_page_wraps_root() {
        let page = Page::new(Arc::new(Hello(ComponentId::fixed("hello"))));
        let html = render(None, || page.add()).unwrap();
        assert_eq!(
            html,
            r#"<div id="schorle-page"><schorle-component id="hello"><p>hello</p></schorle-component></div>"#
        );
        assert!(page.queue().is_empty());
    }
}
