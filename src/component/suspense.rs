//! Loading states while effectors run.

use std::sync::Arc;

use super::Component;
use crate::live::queue::{enqueue, QueueItem};
use crate::reactive::ReactiveModel;

/// Shows a fallback inside a component while any effector of a model runs.
///
/// Each effector gets a pre-action that enqueues the fallback render, so the
/// client sees it before the effector body starts. The bound component's own
/// re-render replaces it once the body is done.
#[derive(Clone)]
pub struct Suspense {
    fallback: Arc<dyn Component>,
}

impl Suspense {
    pub fn new(fallback: Arc<dyn Component>) -> Self {
        Self { fallback }
    }

    pub fn attach<C: Component>(&self, component: &Arc<C>, model: &dyn ReactiveModel) {
        for effector in model.effectors() {
            let weak = Arc::downgrade(component);
            let fallback = self.fallback.clone();
            effector.prepend(move || {
                let weak = weak.clone();
                let fallback = fallback.clone();
                async move {
                    if let Some(component) = weak.upgrade() {
                        enqueue(QueueItem::Fallback {
                            component,
                            fallback,
                        });
                    }
                    Ok(())
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::widgets::Loading;
    use crate::component::{mount, Bindable, ComponentId};
    use crate::element::p;
    use crate::error::Result;
    use crate::live::queue::RenderQueue;
    use crate::reactive::Model;

    struct Report {
        id: ComponentId,
    }

    impl Component for Report {
        fn id(&self) -> &str {
            self.id.as_str()
        }

        fn render(&self) -> Result<()> {
            p().text("report")
        }
    }

    #[tokio::test]
    async fn test_fallback_is_queued_before_rerender() {
        let model = Model::new(()).with_effector("refresh", |_, _| async { Ok(()) });
        let report = mount(Report {
            id: ComponentId::new(),
        })
        .unwrap();
        report.bind(&model);
        Suspense::new(Arc::new(Loading::new())).attach(&report, &model);

        let queue = RenderQueue::new(false);
        queue.scope(model.call("refresh", None)).await.unwrap();

        let first = queue.next().await.unwrap();
        let second = queue.next().await.unwrap();
        assert!(matches!(first, QueueItem::Fallback { .. }));
        assert!(matches!(second, QueueItem::Component(_)));
        assert_eq!(first.target(), report.id());
        assert_eq!(second.target(), report.id());
    }
}
