//! Reactive models: shared state plus named effectors.

use std::future::Future;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Effector;
use crate::error::{Error, Result};

/// Anything a component can bind to.
pub trait ReactiveModel: Send + Sync {
    /// Every effector whose completion should trigger a re-render.
    fn effectors(&self) -> Vec<Effector>;
}

impl ReactiveModel for Effector {
    fn effectors(&self) -> Vec<Effector> {
        vec![self.clone()]
    }
}

impl<M: ReactiveModel + ?Sized> ReactiveModel for Arc<M> {
    fn effectors(&self) -> Vec<Effector> {
        (**self).effectors()
    }
}

/// Shared, lock-protected state handed to effector bodies.
pub struct State<S> {
    inner: Arc<RwLock<S>>,
}

impl<S> Clone for State<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> State<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.read())
    }

    /// Mutate in place. Never hold the lock across an await.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl<S: Clone> State<S> {
    pub fn get(&self) -> S {
        self.inner.read().clone()
    }
}

/// A reactive model built from explicit effector registrations.
///
/// ```ignore
/// let counter = Model::new(Counter { count: 0 })
///     .with_effector("increment", |state, _| async move {
///         state.update(|s| s.count += 1);
///         Ok(())
///     });
/// ```
pub struct Model<S> {
    state: State<S>,
    effectors: IndexMap<String, Effector>,
}

impl<S> Clone for Model<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            effectors: self.effectors.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> Model<S> {
    pub fn new(state: S) -> Self {
        Self {
            state: State::new(state),
            effectors: IndexMap::new(),
        }
    }

    /// Register an effector. Re-using a name replaces the earlier one.
    pub fn with_effector<F, Fut>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(State<S>, Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let state = self.state.clone();
        let effector = Effector::new(name, move |arg| body(state.clone(), arg));
        self.effectors.insert(name.to_string(), effector);
        self
    }

    pub fn effector(&self, name: &str) -> Result<Effector> {
        self.effectors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::handler(format!("model has no effector '{}'", name)))
    }

    pub async fn call(&self, name: &str, arg: Option<String>) -> Result<()> {
        self.effector(name)?.call(arg).await
    }

    pub fn state(&self) -> &State<S> {
        &self.state
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effectors.keys().map(String::as_str)
    }
}

impl<S: Send + Sync + 'static> ReactiveModel for Model<S> {
    fn effectors(&self) -> Vec<Effector> {
        self.effectors.values().cloned().collect()
    }
}
