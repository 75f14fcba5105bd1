//! Conditional class selection.

use crate::element::Classes;
use crate::reactive::Signal;

/// Start a conditional on the current value of `condition`.
pub fn when(condition: &Signal<bool>) -> When {
    When {
        condition: condition.get(),
        then: Classes::new(),
        otherwise: Classes::new(),
    }
}

/// Classes picked by a boolean signal at render time.
#[derive(Debug, Clone)]
pub struct When {
    condition: bool,
    then: Classes,
    otherwise: Classes,
}

impl When {
    pub fn then(mut self, classes: impl Into<Classes>) -> Self {
        self.then = classes.into();
        self
    }

    pub fn otherwise(mut self, classes: impl Into<Classes>) -> Self {
        self.otherwise = classes.into();
        self
    }

    pub fn resolve(self) -> Classes {
        if self.condition {
            self.then
        } else {
            self.otherwise
        }
    }
}

impl From<When> for Classes {
    fn from(when: When) -> Self {
        when.resolve()
    }
}
