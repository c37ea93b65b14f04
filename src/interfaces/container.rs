use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::containers::basic::Container;
use crate::error::ContainerError;
use crate::function::{Invocable, Service};

/// Registers a group of related entries in one go.
pub trait Provider {
    fn register(&self, container: &Container);
}

impl<F> Provider for F
where
    F: Fn(&Container),
{
    fn register(&self, container: &Container) {
        self(container)
    }
}

/// What is stored under a container key.
#[derive(Clone)]
pub enum Entry {
    /// Returned as-is on resolution.
    Value(Service),
    /// Invoked on first resolution, result memoized.
    Shared(Invocable),
    /// Invoked on every resolution.
    Factory(Invocable),
    /// Never invoked; resolution yields the invocable itself, memoized.
    Protected(Invocable),
    /// Marked both protected and factory: yields the invocable itself, never memoized.
    ProtectedFactory(Invocable),
}

impl Entry {
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Entry::Value(Arc::new(value))
    }

    pub fn service<F, T>(f: F) -> Self
    where
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Entry::Shared(Invocable::new(f))
    }

    pub fn invocable(&self) -> Option<&Invocable> {
        match self {
            Entry::Value(_) => None,
            Entry::Shared(f)
            | Entry::Factory(f)
            | Entry::Protected(f)
            | Entry::ProtectedFactory(f) => Some(f),
        }
    }

    pub fn into_invocable(self) -> Option<Invocable> {
        match self {
            Entry::Value(_) => None,
            Entry::Shared(f)
            | Entry::Factory(f)
            | Entry::Protected(f)
            | Entry::ProtectedFactory(f) => Some(f),
        }
    }

    pub fn is_invocable(&self) -> bool {
        self.invocable().is_some()
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Entry::Factory(_) | Entry::ProtectedFactory(_))
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Entry::Protected(_) | Entry::ProtectedFactory(_))
    }
}

impl From<Invocable> for Entry {
    fn from(f: Invocable) -> Self {
        Entry::Shared(f)
    }
}

impl From<Service> for Entry {
    fn from(value: Service) -> Self {
        Entry::Value(value)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Value(_) => f.write_str("Value(..)"),
            Entry::Shared(inner) => f.debug_tuple("Shared").field(inner).finish(),
            Entry::Factory(inner) => f.debug_tuple("Factory").field(inner).finish(),
            Entry::Protected(inner) => f.debug_tuple("Protected").field(inner).finish(),
            Entry::ProtectedFactory(inner) => {
                f.debug_tuple("ProtectedFactory").field(inner).finish()
            }
        }
    }
}
