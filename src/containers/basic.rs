use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{ContainerError, NotCallable};
use crate::function::{Arguments, Invocable, Service};
use crate::interfaces::container::{Entry, Provider};

/// String-keyed service container.
///
/// Invocable entries are shared by default: the first resolution is
/// memoized and every later `get` returns the same [`Service`]. Once a key
/// is cached the cache wins, even after `set` or `delete` on that key.
pub struct Container {
    values: DashMap<String, Entry>,
    cache: DashMap<String, Service>,
}

impl Container {
    pub fn new() -> Self {
        Container {
            values: DashMap::new(),
            cache: DashMap::new(),
        }
    }

    /// Seeds the container with initial entries.
    pub fn with_values<I, K, E>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, E)>,
        K: Into<String>,
        E: Into<Entry>,
    {
        let container = Self::new();
        for (key, entry) in values {
            container.set(key, entry);
        }
        container
    }

    pub fn set(&self, key: impl Into<String>, entry: impl Into<Entry>) {
        let key = key.into();
        let entry = entry.into();
        trace!(key = %key, entry = ?entry, "set");
        self.values.insert(key, entry);
    }

    pub fn get(&self, key: &str) -> Result<Service, ContainerError> {
        if let Some(cached) = self.cache.get(key) {
            trace!(key, "resolved from cache");
            return Ok(cached.value().clone());
        }

        // Cloned out so no map guard is held while caller code runs.
        let stored = self.raw(key)?;
        let result = match &stored {
            Entry::Value(value) => value.clone(),
            Entry::Protected(f) | Entry::ProtectedFactory(f) => {
                Arc::new(f.clone()) as Service
            }
            Entry::Shared(f) | Entry::Factory(f) => {
                debug!(key, invocable = ?f, "invoking");
                f.call(self)?
            }
        };

        if !stored.is_factory() {
            self.cache.insert(key.to_string(), result.clone());
        }

        Ok(result)
    }

    /// Resolves `key` and downcasts the result.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, ContainerError> {
        self.get(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes the entry; a memoized result for the key is kept.
    pub fn delete(&self, key: &str) {
        if self.values.remove(key).is_some() {
            trace!(key, "deleted");
        }
    }

    /// Marks an invocable entry so its resolution is never memoized.
    ///
    /// A protected entry stays protected: still returned uninvoked, never cached.
    pub fn factory(&self, entry: impl Into<Entry>) -> Result<Entry, ContainerError> {
        let entry = entry.into();
        let protected = entry.is_protected();
        let f = entry
            .into_invocable()
            .ok_or(ContainerError::NotCallable(NotCallable::Factory))?;
        trace!(invocable = ?f, protected, "marked as factory");
        Ok(if protected {
            Entry::ProtectedFactory(f)
        } else {
            Entry::Factory(f)
        })
    }

    /// Marks an invocable entry so resolution returns it uninvoked.
    ///
    /// A factory entry keeps skipping the cache.
    pub fn protect(&self, entry: impl Into<Entry>) -> Result<Entry, ContainerError> {
        let entry = entry.into();
        let factory = entry.is_factory();
        let f = entry
            .into_invocable()
            .ok_or(ContainerError::NotCallable(NotCallable::Protect))?;
        trace!(invocable = ?f, factory, "marked as protected");
        Ok(if factory {
            Entry::ProtectedFactory(f)
        } else {
            Entry::Protected(f)
        })
    }

    /// The entry exactly as registered, bypassing invocation and the cache.
    pub fn raw(&self, key: &str) -> Result<Entry, ContainerError> {
        self.values
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ContainerError::unknown(key))
    }

    /// Replaces the invocable at `key` with one that feeds its result to `extender`.
    ///
    /// The extender is called with the container and a single argument, the
    /// previous result. See [`Invocable::extender`] for a typed builder.
    pub fn extend(&self, key: &str, extender: impl Into<Entry>) -> Result<Invocable, ContainerError> {
        let original = self
            .raw(key)?
            .into_invocable()
            .ok_or(ContainerError::NotCallable(NotCallable::ExtendedService))?;
        let extender = extender
            .into()
            .into_invocable()
            .ok_or(ContainerError::NotCallable(NotCallable::Factory))?;

        let extended = Invocable::erased(move |container, args| {
            let previous = original.call_with(container, args)?;
            extender.call_with(container, &Arguments::new(vec![previous]))
        });
        trace!(key, "extended");
        self.set(key, extended.clone());

        Ok(extended)
    }

    /// Starts binding an invocable to `dependencies`, resolved in order on every call.
    pub fn bind_callable<I, S>(&self, dependencies: I, registration_key: Option<&str>) -> Binder<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Binder {
            container: self,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            registration_key: registration_key.map(str::to_string),
        }
    }

    pub fn register<P: Provider + ?Sized>(&self, provider: &P) -> &Self {
        provider.register(self);
        self
    }

    /// Keys of the registered entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Entry)> for Container {
    fn from_iter<I: IntoIterator<Item = (K, Entry)>>(iter: I) -> Self {
        Self::with_values(iter)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();
        keys.sort();
        f.debug_struct("Container")
            .field("keys", &keys)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Pending binding created by [`Container::bind_callable`].
pub struct Binder<'c> {
    container: &'c Container,
    dependencies: Vec<String>,
    registration_key: Option<String>,
}

impl<'c> Binder<'c> {
    /// Wraps `target`. The wrapper ignores its own call arguments and passes
    /// the resolved dependencies positionally instead.
    ///
    /// With a registration key, the wrapper is also stored in the container
    /// it was bound on, which always invokes it with itself.
    pub fn wrap(self, target: impl Into<Entry>) -> Result<Bound<'c>, ContainerError> {
        let target = target
            .into()
            .into_invocable()
            .ok_or(ContainerError::NotCallable(NotCallable::Target))?;

        let dependencies = self.dependencies;
        let wrapper = Invocable::erased(move |container, _| {
            let args = dependencies
                .iter()
                .map(|key| container.get(key))
                .collect::<Result<Arguments, _>>()?;
            target.call_with(container, &args)
        });

        if let Some(key) = self.registration_key {
            self.container.set(key, wrapper.clone());
        }

        Ok(Bound {
            container: self.container,
            invocable: wrapper,
        })
    }
}

/// An invocable tied to the container its dependencies are resolved from.
#[derive(Debug)]
pub struct Bound<'c> {
    container: &'c Container,
    invocable: Invocable,
}

impl<'c> Bound<'c> {
    /// Resolves the dependencies again and invokes the target.
    pub fn call(&self) -> Result<Service, ContainerError> {
        self.invocable.call(self.container)
    }
}
