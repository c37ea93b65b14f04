use core::fmt;
use std::any::{type_name, Any};
use std::sync::Arc;

use crate::containers::basic::Container;
use crate::error::ContainerError;

/// A resolved, type-erased service. Identity is pointer identity.
pub type Service = Arc<dyn Any + Send + Sync>;

type Func = dyn Fn(&Container, &Arguments) -> Result<Service, ContainerError> + Send + Sync;

/// A shareable closure invoked with the container and positional arguments.
///
/// Cloning an `Invocable` keeps its identity, so the clone compares equal
/// under [`Invocable::ptr_eq`].
#[derive(Clone)]
pub struct Invocable {
    func: Arc<Func>,
    name: &'static str,
}

impl Invocable {
    /// Wraps a closure that only needs the container. Call arguments are ignored.
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self {
            name: type_name::<F>(),
            func: Arc::new(move |container: &Container, _: &Arguments| {
                f(container).map(|value| Arc::new(value) as Service)
            }),
        }
    }

    /// Wraps a closure that reads its positional arguments.
    pub fn with_args<F, T>(f: F) -> Self
    where
        F: Fn(&Container, &Arguments) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self {
            name: type_name::<F>(),
            func: Arc::new(move |container: &Container, args: &Arguments| {
                f(container, args).map(|value| Arc::new(value) as Service)
            }),
        }
    }

    /// Wraps a closure that already produces a [`Service`]; the result is passed through untouched.
    pub fn erased<F>(f: F) -> Self
    where
        F: Fn(&Container, &Arguments) -> Result<Service, ContainerError> + Send + Sync + 'static,
    {
        Self {
            name: type_name::<F>(),
            func: Arc::new(f),
        }
    }

    /// Builds an extender for [`Container::extend`]: receives the previous
    /// result downcast to `T` plus the container.
    pub fn extender<F, T, U>(f: F) -> Self
    where
        F: Fn(Arc<T>, &Container) -> Result<U, ContainerError> + Send + Sync + 'static,
        T: Any + Send + Sync,
        U: Any + Send + Sync,
    {
        Self {
            name: type_name::<F>(),
            func: Arc::new(move |container: &Container, args: &Arguments| {
                let previous = args.get::<T>(0)?;
                f(previous, container).map(|value| Arc::new(value) as Service)
            }),
        }
    }

    /// Invokes with the container and no arguments.
    pub fn call(&self, container: &Container) -> Result<Service, ContainerError> {
        (self.func)(container, &Arguments::default())
    }

    pub fn call_with(&self, container: &Container, args: &Arguments) -> Result<Service, ContainerError> {
        (self.func)(container, args)
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::as_ptr(&a.func) as *const () == Arc::as_ptr(&b.func) as *const ()
    }
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocable")
            .field("f", &format_args!("{}", self.name))
            .finish()
    }
}

/// Positional arguments handed to an [`Invocable`].
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Service>,
}

impl Arguments {
    pub fn new(values: Vec<Service>) -> Self {
        Self { values }
    }

    pub fn raw(&self, position: usize) -> Result<&Service, ContainerError> {
        self.values
            .get(position)
            .ok_or(ContainerError::MissingArgument(position))
    }

    /// Downcasts the argument at `position`.
    pub fn get<T: Any + Send + Sync>(&self, position: usize) -> Result<Arc<T>, ContainerError> {
        self.raw(position)?
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::ArgumentMismatch {
                position,
                expected: type_name::<T>(),
            })
    }
}

impl FromIterator<Service> for Arguments {
    fn from_iter<I: IntoIterator<Item = Service>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocable_fn() {
        let container = Container::new();
        let f = Invocable::new(|_| Ok(41 + 1));
        let value = f.call(&container).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let f = Invocable::new(|_| Ok("hello"));
        let g = Invocable::new(|_| Ok("hello"));
        assert!(Invocable::ptr_eq(&f, &f.clone()));
        assert!(!Invocable::ptr_eq(&f, &g));
    }

    #[test]
    fn test_erased_passes_service_through() {
        let container = Container::new();
        let shared: Service = Arc::new(String::from("shared"));
        let inner = shared.clone();
        let f = Invocable::erased(move |_, _| Ok(inner.clone()));
        assert!(Arc::ptr_eq(&f.call(&container).unwrap(), &shared));
    }

    #[test]
    fn test_arguments_positional_access() {
        let container = Container::new();
        let sum = Invocable::with_args(|_, args| Ok(*args.get::<i32>(0)? + *args.get::<i32>(1)?));
        let args = Arguments::new(vec![Arc::new(2) as Service, Arc::new(3) as Service]);
        let value = sum.call_with(&container, &args).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&5));

        assert!(matches!(
            sum.call(&container),
            Err(ContainerError::MissingArgument(0))
        ));
    }

    #[test]
    fn test_argument_type_mismatch() {
        let args = Arguments::new(vec![Arc::new("text") as Service]);
        assert!(matches!(
            args.get::<i32>(0),
            Err(ContainerError::ArgumentMismatch { position: 0, .. })
        ));
    }

    #[test]
    fn invocable_has_useful_debug_impl() {
        let f = Invocable::new(|_| Ok(()));
        let debug = format!("{:?}", f);
        assert!(debug.starts_with("Invocable { f: scute::function::tests::invocable_has_useful_debug_impl::{{closure}}"));
    }
}
