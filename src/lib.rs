//! A small string-keyed service container.
//!
//! Entries are plain values or invocables taking the container. Invocables
//! are shared by default; mark them with [`Container::factory`] to rebuild
//! on every resolution, or [`Container::protect`] to store a closure as a
//! parameter.
//!
//! ```rust
//! use scute::{Container, Entry, Invocable};
//!
//! struct Mailer {
//!     host: String,
//! }
//!
//! let container = Container::new();
//! container.set("host", Entry::value(String::from("smtp.local")));
//! container.set(
//!     "mailer",
//!     Entry::service(|c| {
//!         Ok(Mailer {
//!             host: c.get_as::<String>("host")?.to_string(),
//!         })
//!     }),
//! );
//!
//! let one = container.get_as::<Mailer>("mailer").unwrap();
//! let two = container.get_as::<Mailer>("mailer").unwrap();
//! assert_eq!(one.host, "smtp.local");
//! assert!(std::sync::Arc::ptr_eq(&one, &two));
//!
//! let tagged = container
//!     .extend(
//!         "mailer",
//!         Invocable::extender(|prev: std::sync::Arc<Mailer>, _| Ok(format!("mailer@{}", prev.host))),
//!     )
//!     .unwrap();
//! assert_eq!(
//!     tagged.call(&container).unwrap().downcast_ref::<String>().unwrap(),
//!     "mailer@smtp.local"
//! );
//! ```

pub mod containers;
pub mod error;
pub mod function;
pub mod interfaces;

pub use containers::basic::{Binder, Bound, Container};
pub use error::{ContainerError, NotCallable};
pub use function::{Arguments, Invocable, Service};
pub use interfaces::container::{Entry, Provider};
