use thiserror::Error;

/// The kinds of "expected an invocable, got something else".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotCallable {
    /// Target handed to a `Binder`.
    Target,
    /// `factory`, or the extender given to `extend`.
    Factory,
    /// `protect`.
    Protect,
    /// Entry being extended holds a plain value.
    ExtendedService,
}

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Identifier \"{0}\" is not defined")]
    UnknownIdentifier(String),

    #[error("{}", not_callable_message(.0))]
    NotCallable(NotCallable),

    #[error("Service \"{key}\" is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("Argument {position} is not a {expected}")]
    ArgumentMismatch { position: usize, expected: &'static str },

    #[error("Missing argument at position {0}")]
    MissingArgument(usize),

    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

fn not_callable_message(kind: &NotCallable) -> &'static str {
    match kind {
        NotCallable::Target => "Bound target is not invocable",
        NotCallable::Factory => "Factory is not invocable",
        NotCallable::Protect => "Protected entry is not invocable",
        NotCallable::ExtendedService => "Extended service is not invocable",
    }
}

impl ContainerError {
    pub fn unknown(key: impl Into<String>) -> Self {
        ContainerError::UnknownIdentifier(key.into())
    }

    /// True for every refinement of the not-callable kind.
    pub fn is_not_callable(&self) -> bool {
        matches!(self, ContainerError::NotCallable(_))
    }

    /// The missing key carried by `UnknownIdentifier`.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            ContainerError::UnknownIdentifier(key) => Some(key),
            _ => None,
        }
    }
}
