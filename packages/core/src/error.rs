use std::{
    fmt::{Debug, Display},
    rc::Rc,
};

use strand_dom::DomError;

/// An error raised while producing or committing a view.
///
/// Any [`std::error::Error`] converts into a `RenderError`, so generator bodies can use `?` freely.
#[derive(Debug)]
pub enum RenderError {
    /// The generator raised an error.
    Aborted(CapturedError),

    /// Reconciling the view into the document failed.
    Commit(DomError),

    /// The runtime that owns the component has been dropped.
    NoRuntime,
}

impl RenderError {
    /// Raise an error from a plain message.
    pub fn msg(message: impl Display + Debug + 'static) -> Self {
        Self::Aborted(CapturedError::msg(message))
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aborted(e) => write!(f, "Render aborted: {e}"),
            Self::Commit(e) => write!(f, "Commit failed: {e}"),
            Self::NoRuntime => f.write_str("The strand runtime has been dropped"),
        }
    }
}

impl<E: std::error::Error + 'static> From<E> for RenderError {
    fn from(e: E) -> Self {
        Self::Aborted(CapturedError::from(e))
    }
}

/// A type-erased error captured from a generator body.
#[derive(Clone)]
pub struct CapturedError(Rc<dyn std::error::Error + 'static>);

impl CapturedError {
    pub fn msg(message: impl Display + Debug + 'static) -> Self {
        Self(Rc::new(MessageError(message)))
    }

    /// The captured error, for inspection or downcasting.
    pub fn inner(&self) -> &(dyn std::error::Error + 'static) {
        &*self.0
    }

    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl<E: std::error::Error + 'static> From<E> for CapturedError {
    fn from(e: E) -> Self {
        Self(Rc::new(e))
    }
}

impl Display for CapturedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for CapturedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

struct MessageError<M>(M);

impl<M: Display> Display for MessageError<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<M: Debug> Debug for MessageError<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<M: Display + Debug> std::error::Error for MessageError<M> {}

/// The first render of a component failed while its element was being connected.
///
/// This is the error the document reports from the insertion that connected the element, wrapped in
/// [`DomError::Callback`].
#[derive(Debug, thiserror::Error)]
#[error("<{component}> failed to render: {error}")]
pub struct ConnectError {
    pub component: String,
    pub error: RenderError,
}

/// Errors produced when declaring a component.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A component with this (normalized) name is already declared.
    #[error("a component named `{0}` is already declared")]
    Duplicate(String),

    /// The normalized name is not a valid custom element name.
    #[error("`{0}` is not a valid component name")]
    InvalidName(String),

    /// The document refused the definition or an upgraded element failed to connect.
    #[error(transparent)]
    Platform(DomError),

    /// `declare_component` was called outside of a runtime.
    #[error("no strand runtime is active on this thread")]
    NoRuntime,
}

/// Errors produced when assigning a property programmatically.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    /// Only properties declared with default values can be assigned.
    #[error("<{component}> has no property named `{name}`")]
    Undeclared { component: String, name: String },

    /// The component's element no longer exists.
    #[error("the component's element has been dropped")]
    Detached,

    /// Reflecting the value to its attribute failed.
    #[error("failed to reflect property: {0}")]
    Reflect(#[from] DomError),
}
