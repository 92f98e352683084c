use crate::NodeId;

/// An error raised by a callback registered with the document, usually a custom element reaction.
pub type CallbackError = Box<dyn std::error::Error + 'static>;

/// Errors produced by document operations.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The name is not a valid custom element name.
    #[error("`{0}` is not a valid custom element name")]
    InvalidName(String),

    /// A custom element with this name has already been defined.
    #[error("a custom element named `{0}` is already defined")]
    AlreadyDefined(String),

    /// The node does not exist in this document (or has been destroyed).
    #[error("node {0:?} does not exist in this document")]
    UnknownNode(NodeId),

    /// The requested insertion would produce an invalid tree.
    #[error("invalid tree operation: {0}")]
    HierarchyRequest(&'static str),

    /// The operation requires an element.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// `attach_shadow` was called on an element that already hosts a shadow root.
    #[error("element {0:?} already hosts a shadow root")]
    ShadowRootExists(NodeId),

    /// `attach_shadow` was called on an element that cannot host one.
    #[error("<{0}> elements cannot host a shadow root")]
    ShadowNotSupported(String),

    /// A custom element callback failed while reactions were flushed.
    #[error("callback for <{element}> failed: {source}")]
    Callback {
        element: String,
        #[source]
        source: CallbackError,
    },
}

impl DomError {
    /// Returns the error raised by the element callback, if this error wraps one.
    pub fn callback_source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomError::Callback { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
