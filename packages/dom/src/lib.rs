//! An in-memory document with custom elements, shadow roots and view patching.
//!
//! This crate is the platform layer strand components run on:
//!
//! - [`Document`]: a node tree with attributes, text, shadow roots, constructed stylesheets and events;
//! - custom elements: write-once [`ElementDefinition`]s whose [`CustomElement`] callbacks run as reactions after
//!   each tree mutation;
//! - [`VNode`] and [`patch`]: declarative view descriptions and the reconciler that commits them.

mod document;
mod error;
mod events;
mod html;
mod node;
mod patch;
mod registry;
mod stylesheet;
mod vnode;

pub use document::{Document, WeakDocument};
pub use error::{CallbackError, DomError};
pub use events::{Event, Listener};
pub use node::{NodeId, NodeKind, ShadowRootMode};
pub use patch::patch;
pub use registry::{
    is_valid_custom_element_name, CustomElement, ElementConstructor, ElementDefinition,
};
pub use stylesheet::StyleSheet;
pub use vnode::{fragment, h, text, Attribute, VElement, VNode, VText};
