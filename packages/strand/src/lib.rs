#![doc = include_str!("../README.md")]

pub use strand_core as core;
pub use strand_dom as dom;

#[cfg(feature = "logger")]
pub use strand_logger as logger;

pub use strand_core::{
    declare_component, from_fn, from_stream, once, Component, ComponentOptions, Config, DefaultProps, Generator,
    Lifecycle, PropKind, PropValue, PropertyError, RegistrationError, RenderError, Runtime, RuntimeGuard, Step,
};
pub use strand_dom::{fragment, h, text, Document, NodeId, ShadowRootMode, StyleSheet, VNode};

pub mod prelude {
    pub use strand_core::prelude::*;
    pub use strand_dom::{fragment, h, text, Document, Event, NodeId, ShadowRootMode, StyleSheet, VElement, VNode};
}
