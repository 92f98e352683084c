#![doc = include_str!("../README.md")]

mod bridge;
mod config;
mod definition;
mod driver;
mod error;
mod factory;
mod generator;
mod instance;
mod props;
mod runtime;
mod tasks;

pub(crate) mod innerlude {
    pub use crate::config::*;
    pub use crate::definition::ComponentOptions;
    pub use crate::error::*;
    pub use crate::generator::*;
    pub use crate::instance::{Component, Lifecycle};
    pub use crate::props::{coerce, DefaultProps, PropKind, PropValue};
    pub use crate::runtime::{Runtime, RuntimeGuard};
}

pub use crate::innerlude::{
    coerce, from_fn, from_stream, once, CapturedError, Component, ComponentOptions, Config, ConnectError,
    DefaultProps, FromFn, FromStream, Generator, Lifecycle, OnFinalize, Once, PropKind, PropValue, PropertyError,
    RegistrationError, RenderError, Runtime, RuntimeGuard, Step,
};

/// Declare a component with the runtime that is current on this thread.
///
/// `name` is namespaced if it has no hyphen (see [`Config::namespace`]). `factory` is called each time an element
/// of the component connects and returns the generator that renders it. `defaults` declares the component's
/// properties; their names are the attributes the component observes.
///
/// ```rust
/// use strand_core::{declare_component, from_fn, ComponentOptions, Config, DefaultProps, Runtime, RuntimeGuard, Step};
/// use strand_dom::{h, text};
///
/// let runtime = Runtime::new(Config::default());
/// let _guard = RuntimeGuard::new(runtime.clone());
///
/// let name = declare_component(
///     "greeting",
///     |component| {
///         let component = component.clone();
///         from_fn(move || {
///             let name = component.property("name").map(|p| p.to_string()).unwrap_or_default();
///             async move { Ok(Step::Yield(h("p").child(text(format!("Hello, {name}!"))).into())) }
///         })
///     },
///     DefaultProps::new().prop("name", "world"),
///     ComponentOptions::new(),
/// )
/// .unwrap();
/// assert_eq!(name, "x-greeting");
///
/// let doc = runtime.document();
/// let el = doc.create_element(&name);
/// doc.append_child(doc.body(), el).unwrap();
/// assert_eq!(doc.inner_html(el), "<p>Hello, world!</p>");
/// ```
pub fn declare_component<G>(
    name: &str,
    factory: impl Fn(&Component) -> G + 'static,
    defaults: DefaultProps,
    options: ComponentOptions,
) -> Result<String, RegistrationError>
where
    G: Generator,
{
    Runtime::current()
        .ok_or(RegistrationError::NoRuntime)?
        .declare(name, factory, defaults, options)
}

pub mod prelude {
    pub use crate::declare_component;
    pub use crate::innerlude::{
        from_fn, from_stream, once, Component, ComponentOptions, Config, DefaultProps, Generator, Lifecycle,
        PropValue, RenderError, Runtime, RuntimeGuard, Step,
    };
}
