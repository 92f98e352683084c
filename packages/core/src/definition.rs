use std::{fmt::Debug, rc::Rc};

use strand_dom::{ShadowRootMode, StyleSheet};

use crate::{Component, DefaultProps, Generator};

pub(crate) type GeneratorFactory = Rc<dyn Fn(&Component) -> Box<dyn Generator>>;
pub(crate) type Callback = Rc<dyn Fn(&Component)>;

/// Everything declared about one component kind. Created once, when the component is declared.
pub(crate) struct ComponentDefinition {
    pub(crate) name: String,
    pub(crate) factory: GeneratorFactory,
    pub(crate) defaults: DefaultProps,
    pub(crate) options: ComponentOptions,
    /// The `styles` text, constructed once and shared by every instance's shadow root.
    pub(crate) scoped_styles: Option<StyleSheet>,
}

impl ComponentDefinition {
    pub(crate) fn new(
        name: String,
        factory: GeneratorFactory,
        defaults: DefaultProps,
        options: ComponentOptions,
    ) -> Self {
        let scoped_styles = options.styles.as_deref().map(StyleSheet::new);
        Self {
            name,
            factory,
            defaults,
            options,
            scoped_styles,
        }
    }
}

/// How a component's elements are set up.
///
/// ```rust
/// use strand_core::ComponentOptions;
/// use strand_dom::ShadowRootMode;
///
/// let options = ComponentOptions::new()
///     .shadow(ShadowRootMode::Open)
///     .styles(":host { display: block }")
///     .on_connected(|component| println!("<{}> connected", component.name()));
/// ```
#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub(crate) shadow: Option<ShadowRootMode>,
    pub(crate) styles: Option<String>,
    pub(crate) adopted_style_sheets: Vec<StyleSheet>,
    pub(crate) on_connected: Option<Callback>,
    pub(crate) on_disconnected: Option<Callback>,
    pub(crate) extends: Option<String>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into a shadow root of this mode instead of the element's light DOM.
    pub fn shadow(mut self, mode: ShadowRootMode) -> Self {
        self.shadow = Some(mode);
        self
    }

    /// Stylesheet text scoped to the shadow root. Ignored without [`ComponentOptions::shadow`].
    pub fn styles(mut self, css: impl Into<String>) -> Self {
        self.styles = Some(css.into());
        self
    }

    /// Constructed stylesheets to adopt into the shadow root, or into the document for light-DOM components.
    pub fn adopted_style_sheets(mut self, sheets: impl IntoIterator<Item = StyleSheet>) -> Self {
        self.adopted_style_sheets = sheets.into_iter().collect();
        self
    }

    /// Called after the generator has been started, each time an element connects.
    pub fn on_connected(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.on_connected = Some(Rc::new(f));
        self
    }

    /// Called before the generator is finalized, each time an element disconnects.
    pub fn on_disconnected(mut self, f: impl Fn(&Component) + 'static) -> Self {
        self.on_disconnected = Some(Rc::new(f));
        self
    }

    /// Customize a built-in element, e.g. `button`, instead of defining an autonomous element.
    pub fn extends(mut self, tag: impl Into<String>) -> Self {
        self.extends = Some(tag.into());
        self
    }
}

impl Debug for ComponentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("shadow", &self.shadow)
            .field("styles", &self.styles)
            .field("adopted_style_sheets", &self.adopted_style_sheets)
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("extends", &self.extends)
            .finish()
    }
}
