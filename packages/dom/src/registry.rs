use std::{any::Any, rc::Rc};

use rustc_hash::FxHashMap;

use crate::{CallbackError, Document, DomError, NodeId};

/// Names the platform reserves even though they look like custom element names.
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// The per-element behaviour of an upgraded custom element.
///
/// Callbacks are invoked as reactions: after the tree mutation that caused them has finished, never while the
/// document is borrowed, so implementations are free to mutate the document.
pub trait CustomElement: 'static {
    /// The element was inserted into a connected tree.
    fn connected(&self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// The element was removed from a connected tree.
    fn disconnected(&self) {}

    /// One of the definition's observed attributes was set or removed.
    fn attribute_changed(&self, _name: &str, _old: Option<&str>, _new: Option<&str>) {}

    fn as_any(&self) -> &dyn Any;
}

/// Builds the [`CustomElement`] for each element created under a definition.
pub trait ElementConstructor: 'static {
    fn construct(&self, document: &Document, element: NodeId) -> Rc<dyn CustomElement>;
}

impl<F> ElementConstructor for F
where
    F: Fn(&Document, NodeId) -> Rc<dyn CustomElement> + 'static,
{
    fn construct(&self, document: &Document, element: NodeId) -> Rc<dyn CustomElement> {
        self(document, element)
    }
}

/// Everything the platform needs to know about one custom element kind.
#[derive(Clone)]
pub struct ElementDefinition {
    pub constructor: Rc<dyn ElementConstructor>,
    pub observed_attributes: Rc<[String]>,
    /// The built-in tag this definition customizes, if any. Customized built-ins are created with
    /// [`Document::create_element_is`].
    pub extends: Option<String>,
}

impl ElementDefinition {
    pub fn new(constructor: impl ElementConstructor) -> Self {
        Self {
            constructor: Rc::new(constructor),
            observed_attributes: Rc::from(Vec::new()),
            extends: None,
        }
    }

    pub fn observe<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observed_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn extends(mut self, tag: impl Into<String>) -> Self {
        self.extends = Some(tag.into());
        self
    }
}

/// The table of custom element definitions for one document. Definitions are write-once.
#[derive(Default)]
pub(crate) struct CustomElementRegistry {
    definitions: FxHashMap<String, ElementDefinition>,
}

impl CustomElementRegistry {
    pub(crate) fn insert(&mut self, name: &str, definition: ElementDefinition) -> Result<(), DomError> {
        if !is_valid_custom_element_name(name) {
            return Err(DomError::InvalidName(name.to_string()));
        }
        if self.definitions.contains_key(name) {
            return Err(DomError::AlreadyDefined(name.to_string()));
        }
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ElementDefinition> {
        self.definitions.get(name)
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Find the definition that applies to an element with this tag and `is` value.
    pub(crate) fn lookup(&self, tag: &str, is: Option<&str>) -> Option<&ElementDefinition> {
        match is {
            Some(is) => self
                .definitions
                .get(is)
                .filter(|def| def.extends.as_deref() == Some(tag)),
            None => self.definitions.get(tag).filter(|def| def.extends.is_none()),
        }
    }
}

/// Check a name against the platform's rules for custom element names.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    first.is_ascii_lowercase()
        && name.contains('-')
        && !RESERVED_NAMES.contains(&name)
        && chars.all(|c| {
            matches!(c, 'a'..='z' | '0'..='9' | '-' | '.' | '_') || (!c.is_ascii() && !c.is_uppercase())
        })
}
