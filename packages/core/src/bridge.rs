//! Keeps declared properties in sync with the element's attributes.
//!
//! Attribute changes are coerced into properties; property writes are reflected back to attributes. Writes made
//! by reflection are remembered so the attribute callback they cause isn't bridged back into the property.

use strand_dom::DomError;

use crate::{
    instance::InstanceInner,
    props::{coerce, Reflection},
    PropValue, PropertyError,
};

impl InstanceInner {
    /// Load every declared property that has an attribute present. Properties without one keep their value.
    pub(crate) fn seed_properties(&self) {
        let Some(document) = self.document() else {
            return;
        };

        let mut properties = self.properties.borrow_mut();
        for (name, default) in self.definition.defaults.iter() {
            if let Some(text) = document.attribute(self.element, name) {
                properties.insert(name.to_string(), coerce(default, Some(&text)));
            }
        }
    }

    pub(crate) fn attribute_changed(&self, name: &str, new: Option<&str>) {
        {
            let mut reflecting = self.reflecting.borrow_mut();
            if reflecting.get(name).is_some_and(|expected| expected.as_deref() == new) {
                reflecting.remove(name);
                return;
            }
        }

        let Some(default) = self.definition.defaults.get(name) else {
            return;
        };

        let value = coerce(default, new);
        tracing::trace!("<{}> property `{name}` = {value:?}", self.name());
        self.properties.borrow_mut().insert(name.to_string(), value);
    }

    pub(crate) fn set_property(&self, name: &str, value: PropValue) -> Result<(), PropertyError> {
        if !self.definition.defaults.contains(name) {
            tracing::warn!("<{}> has no property named `{name}`", self.name());
            return Err(PropertyError::Undeclared {
                component: self.name().to_string(),
                name: name.to_string(),
            });
        }

        let reflection = value.reflection();
        self.properties.borrow_mut().insert(name.to_string(), value);
        self.reflect(name, reflection)?;
        Ok(())
    }

    fn reflect(&self, name: &str, reflection: Reflection) -> Result<(), DomError> {
        let Some(document) = self.document() else {
            return Ok(());
        };

        let expected = match &reflection {
            Reflection::Skip => return Ok(()),
            Reflection::Remove if !document.has_attribute(self.element, name) => return Ok(()),
            Reflection::Remove => None,
            Reflection::Set(text) => Some(text.clone()),
        };
        self.reflecting
            .borrow_mut()
            .insert(name.to_string(), expected);

        let result = match &reflection {
            Reflection::Set(text) => document.set_attribute(self.element, name, text),
            _ => document.remove_attribute(self.element, name),
        };
        if result.is_err() {
            self.reflecting.borrow_mut().remove(name);
        }
        result
    }
}
