//! Turns a component definition into a custom element definition the document can construct.

use std::{
    any::Any,
    rc::{Rc, Weak},
};

use strand_dom::{CallbackError, CustomElement, Document, ElementDefinition, NodeId};

use crate::{definition::ComponentDefinition, instance::InstanceInner, tasks::Scheduler, ConnectError};

/// The custom element bound to every element of a declared component.
pub(crate) struct ComponentElement {
    pub(crate) instance: Rc<InstanceInner>,
}

impl ComponentDefinition {
    /// The element definition registered with the document: one observed attribute per declared property.
    pub(crate) fn element_definition(self: &Rc<Self>, scheduler: Weak<Scheduler>) -> ElementDefinition {
        let definition = self.clone();
        let constructor = move |document: &Document, element: NodeId| {
            Rc::new(definition.construct(document, element, scheduler.clone())) as Rc<dyn CustomElement>
        };

        let mut element = ElementDefinition::new(constructor).observe(self.defaults.names());
        if let Some(tag) = &self.options.extends {
            element = element.extends(tag.clone());
        }
        element
    }

    /// Set up the render root and its stylesheets for a new element.
    fn construct(
        self: &Rc<Self>,
        document: &Document,
        element: NodeId,
        scheduler: Weak<Scheduler>,
    ) -> ComponentElement {
        let render_root = match self.options.shadow {
            Some(mode) => match document.attach_shadow(element, mode) {
                Ok(root) => root,
                Err(err) => {
                    tracing::error!("<{}> can't attach a shadow root, rendering into light DOM: {err}", self.name);
                    element
                }
            },
            None => element,
        };

        if render_root != element {
            let sheets = self
                .scoped_styles
                .iter()
                .chain(&self.options.adopted_style_sheets)
                .cloned()
                .collect();
            if let Err(err) = document.set_adopted_style_sheets(render_root, sheets) {
                tracing::error!("<{}> failed to adopt its stylesheets: {err}", self.name);
            }
        } else {
            if self.scoped_styles.is_some() {
                tracing::warn!("<{}> declares styles but has no shadow root, ignoring them", self.name);
            }
            self.adopt_into_document(document);
        }

        ComponentElement {
            instance: InstanceInner::new(self.clone(), document, element, render_root, scheduler),
        }
    }

    /// Light-DOM components share their adopted stylesheets with the whole document.
    fn adopt_into_document(&self, document: &Document) {
        if self.options.adopted_style_sheets.is_empty() {
            return;
        }

        let body = document.body();
        let mut sheets = document.adopted_style_sheets(body);
        let missing: Vec<_> = self
            .options
            .adopted_style_sheets
            .iter()
            .filter(|sheet| !sheets.contains(sheet))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }

        sheets.extend(missing);
        if let Err(err) = document.set_adopted_style_sheets(body, sheets) {
            tracing::error!("<{}> failed to adopt its stylesheets: {err}", self.name);
        }
    }
}

impl CustomElement for ComponentElement {
    fn connected(&self) -> Result<(), CallbackError> {
        let instance = &self.instance;
        instance.seed_properties();

        instance.start().map_err(|error| {
            tracing::debug!("<{}> failed its first render: {error}", instance.name());
            Box::new(ConnectError {
                component: instance.name().to_string(),
                error,
            }) as CallbackError
        })?;

        if let Some(on_connected) = &instance.definition.options.on_connected {
            on_connected(&instance.handle());
        }
        Ok(())
    }

    fn disconnected(&self) {
        let instance = &self.instance;
        if let Some(on_disconnected) = &instance.definition.options.on_disconnected {
            on_disconnected(&instance.handle());
        }
        instance.finalize();
    }

    fn attribute_changed(&self, name: &str, _old: Option<&str>, new: Option<&str>) {
        self.instance.attribute_changed(name, new);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
