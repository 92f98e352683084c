use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use rustc_hash::FxHashMap;
use strand_dom::{Document, NodeId, WeakDocument};

use crate::{
    definition::ComponentDefinition, factory::ComponentElement, tasks::Scheduler, Generator, PropValue,
    PropertyError,
};

/// Where a component instance is in its generator's lifetime.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Lifecycle {
    /// Not connected yet: no generator exists.
    Unstarted,

    /// Connected, with a generator suspended at its last yield (or producing the next view).
    Running,

    /// The generator returned. Its views stay committed and render requests are ignored.
    Settled,

    /// The generator raised or the element disconnected. Reconnecting starts a fresh generator.
    Finalized,
}

/// Whether a render is queued or running for an instance.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum RenderSlot {
    Idle,

    /// A task will advance the generator on the next turn of the scheduler.
    Scheduled,

    /// The generator is being advanced. `trailing` records a request made in the meantime.
    InFlight { trailing: bool },
}

pub(crate) struct DriverState {
    pub(crate) lifecycle: Lifecycle,

    /// Absent while an advance owns it.
    pub(crate) generator: Option<Box<dyn Generator>>,

    /// Bumped on every connect and disconnect, so work started for an earlier connection can tell it is stale.
    pub(crate) epoch: u64,

    pub(crate) slot: RenderSlot,
}

/// The per-element state of a component. Owned by the element, through its custom element binding.
pub(crate) struct InstanceInner {
    pub(crate) this: Weak<InstanceInner>,
    pub(crate) definition: Rc<ComponentDefinition>,
    pub(crate) document: WeakDocument,
    pub(crate) element: NodeId,
    pub(crate) render_root: NodeId,
    pub(crate) scheduler: Weak<Scheduler>,
    pub(crate) properties: RefCell<FxHashMap<String, PropValue>>,
    /// Attribute values written by property reflection whose change callbacks must not be bridged back.
    pub(crate) reflecting: RefCell<FxHashMap<String, Option<String>>>,
    pub(crate) driver: RefCell<DriverState>,
}

impl InstanceInner {
    pub(crate) fn new(
        definition: Rc<ComponentDefinition>,
        document: &Document,
        element: NodeId,
        render_root: NodeId,
        scheduler: Weak<Scheduler>,
    ) -> Rc<Self> {
        let properties = definition
            .defaults
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            definition,
            document: document.downgrade(),
            element,
            render_root,
            scheduler,
            properties: RefCell::new(properties),
            reflecting: Default::default(),
            driver: RefCell::new(DriverState {
                lifecycle: Lifecycle::Unstarted,
                generator: None,
                epoch: 0,
                slot: RenderSlot::Idle,
            }),
        })
    }

    pub(crate) fn handle(&self) -> Component {
        Component {
            inner: self.this.clone(),
        }
    }

    /// The document, as long as `element` is still bound to this instance.
    ///
    /// Node ids are reused once an element is destroyed, so an instance kept alive by an in-flight render must not
    /// act on whatever node took its slot.
    pub(crate) fn document(&self) -> Option<Document> {
        let document = self.document.upgrade()?;
        self.is_bound(&document).then_some(document)
    }

    fn is_bound(&self, document: &Document) -> bool {
        document.custom_element(self.element).is_some_and(|custom| {
            custom
                .as_any()
                .downcast_ref::<ComponentElement>()
                .is_some_and(|bound| std::ptr::eq(Rc::as_ptr(&bound.instance), self))
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.definition.name
    }
}

/// A handle to one component instance.
///
/// The generator factory and the connect callbacks receive one; generator closures keep it to read their
/// properties and to request renders. The handle does not keep the instance alive: once the element is destroyed
/// every operation becomes a no-op, even while a render that was in flight still holds the instance.
#[derive(Clone)]
pub struct Component {
    inner: Weak<InstanceInner>,
}

impl Component {
    /// The handle of the component bound to an element, if the element is an upgraded strand component.
    pub fn from_element(document: &Document, element: NodeId) -> Option<Component> {
        let custom = document.custom_element(element)?;
        let element = custom.as_any().downcast_ref::<ComponentElement>()?;
        Some(element.instance.handle())
    }

    /// Run `f` on the instance if it is still bound to its element.
    fn with<R>(&self, f: impl FnOnce(&Rc<InstanceInner>, Document) -> R) -> Option<R> {
        let instance = self.inner.upgrade()?;
        let document = instance.document()?;
        Some(f(&instance, document))
    }

    /// Ask for the next view.
    ///
    /// The generator is resumed on a later turn of the scheduler. Requests made while a render is queued are
    /// absorbed by it; requests made while the generator is running collapse into one more render after it.
    /// Does nothing once the generator has returned, raised or been finalized.
    pub fn render(&self) {
        self.with(|instance, _| instance.request_render());
    }

    /// The current value of a declared property.
    pub fn property(&self, name: &str) -> Option<PropValue> {
        self.with(|instance, _| instance.properties.borrow().get(name).cloned())
            .flatten()
    }

    /// Every declared property, in declaration order.
    pub fn properties(&self) -> Vec<(String, PropValue)> {
        self.with(|instance, _| {
            let properties = instance.properties.borrow();
            instance
                .definition
                .defaults
                .names()
                .filter_map(|name| Some((name.to_string(), properties.get(name)?.clone())))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Assign a declared property. Scalar values are reflected to the attribute of the same name.
    pub fn set_property(&self, name: &str, value: impl Into<PropValue>) -> Result<(), PropertyError> {
        self.with(|instance, _| instance.set_property(name, value.into()))
            .unwrap_or(Err(PropertyError::Detached))
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with(|instance, document| document.attribute(instance.element, name))
            .flatten()
    }

    pub fn element(&self) -> Option<NodeId> {
        self.with(|instance, _| instance.element)
    }

    /// The node views are committed into: the shadow root if the component has one, otherwise the element.
    pub fn render_root(&self) -> Option<NodeId> {
        self.with(|instance, _| instance.render_root)
    }

    pub fn document(&self) -> Option<Document> {
        self.with(|_, document| document)
    }

    pub fn is_connected(&self) -> bool {
        self.with(|instance, document| document.is_connected(instance.element))
            .unwrap_or(false)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner
            .upgrade()
            .map_or(Lifecycle::Finalized, |instance| instance.driver.borrow().lifecycle)
    }

    /// The name the component was registered under.
    pub fn name(&self) -> String {
        self.inner
            .upgrade()
            .map(|instance| instance.name().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.upgrade() {
            Some(instance) => f
                .debug_struct("Component")
                .field("name", &instance.definition.name)
                .field("element", &instance.element)
                .field("lifecycle", &instance.driver.borrow().lifecycle)
                .finish(),
            None => f.write_str("Component(<dropped>)"),
        }
    }
}
