use std::{cell::RefCell, rc::Rc};

use rustc_hash::FxHashMap;
use strand_dom::{Document, DomError};

use crate::{
    definition::ComponentDefinition, tasks::Scheduler, Component, ComponentOptions, Config, DefaultProps,
    Generator, RegistrationError,
};

thread_local! {
    static RUNTIMES: RefCell<Vec<Rc<Runtime>>> = const { RefCell::new(vec![]) };
}

/// Pushes a new runtime onto the stack
fn push_runtime(runtime: Rc<Runtime>) {
    RUNTIMES.with(|stack| stack.borrow_mut().push(runtime));
}

/// Pops a runtime off the stack
fn pop_runtime() {
    RUNTIMES.with(|stack| stack.borrow_mut().pop());
}

/// Owns a document, the components declared into it and the scheduler their renders run on.
pub struct Runtime {
    config: Config,
    document: Document,
    pub(crate) scheduler: Rc<Scheduler>,
    components: RefCell<FxHashMap<String, Rc<ComponentDefinition>>>,
}

impl Runtime {
    pub fn new(config: Config) -> Rc<Self> {
        let document = config.document.clone().unwrap_or_default();
        Rc::new(Self {
            config,
            document,
            scheduler: Scheduler::new(),
            components: Default::default(),
        })
    }

    /// The runtime made current by the innermost [`RuntimeGuard`] on this thread.
    pub fn current() -> Option<Rc<Runtime>> {
        RUNTIMES.with(|stack| stack.borrow().last().cloned())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Declare a component kind and register it with the document.
    ///
    /// Returns the name the component was registered under. See [`crate::declare_component`].
    pub fn declare<G>(
        &self,
        name: &str,
        factory: impl Fn(&Component) -> G + 'static,
        defaults: DefaultProps,
        options: ComponentOptions,
    ) -> Result<String, RegistrationError>
    where
        G: Generator,
    {
        let name = normalize_name(&self.config.namespace, name);
        if self.components.borrow().contains_key(&name) {
            return Err(RegistrationError::Duplicate(name));
        }
        if !strand_dom::is_valid_custom_element_name(&name) {
            return Err(RegistrationError::InvalidName(name));
        }

        let definition = Rc::new(ComponentDefinition::new(
            name.clone(),
            Rc::new(move |component: &Component| Box::new(factory(component)) as Box<dyn Generator>),
            defaults,
            options,
        ));
        let element = definition.element_definition(Rc::downgrade(&self.scheduler));

        tracing::debug!("declaring component <{name}>");
        let defined = self.document.define(&name, element);
        match &defined {
            Err(DomError::AlreadyDefined(name)) => return Err(RegistrationError::Duplicate(name.clone())),
            Err(DomError::InvalidName(name)) => return Err(RegistrationError::InvalidName(name.clone())),
            // Upgrading existing elements can fail after the definition is in place.
            Ok(()) | Err(DomError::Callback { .. }) => {
                self.components.borrow_mut().insert(name.clone(), definition);
            }
            Err(_) => {}
        }

        defined.map_err(RegistrationError::Platform)?;
        Ok(name)
    }

    /// Whether a component is declared under this (normalized) name.
    pub fn is_declared(&self, name: &str) -> bool {
        self.components
            .borrow()
            .contains_key(&normalize_name(&self.config.namespace, name))
    }

    /// Run every render that is ready to make progress.
    pub fn flush(&self) {
        self.scheduler.flush()
    }

    /// Wait for a pending render to be woken, then flush.
    pub async fn wait_for_work(&self) {
        self.scheduler.wait_for_work().await
    }

    /// Whether any render is still waiting on external work.
    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_pending_tasks()
    }

    /// Flush, then keep waiting for work until no render is pending.
    pub async fn run_until_idle(&self) {
        self.flush();
        while self.has_pending_work() {
            self.wait_for_work().await;
        }
    }
}

/// Makes a runtime current for the free functions of this crate until dropped.
pub struct RuntimeGuard(Rc<Runtime>);

impl RuntimeGuard {
    pub fn new(runtime: Rc<Runtime>) -> Self {
        push_runtime(runtime.clone());
        Self(runtime)
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.0
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        pop_runtime();
    }
}

/// Prefix names without a hyphen with the namespace.
pub(crate) fn normalize_name(namespace: &str, name: &str) -> String {
    if name.contains('-') {
        name.to_string()
    } else {
        format!("{namespace}-{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_namespaced() {
        assert_eq!(normalize_name("x", "foo"), "x-foo");
        assert_eq!(normalize_name("x", "foo-bar"), "foo-bar");
        assert_eq!(normalize_name("app", "counter"), "app-counter");
    }

    #[test]
    fn guards_nest() {
        assert!(Runtime::current().is_none());

        let outer = Runtime::new(Config::default());
        let _outer_guard = RuntimeGuard::new(outer.clone());
        {
            let mut cfg = Config::default();
            cfg.namespace("inner");
            let _inner_guard = RuntimeGuard::new(Runtime::new(cfg));
            assert_eq!(Runtime::current().map(|rt| rt.namespace().to_string()).as_deref(), Some("inner"));
        }
        assert!(Runtime::current().is_some_and(|rt| Rc::ptr_eq(&rt, &outer)));
    }
}
