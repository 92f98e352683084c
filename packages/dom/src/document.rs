use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use slab::Slab;

use crate::{
    node::{ElementData, Node, NodeData, ShadowRootData, Upgraded},
    registry::CustomElementRegistry,
    CustomElement, DomError, ElementDefinition, Event, Listener, NodeId, NodeKind, ShadowRootMode,
    StyleSheet,
};

/// Tags that may host a shadow root, besides autonomous custom elements.
const SHADOW_HOSTS: &[&str] = &[
    "article", "aside", "blockquote", "body", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "main", "nav", "p", "section", "span",
];

/// An in-memory document.
///
/// `Document` is a cheap handle: clones refer to the same tree. Everything is single-threaded. Custom element
/// callbacks are queued as reactions while the tree is being mutated and are run once the outermost mutating
/// operation (or [`Document::batch`]) finishes.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// A handle to a [`Document`] that does not keep it alive.
///
/// Custom element instances are owned by the tree, so anything they store must point back at the document weakly.
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

struct DocumentInner {
    tree: RefCell<Tree>,
    registry: RefCell<CustomElementRegistry>,
    pending: RefCell<Vec<Reaction>>,
    batch_depth: Cell<usize>,
}

pub(crate) struct Tree {
    pub(crate) nodes: Slab<Node>,
    pub(crate) body: NodeId,
    pub(crate) mutations: u64,
    pub(crate) adopted: Vec<StyleSheet>,
}

enum Reaction {
    Upgrade(NodeId),
    Connected(NodeId, Rc<dyn CustomElement>),
    Disconnected(Rc<dyn CustomElement>),
    AttributeChanged {
        element: Rc<dyn CustomElement>,
        name: String,
        old: Option<String>,
        new: Option<String>,
    },
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let body = NodeId(nodes.insert(Node {
            parent: None,
            data: NodeData::Body {
                children: Vec::new(),
            },
        }));

        Self {
            inner: Rc::new(DocumentInner {
                tree: RefCell::new(Tree {
                    nodes,
                    body,
                    mutations: 0,
                    adopted: Vec::new(),
                }),
                registry: RefCell::new(CustomElementRegistry::default()),
                pending: RefCell::new(Vec::new()),
                batch_depth: Cell::new(0),
            }),
        }
    }

    /// The root every connected node descends from.
    pub fn body(&self) -> NodeId {
        self.inner.tree.borrow().body
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn tree(&self) -> std::cell::Ref<'_, Tree> {
        self.inner.tree.borrow()
    }

    // ---------------------------------------------------------------------------------------------------------
    // Custom element registry
    // ---------------------------------------------------------------------------------------------------------

    /// Define a custom element. Elements of that name which are already connected get upgraded.
    pub fn define(&self, name: &str, definition: ElementDefinition) -> Result<(), DomError> {
        let extends = definition.extends.clone();
        self.inner.registry.borrow_mut().insert(name, definition)?;
        tracing::debug!("defined custom element `{name}`");

        self.mutate(|tree, reactions| {
            let body = tree.body;
            tree.preorder(body, &mut |id, node| {
                if let NodeData::Element(el) = &node.data {
                    let matches = match &extends {
                        Some(tag) => el.is.as_deref() == Some(name) && &el.tag == tag,
                        None => el.is.is_none() && el.tag == name,
                    };
                    if matches && el.custom.is_none() {
                        reactions.push(Reaction::Upgrade(id));
                    }
                }
            });
            Ok(())
        })
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner.registry.borrow().is_defined(name)
    }

    pub fn definition(&self, name: &str) -> Option<ElementDefinition> {
        self.inner.registry.borrow().get(name).cloned()
    }

    /// The custom element bound to an upgraded element.
    pub fn custom_element(&self, node: NodeId) -> Option<Rc<dyn CustomElement>> {
        match &self.tree().nodes.get(node.0)?.data {
            NodeData::Element(el) => el.custom.as_ref().map(|up| up.element.clone()),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------------------------------------------
    // Node creation
    // ---------------------------------------------------------------------------------------------------------

    /// Create an element. If `tag` names a defined autonomous custom element it is constructed immediately.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.create(tag, None)
    }

    /// Create a customized built-in element, e.g. `<button is="x-fancy">`.
    pub fn create_element_is(&self, tag: &str, is: &str) -> NodeId {
        self.create(tag, Some(is))
    }

    fn create(&self, tag: &str, is: Option<&str>) -> NodeId {
        let id = {
            let mut tree = self.inner.tree.borrow_mut();
            let data = ElementData::new(tag.to_string(), is.map(str::to_string));
            NodeId(tree.nodes.insert(Node {
                parent: None,
                data: NodeData::Element(data),
            }))
        };

        let definition = self.inner.registry.borrow().lookup(tag, is).cloned();
        if let Some(definition) = definition {
            self.construct(id, &definition);
        }

        id
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        let mut tree = self.inner.tree.borrow_mut();
        NodeId(tree.nodes.insert(Node {
            parent: None,
            data: NodeData::Text(text.to_string()),
        }))
    }

    /// Run the definition's constructor and bind the result to the element.
    fn construct(&self, id: NodeId, definition: &ElementDefinition) {
        let element = definition.constructor.construct(self, id);
        let mut tree = self.inner.tree.borrow_mut();
        if let Some(NodeData::Element(el)) = tree.nodes.get_mut(id.0).map(|n| &mut n.data) {
            el.custom = Some(Upgraded {
                element,
                observed: definition.observed_attributes.clone(),
            });
        }
    }

    // ---------------------------------------------------------------------------------------------------------
    // Tree mutation
    // ---------------------------------------------------------------------------------------------------------

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end when `reference` is `None`.
    ///
    /// A child that already has a parent is moved: it is disconnected from its old position first.
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if reference == Some(child) {
            return Ok(());
        }

        self.mutate(|tree, reactions| {
            tree.check_insertion(parent, child)?;
            if let Some(reference) = reference {
                if tree.node(reference)?.parent != Some(parent) {
                    return Err(DomError::HierarchyRequest("reference is not a child of parent"));
                }
            }

            tree.detach(child, reactions)?;

            let children = tree
                .node_mut(parent)?
                .data
                .children_mut()
                .ok_or(DomError::HierarchyRequest("text nodes cannot have children"))?;
            let index = match reference {
                Some(reference) => children
                    .iter()
                    .position(|c| *c == reference)
                    .unwrap_or(children.len()),
                None => children.len(),
            };
            children.insert(index, child);
            tree.node_mut(child)?.parent = Some(parent);
            tree.mutations += 1;

            if tree.is_connected(parent) {
                tree.collect_connected(child, reactions, &self.inner.registry.borrow());
            }
            Ok(())
        })
    }

    /// Replace `old` (a child of `parent`) with `new`.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> Result<(), DomError> {
        if new == old {
            return Ok(());
        }

        self.batch(|| {
            self.insert_before(parent, new, Some(old))?;
            self.remove_child(parent, old)
        })?
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.mutate(|tree, reactions| {
            if tree.node(child)?.parent != Some(parent) {
                return Err(DomError::HierarchyRequest("node is not a child of parent"));
            }
            tree.detach(child, reactions)
        })
    }

    /// Detach a node from its parent, if it has one.
    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.mutate(|tree, reactions| tree.detach(node, reactions))
    }

    /// Free a detached node and everything below it, including shadow trees.
    pub fn destroy(&self, node: NodeId) -> Result<(), DomError> {
        let removed = {
            let mut tree = self.inner.tree.borrow_mut();
            let target = tree.node(node)?;
            if target.parent.is_some()
                || matches!(target.data, NodeData::Body { .. } | NodeData::ShadowRoot(_))
            {
                return Err(DomError::HierarchyRequest("only detached nodes can be destroyed"));
            }

            let mut ids = Vec::new();
            tree.preorder(node, &mut |id, _| ids.push(id));
            ids.into_iter()
                .filter_map(|id| tree.nodes.try_remove(id.0))
                .collect::<Vec<_>>()
        };

        // Custom element instances are dropped here, with the tree released.
        drop(removed);
        Ok(())
    }

    pub fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.mutate(|tree, reactions| {
            let el = tree.element_mut(element)?;
            let old = match el.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
                None => {
                    el.attributes.push((name.to_string(), value.to_string()));
                    None
                }
            };
            queue_attribute_changed(el, reactions, name, old, Some(value.to_string()));
            tree.mutations += 1;
            Ok(())
        })
    }

    pub fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), DomError> {
        self.mutate(|tree, reactions| {
            let el = tree.element_mut(element)?;
            let Some(index) = el.attributes.iter().position(|(key, _)| key == name) else {
                return Ok(());
            };
            let (_, old) = el.attributes.remove(index);
            queue_attribute_changed(el, reactions, name, Some(old), None);
            tree.mutations += 1;
            Ok(())
        })
    }

    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        let mut tree = self.inner.tree.borrow_mut();
        match &mut tree.node_mut(node)?.data {
            NodeData::Text(existing) => {
                *existing = text.to_string();
            }
            _ => return Err(DomError::HierarchyRequest("set_text requires a text node")),
        }
        tree.mutations += 1;
        Ok(())
    }

    /// Attach a shadow root to `host` and return it.
    pub fn attach_shadow(&self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let mut tree = self.inner.tree.borrow_mut();
        let el = tree.element(host)?;
        if el.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let autonomous = el.is.is_none() && crate::is_valid_custom_element_name(&el.tag);
        if !autonomous && !SHADOW_HOSTS.contains(&el.tag.as_str()) {
            return Err(DomError::ShadowNotSupported(el.tag.clone()));
        }

        let root = NodeId(tree.nodes.insert(Node {
            parent: None,
            data: NodeData::ShadowRoot(ShadowRootData {
                host,
                mode,
                children: Vec::new(),
                adopted: Vec::new(),
            }),
        }));
        tree.element_mut(host)?.shadow_root = Some(root);
        Ok(root)
    }

    /// Replace the stylesheets adopted by a shadow root, or by the document when given the body.
    pub fn set_adopted_style_sheets(
        &self,
        root: NodeId,
        sheets: Vec<StyleSheet>,
    ) -> Result<(), DomError> {
        let mut tree = self.inner.tree.borrow_mut();
        if root == tree.body {
            tree.adopted = sheets;
            return Ok(());
        }
        match &mut tree.node_mut(root)?.data {
            NodeData::ShadowRoot(shadow) => shadow.adopted = sheets,
            _ => {
                return Err(DomError::HierarchyRequest(
                    "stylesheets can only be adopted by shadow roots or the document",
                ))
            }
        }
        Ok(())
    }

    pub fn adopted_style_sheets(&self, root: NodeId) -> Vec<StyleSheet> {
        let tree = self.tree();
        if root == tree.body {
            return tree.adopted.clone();
        }
        match tree.nodes.get(root.0).map(|n| &n.data) {
            Some(NodeData::ShadowRoot(shadow)) => shadow.adopted.clone(),
            _ => Vec::new(),
        }
    }

    // ---------------------------------------------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------------------------------------------

    pub fn add_event_listener(
        &self,
        element: NodeId,
        event: &str,
        handler: impl Fn(&Event) + 'static,
    ) -> Result<(), DomError> {
        let mut tree = self.inner.tree.borrow_mut();
        tree.element_mut(element)?
            .listeners
            .push(Listener::new(event, handler));
        Ok(())
    }

    /// Replace every listener on an element. Listener changes are not recorded as mutations.
    pub fn set_listeners(&self, element: NodeId, listeners: Vec<Listener>) -> Result<(), DomError> {
        let mut tree = self.inner.tree.borrow_mut();
        tree.element_mut(element)?.listeners = listeners;
        Ok(())
    }

    /// Dispatch an event at `target` and bubble it up through the shadow-including ancestors.
    pub fn dispatch_event(&self, target: NodeId, name: &str) -> Result<(), DomError> {
        let path = {
            let tree = self.tree();
            tree.node(target)?;

            let mut path = Vec::new();
            let mut cursor = Some(target);
            while let Some(id) = cursor {
                if let Ok(el) = tree.element(id) {
                    let listeners: Vec<_> = el
                        .listeners
                        .iter()
                        .filter(|l| &*l.event == name)
                        .map(|l| l.handler.clone())
                        .collect();
                    if !listeners.is_empty() {
                        path.push((id, listeners));
                    }
                }
                cursor = tree.host_or_parent(id);
            }
            path
        };

        tracing::trace!("dispatching `{name}` to {target:?} through {} nodes", path.len());

        let event = Event::new(Rc::from(name), target);
        for (node, handlers) in path {
            event.set_current_target(node);
            for handler in handlers {
                handler(&event);
            }
            if !event.propagates() {
                break;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------------------------------------

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree().nodes.contains(node.0)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.tree().nodes.get(node.0).map(|n| n.data.kind())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree().nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree()
            .nodes
            .get(node.0)
            .map(|n| n.data.children().to_vec())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.tree().element(node).ok().map(|el| el.tag.clone())
    }

    /// The `is` value of a customized built-in element.
    pub fn is_value(&self, node: NodeId) -> Option<String> {
        self.tree().element(node).ok()?.is.clone()
    }

    pub fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.tree()
            .element(element)
            .ok()?
            .attribute(name)
            .map(str::to_string)
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.attribute(element, name).is_some()
    }

    pub fn attributes(&self, element: NodeId) -> Vec<(String, String)> {
        self.tree()
            .element(element)
            .map(|el| el.attributes.clone())
            .unwrap_or_default()
    }

    /// The data of a text node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.tree().nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// The concatenated text of every light-DOM descendant.
    pub fn text_content(&self, node: NodeId) -> String {
        let tree = self.tree();
        let mut out = String::new();
        tree.light_preorder(node, &mut |_, n| {
            if let NodeData::Text(text) = &n.data {
                out.push_str(text);
            }
        });
        out
    }

    /// The open shadow root hosted by an element. Closed roots are not exposed.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        let root = tree.element(host).ok()?.shadow_root?;
        match &tree.nodes.get(root.0)?.data {
            NodeData::ShadowRoot(shadow) if shadow.mode == ShadowRootMode::Open => Some(root),
            _ => None,
        }
    }

    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match &self.tree().nodes.get(root.0)?.data {
            NodeData::ShadowRoot(shadow) => Some(shadow.host),
            _ => None,
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree().is_connected(node)
    }

    /// Light-DOM descendants of `root` with the given tag, in tree order.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let tree = self.tree();
        let mut found = Vec::new();
        tree.light_preorder(root, &mut |id, n| {
            if let NodeData::Element(el) = &n.data {
                if id != root && el.tag == tag {
                    found.push(id);
                }
            }
        });
        found
    }

    pub(crate) fn key(&self, element: NodeId) -> Option<Rc<str>> {
        self.tree().element(element).ok()?.key.clone()
    }

    pub(crate) fn set_key(&self, element: NodeId, key: Option<Rc<str>>) -> Result<(), DomError> {
        self.inner.tree.borrow_mut().element_mut(element)?.key = key;
        Ok(())
    }

    /// The number of attribute, child list and character data mutations applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.tree().mutations
    }

    // ---------------------------------------------------------------------------------------------------------
    // Reactions
    // ---------------------------------------------------------------------------------------------------------

    /// Run `f`, deferring every custom element reaction it causes until it returns.
    ///
    /// Batches nest; reactions run when the outermost batch finishes. The first callback error is returned, any
    /// further ones are logged.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, DomError> {
        let depth = self.inner.batch_depth.get();
        self.inner.batch_depth.set(depth + 1);
        let out = f();
        self.inner.batch_depth.set(depth);

        if depth == 0 {
            self.flush_reactions()?;
        }
        Ok(out)
    }

    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Tree, &mut Vec<Reaction>) -> Result<R, DomError>,
    ) -> Result<R, DomError> {
        let out = {
            let mut tree = self.inner.tree.borrow_mut();
            let mut pending = self.inner.pending.borrow_mut();
            f(&mut tree, &mut pending)
        };

        // Reactions queued before a failure still describe mutations that happened.
        if self.inner.batch_depth.get() == 0 {
            self.flush_reactions()?;
        }
        out
    }

    fn flush_reactions(&self) -> Result<(), DomError> {
        let reactions = std::mem::take(&mut *self.inner.pending.borrow_mut());
        let mut first_error = None;

        for reaction in reactions {
            if let Err(err) = self.run_reaction(reaction) {
                match first_error {
                    None => first_error = Some(err),
                    Some(_) => tracing::error!("custom element callback failed: {err}"),
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_reaction(&self, reaction: Reaction) -> Result<(), DomError> {
        match reaction {
            Reaction::Upgrade(node) => self.upgrade(node),
            Reaction::Connected(node, element) => element.connected().map_err(|source| {
                DomError::Callback {
                    element: self.tag(node).unwrap_or_default(),
                    source,
                }
            }),
            Reaction::Disconnected(element) => {
                element.disconnected();
                Ok(())
            }
            Reaction::AttributeChanged {
                element,
                name,
                old,
                new,
            } => {
                element.attribute_changed(&name, old.as_deref(), new.as_deref());
                Ok(())
            }
        }
    }

    /// Upgrade an element created before its definition existed.
    fn upgrade(&self, node: NodeId) -> Result<(), DomError> {
        let (definition, attributes) = {
            let tree = self.tree();
            let Ok(el) = tree.element(node) else {
                return Ok(());
            };
            if el.custom.is_some() {
                return Ok(());
            }
            let registry = self.inner.registry.borrow();
            let Some(definition) = registry.lookup(&el.tag, el.is.as_deref()).cloned() else {
                return Ok(());
            };
            (definition, el.attributes.clone())
        };

        tracing::trace!("upgrading {node:?}");
        self.construct(node, &definition);
        let Some(element) = self.custom_element(node) else {
            return Ok(());
        };

        for (name, value) in attributes {
            if definition.observed_attributes.contains(&name) {
                element.attribute_changed(&name, None, Some(&value));
            }
        }

        if self.is_connected(node) {
            element.connected().map_err(|source| DomError::Callback {
                element: self.tag(node).unwrap_or_default(),
                source,
            })?;
        }
        Ok(())
    }
}

fn queue_attribute_changed(
    el: &ElementData,
    reactions: &mut Vec<Reaction>,
    name: &str,
    old: Option<String>,
    new: Option<String>,
) {
    if let Some(upgraded) = &el.custom {
        if upgraded.observed.iter().any(|observed| observed == name) {
            reactions.push(Reaction::AttributeChanged {
                element: upgraded.element.clone(),
                name: name.to_string(),
                old,
                new,
            });
        }
    }
}

impl Tree {
    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    pub(crate) fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        match &self.node(id)?.data {
            NodeData::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    /// The parent of a node, or the host of a shadow root.
    fn host_or_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(id.0)?;
        match &node.data {
            NodeData::ShadowRoot(shadow) => Some(shadow.host),
            _ => node.parent,
        }
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(current.0) {
                Some(Node {
                    data: NodeData::Body { .. },
                    ..
                }) => return true,
                Some(_) => cursor = self.host_or_parent(current),
                None => return false,
            }
        }
        false
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if matches!(self.node(parent)?.data, NodeData::Text(_)) {
            return Err(DomError::HierarchyRequest("text nodes cannot have children"));
        }
        if matches!(
            self.node(child)?.data,
            NodeData::Body { .. } | NodeData::ShadowRoot(_)
        ) {
            return Err(DomError::HierarchyRequest(
                "the body and shadow roots cannot be inserted",
            ));
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(DomError::HierarchyRequest(
                    "a node cannot be inserted into itself or its descendants",
                ));
            }
            cursor = self.host_or_parent(current);
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId, reactions: &mut Vec<Reaction>) -> Result<(), DomError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let was_connected = self.is_connected(parent);

        if let Some(children) = self.node_mut(parent)?.data.children_mut() {
            children.retain(|c| *c != child);
        }
        self.node_mut(child)?.parent = None;
        self.mutations += 1;

        if was_connected {
            self.preorder(child, &mut |_, node| {
                if let NodeData::Element(ElementData {
                    custom: Some(upgraded),
                    ..
                }) = &node.data
                {
                    reactions.push(Reaction::Disconnected(upgraded.element.clone()));
                }
            });
        }
        Ok(())
    }

    fn collect_connected(
        &self,
        root: NodeId,
        reactions: &mut Vec<Reaction>,
        registry: &CustomElementRegistry,
    ) {
        self.preorder(root, &mut |id, node| {
            if let NodeData::Element(el) = &node.data {
                match &el.custom {
                    Some(upgraded) => reactions.push(Reaction::Connected(id, upgraded.element.clone())),
                    None if registry.lookup(&el.tag, el.is.as_deref()).is_some() => {
                        reactions.push(Reaction::Upgrade(id))
                    }
                    None => {}
                }
            }
        });
    }

    /// Shadow-including preorder: a node, then its shadow tree, then its children.
    pub(crate) fn preorder(&self, root: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        self.walk(root, true, f)
    }

    /// Preorder over the light tree only.
    pub(crate) fn light_preorder(&self, root: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        self.walk(root, false, f)
    }

    fn walk(&self, root: NodeId, shadow_including: bool, f: &mut impl FnMut(NodeId, &Node)) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            f(id, node);
            stack.extend(node.data.children().iter().rev().copied());
            if shadow_including {
                if let NodeData::Element(ElementData {
                    shadow_root: Some(shadow),
                    ..
                }) = &node.data
                {
                    stack.push(*shadow);
                }
            }
        }
    }
}
