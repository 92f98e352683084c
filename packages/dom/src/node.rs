use std::rc::Rc;

use crate::{CustomElement, Listener, StyleSheet};

/// A node's unique identifier inside a [`crate::Document`].
///
/// Ids are slab keys, so the id of a destroyed node may be handed out again later.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// The encapsulation mode of a shadow root.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

/// What kind of node an id refers to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// The document body. It is always connected.
    Body,
    Element,
    Text,
    ShadowRoot,
}

pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

pub(crate) enum NodeData {
    Body { children: Vec<NodeId> },
    Element(ElementData),
    Text(String),
    ShadowRoot(ShadowRootData),
}

impl NodeData {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodeData::Body { .. } => NodeKind::Body,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::ShadowRoot(_) => NodeKind::ShadowRoot,
        }
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match self {
            NodeData::Body { children } => children,
            NodeData::Element(el) => &el.children,
            NodeData::ShadowRoot(root) => &root.children,
            NodeData::Text(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeData::Body { children } => Some(children),
            NodeData::Element(el) => Some(&mut el.children),
            NodeData::ShadowRoot(root) => Some(&mut root.children),
            NodeData::Text(_) => None,
        }
    }
}

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) is: Option<String>,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) listeners: Vec<Listener>,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) custom: Option<Upgraded>,
    /// The key of the view description this element was created from.
    pub(crate) key: Option<Rc<str>>,
}

impl ElementData {
    pub(crate) fn new(tag: String, is: Option<String>) -> Self {
        Self {
            tag,
            is,
            attributes: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
            shadow_root: None,
            custom: None,
            key: None,
        }
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The custom element instance bound to an upgraded element.
#[derive(Clone)]
pub(crate) struct Upgraded {
    pub(crate) element: Rc<dyn CustomElement>,
    pub(crate) observed: Rc<[String]>,
}

pub(crate) struct ShadowRootData {
    pub(crate) host: NodeId,
    pub(crate) mode: ShadowRootMode,
    pub(crate) children: Vec<NodeId>,
    pub(crate) adopted: Vec<StyleSheet>,
}
