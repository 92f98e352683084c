//! View descriptions.
//!
//! A [`VNode`] describes the structure a render root should have. It is cheap to build, holds no document
//! state, and is reconciled into the live tree by [`crate::patch`].

use std::{fmt::Debug, rc::Rc};

use crate::{Event, Listener};

/// A node in a view description.
#[derive(Clone)]
pub enum VNode {
    /// An element node.
    Element(VElement),

    /// A text node.
    Text(VText),

    /// A list of siblings without a wrapping element. Fragments are flattened into their parent when patched.
    Fragment(Vec<VNode>),
}

impl VNode {
    /// An empty view.
    pub fn empty() -> Self {
        VNode::Fragment(Vec::new())
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VNode::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Push this node's non-fragment nodes onto `out`, in order.
    pub(crate) fn flatten_into<'a>(&'a self, out: &mut Vec<&'a VNode>) {
        match self {
            VNode::Fragment(nodes) => {
                for node in nodes {
                    node.flatten_into(out);
                }
            }
            node => out.push(node),
        }
    }
}

impl Debug for VNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VNode::Element(el) => el.fmt(f),
            VNode::Text(text) => write!(f, "{:?}", text.text),
            VNode::Fragment(nodes) => f.debug_list().entries(nodes).finish(),
        }
    }
}

/// An element in a view description.
#[derive(Clone)]
pub struct VElement {
    pub tag: Rc<str>,
    pub attributes: Vec<Attribute>,
    pub listeners: Vec<Listener>,
    pub children: Vec<VNode>,
    /// Elements whose key changes between renders are replaced rather than updated in place.
    pub key: Option<Rc<str>>,
}

impl Debug for VElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VElement")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("listeners", &self.listeners)
            .field("children", &self.children)
            .field("key", &self.key)
            .finish()
    }
}

/// An attribute on an element, such as `id="my-thing"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: Rc<str>,
    pub value: Rc<str>,
}

/// A text node in a view description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VText {
    pub text: Rc<str>,
}

/// Start describing an element.
///
/// ```rust
/// use strand_dom::{h, text};
///
/// let view = h("button")
///     .attr("class", "primary")
///     .on("click", |_| println!("clicked"))
///     .child(text("Click me"));
/// ```
pub fn h(tag: impl Into<Rc<str>>) -> VElement {
    VElement {
        tag: tag.into(),
        attributes: Vec::new(),
        listeners: Vec::new(),
        children: Vec::new(),
        key: None,
    }
}

/// Describe a text node.
pub fn text(text: impl Into<Rc<str>>) -> VNode {
    VNode::Text(VText { text: text.into() })
}

/// Describe several sibling nodes.
pub fn fragment(nodes: impl IntoIterator<Item = impl Into<VNode>>) -> VNode {
    VNode::Fragment(nodes.into_iter().map(Into::into).collect())
}

impl VElement {
    /// Set an attribute. Setting the same name twice keeps the last value.
    pub fn attr(mut self, name: impl Into<Rc<str>>, value: impl ToString) -> Self {
        let name = name.into();
        let value: Rc<str> = value.to_string().into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
        self
    }

    /// Set a boolean attribute: present (with an empty value) when `on` is true, absent otherwise.
    pub fn flag(self, name: impl Into<Rc<str>>, on: bool) -> Self {
        if on {
            self.attr(name, "")
        } else {
            self
        }
    }

    pub fn on(mut self, event: impl Into<Rc<str>>, handler: impl Fn(&Event) + 'static) -> Self {
        self.listeners.push(Listener::new(event, handler));
        self
    }

    pub fn key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string().into());
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = impl Into<VNode>>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| &*attr.name == name)
            .map(|attr| &*attr.value)
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        VNode::Element(el)
    }
}

impl From<VText> for VNode {
    fn from(text: VText) -> Self {
        VNode::Text(text)
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        text(value)
    }
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(VNode::empty)
    }
}

impl From<Vec<VNode>> for VNode {
    fn from(nodes: Vec<VNode>) -> Self {
        VNode::Fragment(nodes)
    }
}
