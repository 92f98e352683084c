//! Reconcile live nodes with a view description.
//!
//! The algorithm walks the live children of a root and the flattened children of the description side by side:
//!
//! - nodes of a different kind, tag or key are replaced;
//! - text nodes get their data updated, elements get their attributes and listeners updated and their children
//!   patched recursively;
//! - extra descriptions are appended and extra live nodes are removed and destroyed.
//!
//! Patching the same description twice produces no mutations the second time.

use std::cmp::min;

use crate::{Document, DomError, NodeId, NodeKind, VElement, VNode};

/// Make the children of `root` match `view`.
///
/// All custom element reactions caused by the patch run after the whole patch has been applied, so nested custom
/// elements connect into a tree that already reflects the full description.
pub fn patch(document: &Document, root: NodeId, view: &VNode) -> Result<(), DomError> {
    let mut nodes = Vec::new();
    view.flatten_into(&mut nodes);

    document.batch(|| patch_children(document, root, &nodes))?
}

fn patch_children(document: &Document, parent: NodeId, new: &[&VNode]) -> Result<(), DomError> {
    let old = document.children(parent);
    let common = min(old.len(), new.len());

    for (old_child, new_child) in old.iter().zip(new.iter()).take(common) {
        patch_node(document, parent, *old_child, new_child)?;
    }

    for new_child in &new[common..] {
        let created = create(document, new_child)?;
        document.append_child(parent, created)?;
    }

    for old_child in &old[common..] {
        document.remove_child(parent, *old_child)?;
        document.destroy(*old_child)?;
    }

    Ok(())
}

fn patch_node(document: &Document, parent: NodeId, old: NodeId, new: &VNode) -> Result<(), DomError> {
    match (document.kind(old), new) {
        (Some(NodeKind::Text), VNode::Text(text)) => {
            if document.text(old).as_deref() != Some(&*text.text) {
                document.set_text(old, &text.text)?;
            }
            Ok(())
        }
        (Some(NodeKind::Element), VNode::Element(el)) if same_element(document, old, el) => {
            update_element(document, old, el)
        }
        _ => {
            tracing::trace!("replacing {old:?} with {new:?}");
            let created = create(document, new)?;
            document.replace_child(parent, created, old)?;
            document.destroy(old)
        }
    }
}

fn same_element(document: &Document, node: NodeId, el: &VElement) -> bool {
    document.tag(node).as_deref() == Some(&*el.tag)
        && document.is_value(node).as_deref() == el.attribute("is")
        && document.key(node) == el.key
}

fn update_element(document: &Document, node: NodeId, el: &VElement) -> Result<(), DomError> {
    let live = document.attributes(node);

    for attr in el.attributes.iter().filter(|attr| &*attr.name != "is") {
        let current = live
            .iter()
            .find(|(name, _)| name.as_str() == &*attr.name)
            .map(|(_, value)| value.as_str());
        if current != Some(&*attr.value) {
            document.set_attribute(node, &attr.name, &attr.value)?;
        }
    }

    for (name, _) in &live {
        if el.attribute(name).is_none() {
            document.remove_attribute(node, name)?;
        }
    }

    document.set_listeners(node, el.listeners.clone())?;

    // A custom element owns its light DOM unless the description explicitly provides content for it.
    if document.custom_element(node).is_some() && el.children.is_empty() {
        return Ok(());
    }

    let mut children = Vec::new();
    for child in &el.children {
        child.flatten_into(&mut children);
    }
    patch_children(document, node, &children)
}

fn create(document: &Document, node: &VNode) -> Result<NodeId, DomError> {
    let el = match node {
        VNode::Text(text) => return Ok(document.create_text(&text.text)),
        VNode::Fragment(_) => {
            return Err(DomError::HierarchyRequest(
                "fragments are flattened before nodes are created",
            ))
        }
        VNode::Element(el) => el,
    };

    let id = match el.attribute("is") {
        Some(is) => document.create_element_is(&el.tag, is),
        None => document.create_element(&el.tag),
    };
    document.set_key(id, el.key.clone())?;

    for attr in el.attributes.iter().filter(|attr| &*attr.name != "is") {
        document.set_attribute(id, &attr.name, &attr.value)?;
    }
    document.set_listeners(id, el.listeners.clone())?;

    let mut children = Vec::new();
    for child in &el.children {
        child.flatten_into(&mut children);
    }
    for child in children {
        let created = create(document, child)?;
        document.append_child(id, created)?;
    }

    Ok(id)
}
