//! Serialize parts of the document to HTML.
//!
//! Shadow roots are written as declarative shadow DOM (`<template shadowrootmode="...">`) at the start of their
//! host's content, so the output round-trips through an HTML parser that understands them. Closed roots are left
//! out of their host's markup, the same way `shadow_root` hides them.

use std::fmt::Write;

use askama_escape::{escape, Html};

use crate::{
    document::Tree,
    node::{Node, NodeData},
    Document, NodeId, ShadowRootMode,
};

impl Document {
    /// The HTML of a node's children. For shadow roots this is the shadow tree's content.
    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree();
        let mut out = String::new();
        if let Some(node) = tree.nodes.get(node.0) {
            for child in node.data.children() {
                write_node(&tree, *child, &mut out);
            }
        }
        out
    }

    /// The HTML of a node and its content.
    pub fn outer_html(&self, node: NodeId) -> String {
        let tree = self.tree();
        let mut out = String::new();
        write_node(&tree, node, &mut out);
        out
    }
}

fn is_open(tree: &Tree, root: NodeId) -> bool {
    matches!(
        tree.nodes.get(root.0).map(|node| &node.data),
        Some(NodeData::ShadowRoot(shadow)) if shadow.mode == ShadowRootMode::Open
    )
}

fn write_node(tree: &Tree, id: NodeId, out: &mut String) {
    let Some(Node { data, .. }) = tree.nodes.get(id.0) else {
        return;
    };

    match data {
        NodeData::Text(text) => {
            _ = write!(out, "{}", escape(text, Html));
        }
        NodeData::Body { children } => {
            out.push_str("<body>");
            for child in children {
                write_node(tree, *child, out);
            }
            out.push_str("</body>");
        }
        NodeData::ShadowRoot(shadow) => {
            _ = write!(out, "<template shadowrootmode=\"{}\">", shadow.mode.as_str());
            for child in &shadow.children {
                write_node(tree, *child, out);
            }
            out.push_str("</template>");
        }
        NodeData::Element(el) => {
            _ = write!(out, "<{}", el.tag);
            if let Some(is) = &el.is {
                _ = write!(out, " is=\"{}\"", escape(is, Html));
            }
            for (name, value) in &el.attributes {
                _ = write!(out, " {name}=\"{}\"", escape(value, Html));
            }
            out.push('>');
            if let Some(shadow) = el.shadow_root.filter(|root| is_open(tree, *root)) {
                write_node(tree, shadow, out);
            }
            for child in &el.children {
                write_node(tree, *child, out);
            }
            _ = write!(out, "</{}>", el.tag);
        }
    }
}
