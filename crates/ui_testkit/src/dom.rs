//! The live host tree owned by a container.
//!
//! Render passes produce [`HostNode`] trees; [`Document::commit`] reconciles
//! them into persistent nodes by position, so an element keeps its
//! [`NodeId`] (and its live form value and focus) for as long as the same
//! tag keeps rendering at the same place.

use crate::event::{EventKind, Listener};
use crate::style::StyleMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

/// Identity of a node in one container's document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Output of a render pass.
pub(crate) enum HostNode {
    Text(String),
    Element(HostElement),
}

pub(crate) struct HostElement {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) style: StyleMap,
    pub(crate) listeners: Vec<(EventKind, Listener)>,
    pub(crate) value: Option<String>,
    pub(crate) children: Vec<HostNode>,
}

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) style: StyleMap,
    listeners: Vec<(EventKind, Listener)>,
    value: String,
}

enum NodeKind {
    Text(String),
    Element(ElementData),
}

struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

const FORM_VALUE_TAGS: &[&str] = &["input", "textarea", "select"];

/// Elements that cannot have children.
pub(crate) const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) struct Document {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    next_id: u64,
    focused: Option<NodeId>,
}

impl Document {
    /// An empty document whose root is the container `<div>`.
    pub(crate) fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(ElementData {
                    tag: "div".to_string(),
                    attrs: BTreeMap::new(),
                    style: StyleMap::new(),
                    listeners: Vec::new(),
                    value: String::new(),
                }),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            focused: None,
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` is still part of the tree.
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn commit(&mut self, nodes: Vec<HostNode>) {
        let root = self.root;
        self.reconcile_children(root, nodes);
    }

    /// Drop every node, including the root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.focused = None;
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn reconcile_children(&mut self, parent: NodeId, hosts: Vec<HostNode>) {
        let old = self
            .nodes
            .get(&parent)
            .map(|node| node.children.clone())
            .unwrap_or_default();

        let mut next = Vec::with_capacity(hosts.len());
        for (index, host) in hosts.into_iter().enumerate() {
            let id = match old.get(index).copied() {
                Some(existing) if self.same_kind(existing, &host) => {
                    self.patch(existing, host);
                    existing
                }
                Some(existing) => {
                    self.remove_subtree(existing);
                    self.create(parent, host)
                }
                None => self.create(parent, host),
            };
            next.push(id);
        }
        for stale in old.iter().skip(next.len()) {
            self.remove_subtree(*stale);
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children = next;
        }
    }

    fn same_kind(&self, id: NodeId, host: &HostNode) -> bool {
        match (self.nodes.get(&id).map(|node| &node.kind), host) {
            (Some(NodeKind::Text(_)), HostNode::Text(_)) => true,
            (Some(NodeKind::Element(existing)), HostNode::Element(element)) => {
                existing.tag == element.tag
            }
            _ => false,
        }
    }

    fn create(&mut self, parent: NodeId, host: HostNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        match host {
            HostNode::Text(text) => {
                self.nodes.insert(
                    id,
                    NodeData {
                        parent: Some(parent),
                        children: Vec::new(),
                        kind: NodeKind::Text(text),
                    },
                );
            }
            HostNode::Element(element) => {
                let HostElement {
                    tag,
                    attrs,
                    style,
                    listeners,
                    value,
                    children,
                } = element;
                let value = value
                    .or_else(|| attrs.get("value").cloned())
                    .unwrap_or_default();
                self.nodes.insert(
                    id,
                    NodeData {
                        parent: Some(parent),
                        children: Vec::new(),
                        kind: NodeKind::Element(ElementData {
                            tag,
                            attrs,
                            style,
                            listeners,
                            value,
                        }),
                    },
                );
                self.reconcile_children(id, children);
            }
        }
        id
    }

    fn patch(&mut self, id: NodeId, host: HostNode) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let children = match (&mut node.kind, host) {
            (NodeKind::Text(current), HostNode::Text(text)) => {
                *current = text;
                return;
            }
            (NodeKind::Element(current), HostNode::Element(element)) => {
                current.attrs = element.attrs;
                current.style = element.style;
                current.listeners = element.listeners;
                // Uncontrolled controls keep whatever the user typed.
                if let Some(value) = element.value {
                    current.value = value;
                }
                element.children
            }
            _ => return,
        };
        self.reconcile_children(id, children);
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if self.focused == Some(id) {
            self.focused = None;
        }
        for child in node.children {
            self.remove_subtree(child);
        }
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    pub(crate) fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub(crate) fn style(&self, id: NodeId) -> Option<&StyleMap> {
        self.element(id).map(|element| &element.style)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Parent chain, nearest first.
    pub(crate) fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            out.push(node);
            current = self.parent(node);
        }
        out
    }

    /// `id` itself, then its ancestors.
    pub(crate) fn closest(&self, id: NodeId, predicate: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|node| predicate(*node))
    }

    /// Descendant elements of `id` (excluding it) in document order.
    pub(crate) fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// `id` and its descendant elements in document order.
    pub(crate) fn subtree_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.is_element(id) {
            out.push(id);
        }
        out.extend(self.descendant_elements(id));
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub(crate) fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Text of direct text children only.
    pub(crate) fn own_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|child| match &self.nodes.get(child)?.kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element(_) => None,
            })
            .collect()
    }

    /// First element in document order with the given `id` attribute.
    pub(crate) fn by_id(&self, html_id: &str) -> Option<NodeId> {
        self.descendant_elements(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(html_id))
    }

    pub(crate) fn has_form_value(&self, id: NodeId) -> bool {
        self.tag(id)
            .is_some_and(|tag| FORM_VALUE_TAGS.contains(&tag))
    }

    /// Live value of a form control.
    pub(crate) fn value(&self, id: NodeId) -> Option<&str> {
        if !self.has_form_value(id) {
            return None;
        }
        self.element(id).map(|element| element.value.as_str())
    }

    pub(crate) fn set_value(&mut self, id: NodeId, value: String) {
        if let Some(NodeData {
            kind: NodeKind::Element(element),
            ..
        }) = self.nodes.get_mut(&id)
        {
            element.value = value;
        }
    }

    pub(crate) fn listeners(&self, id: NodeId, kind: EventKind) -> Vec<Listener> {
        self.element(id)
            .map(|element| {
                element
                    .listeners
                    .iter()
                    .filter(|(listens_for, _)| *listens_for == kind)
                    .map(|(_, listener)| Listener::clone(listener))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub(crate) fn set_focused(&mut self, id: Option<NodeId>) {
        self.focused = id.filter(|node| self.contains(*node));
    }

    /// Indented markup of the subtree at `id`, cut at `limit` characters.
    pub(crate) fn pretty(&self, id: NodeId, limit: usize) -> String {
        let mut out = String::new();
        self.write_pretty(id, 0, &mut out);
        let out = out.trim_end();
        if out.chars().count() > limit {
            let mut cut: String = out.chars().take(limit).collect();
            cut.push_str("...");
            cut
        } else {
            out.to_string()
        }
    }

    fn write_pretty(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Text(text) => {
                if !text.trim().is_empty() {
                    let _ = writeln!(out, "{indent}{}", text.trim());
                }
            }
            NodeKind::Element(element) => {
                let _ = write!(out, "{indent}<{}", element.tag);
                for (name, value) in &element.attrs {
                    if name == "value" && self.has_form_value(id) {
                        continue;
                    }
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{value}\"");
                    }
                }
                if self.has_form_value(id) && !element.value.is_empty() {
                    let _ = write!(out, " value=\"{}\"", element.value);
                }
                if !element.style.is_empty() {
                    let _ = write!(out, " style=\"{}\"", element.style);
                }
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    let _ = writeln!(out, " />");
                    return;
                }
                let _ = writeln!(out, ">");
                for child in &node.children {
                    self.write_pretty(*child, depth + 1, out);
                }
                let _ = writeln!(out, "{indent}</{}>", element.tag);
            }
        }
    }
}
