#![forbid(unsafe_code)]

//! Arena-backed DOM for hosts and tests.
//!
//! Node ids are arena indices and are never reused, so a node detached by a
//! re-render stays addressable and reports `contains() == false`. Mutations
//! made through [`ContainerDom::insert_before`] (the engine's writes) are
//! journaled for hosts that mirror them onto a real document; the drag
//! library's own relocations go through [`MemoryDom::relocate`] and are not.

use std::collections::BTreeMap;
use std::fmt;

use lanesync_core::{ContainerDom, Marker, NodeId, SyncConfig};
#[cfg(feature = "input-parser")]
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Errors from structural edits on a [`MemoryDom`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebDomError {
    UnknownNode(NodeId),
    /// Inserting `node` under `parent` would make it its own ancestor.
    WouldCycle { node: NodeId, parent: NodeId },
    /// `reference` is not a child of `parent`.
    NotAChild { parent: NodeId, reference: NodeId },
    /// The document root cannot be moved or removed.
    RootImmutable,
}

impl fmt::Display for WebDomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "unknown node {node}"),
            Self::WouldCycle { node, parent } => {
                write!(f, "cannot insert {node} under its descendant {parent}")
            }
            Self::NotAChild { parent, reference } => {
                write!(f, "{reference} is not a child of {parent}")
            }
            Self::RootImmutable => write!(f, "the document root cannot be moved"),
        }
    }
}

impl std::error::Error for WebDomError {}

/// Element description used to build or re-render a subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "input-parser", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "input-parser", serde(default))]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    /// Form control value; `None` for non-inputs.
    pub value: Option<String>,
    pub children: Vec<Element>,
}

impl Default for Element {
    fn default() -> Self {
        Self::new("div")
    }
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn class(mut self, name: impl Into<String>) -> Self {
        self.classes.push(name.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Apply `marker` so that the element matches it.
    #[must_use]
    pub fn marked(self, marker: &Marker) -> Self {
        match marker {
            Marker::Class(name) => self.class(name.clone()),
            Marker::Attribute(name) => self.attr(name.clone(), ""),
        }
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// Builds board markup following a profile's markup contract.
#[derive(Debug, Clone)]
pub struct BoardMarkup<'a> {
    config: &'a SyncConfig,
    root: Element,
}

impl<'a> BoardMarkup<'a> {
    #[must_use]
    pub fn new(config: &'a SyncConfig) -> Self {
        Self {
            config,
            root: Element::new("div").attr("id", format!("{}-board", config.kind.label())),
        }
    }

    /// Lane carrying `state_id`, holding one item per id.
    #[must_use]
    pub fn lane(self, state_id: &str, item_ids: &[&str]) -> Self {
        let lane = Element::new("div")
            .marked(&self.config.lane_marker)
            .attr(self.config.lane_id_attr.clone(), state_id);
        self.push_lane(lane, item_ids)
    }

    /// Lane that is missing its state id attribute.
    #[must_use]
    pub fn unlabelled_lane(self, item_ids: &[&str]) -> Self {
        let lane = Element::new("div").marked(&self.config.lane_marker);
        self.push_lane(lane, item_ids)
    }

    /// Arbitrary extra child of the container.
    #[must_use]
    pub fn element(mut self, element: Element) -> Self {
        self.root.children.push(element);
        self
    }

    /// One draggable item with its drag handle.
    #[must_use]
    pub fn item(config: &SyncConfig, item_id: &str) -> Element {
        Element::new("div")
            .marked(&config.item_marker)
            .attr(config.item_id_attr.clone(), item_id)
            .child(Element::new("span").marked(&config.handle_marker).text("::"))
            .child(Element::new("span").text(item_id))
    }

    #[must_use]
    pub fn build(self) -> Element {
        self.root
    }

    fn push_lane(mut self, lane: Element, item_ids: &[&str]) -> Self {
        let lane = item_ids
            .iter()
            .fold(lane, |lane, id| lane.child(Self::item(self.config, id)));
        self.root.children.push(lane);
        self
    }
}

/// An engine write, for hosts mirroring onto a real document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "input-parser", derive(Serialize))]
#[cfg_attr(feature = "input-parser", serde(tag = "op", rename_all = "snake_case"))]
pub enum DomMutation {
    InsertBefore {
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn from_element(element: &Element, parent: Option<NodeId>) -> Self {
        Self {
            tag: element.tag.clone(),
            classes: element.classes.clone(),
            attrs: element.attrs.clone(),
            text: element.text.clone(),
            value: element.value.clone(),
            parent,
            children: Vec::new(),
        }
    }
}

/// In-memory document implementing [`ContainerDom`].
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    journal: Vec<DomMutation>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document holding only a `body` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::from_element(&Element::new("body"), None)],
            journal: Vec::new(),
        }
    }

    /// Document whose root holds `element`; returns the element's node.
    #[must_use]
    pub fn from_element(element: &Element) -> (Self, NodeId) {
        let mut dom = Self::new();
        let node = dom.build(dom.root(), element);
        (dom, node)
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Nodes ever created, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append `element` (and its subtree) as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, element: &Element) -> Result<NodeId, WebDomError> {
        self.data(parent)?;
        Ok(self.build(parent, element))
    }

    /// Re-render: detach every child of `parent` and build `elements`.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        elements: &[Element],
    ) -> Result<Vec<NodeId>, WebDomError> {
        let old = std::mem::take(&mut self.data_mut(parent)?.children);
        for child in old {
            if let Ok(data) = self.data_mut(child) {
                data.parent = None;
            }
        }
        Ok(elements
            .iter()
            .map(|element| self.build(parent, element))
            .collect())
    }

    /// Detach `node` from its parent.
    pub fn remove(&mut self, node: NodeId) -> Result<(), WebDomError> {
        if node == self.root() {
            return Err(WebDomError::RootImmutable);
        }
        self.data(node)?;
        self.detach(node);
        Ok(())
    }

    /// Move `node` the way the drag library does; not journaled.
    pub fn relocate(
        &mut self,
        node: NodeId,
        parent: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), WebDomError> {
        self.check_insert(parent, node, reference)?;
        self.link(parent, node, reference);
        Ok(())
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.data(node).ok().map(|data| data.tag.as_str())
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.data(node).ok().map(|data| data.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), WebDomError> {
        self.data_mut(node)?.text = text.into();
        Ok(())
    }

    #[must_use]
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.data(node).ok().and_then(|data| data.value.as_deref())
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), WebDomError> {
        self.data_mut(node)?.value = Some(value.into());
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WebDomError> {
        self.data_mut(node)?.attrs.insert(name.into(), value.into());
        Ok(())
    }

    pub fn remove_attribute(
        &mut self,
        node: NodeId,
        name: &str,
    ) -> Result<Option<String>, WebDomError> {
        Ok(self.data_mut(node)?.attrs.remove(name))
    }

    /// First descendant of `root` (document order) whose `name` is `value`.
    #[must_use]
    pub fn find_by_attribute(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.descendants(root)
            .find(|node| self.attribute(*node, name).as_deref() == Some(value))
    }

    /// First descendant of `root` matching `marker`.
    #[must_use]
    pub fn first_marked(&self, root: NodeId, marker: &Marker) -> Option<NodeId> {
        self.descendants(root)
            .find(|node| self.has_marker(*node, marker))
    }

    /// Values of attribute `name` on `parent`'s children, in order.
    #[must_use]
    pub fn child_attributes(&self, parent: NodeId, name: &str) -> Vec<String> {
        self.children(parent)
            .into_iter()
            .filter_map(|child| self.attribute(child, name))
            .collect()
    }

    /// Engine writes since the last drain.
    #[must_use]
    pub fn mutations(&self) -> &[DomMutation] {
        &self.journal
    }

    pub fn drain_mutations(&mut self) -> Vec<DomMutation> {
        std::mem::take(&mut self.journal)
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, WebDomError> {
        usize::try_from(node.get())
            .ok()
            .and_then(|index| self.nodes.get(index))
            .ok_or(WebDomError::UnknownNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData, WebDomError> {
        usize::try_from(node.get())
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
            .ok_or(WebDomError::UnknownNode(node))
    }

    fn build(&mut self, parent: NodeId, element: &Element) -> NodeId {
        let node = NodeId::new(self.nodes.len() as u64);
        self.nodes
            .push(NodeData::from_element(element, Some(parent)));
        if let Ok(data) = self.data_mut(parent) {
            data.children.push(node);
        }
        for child in &element.children {
            self.build(node, child);
        }
        node
    }

    fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.children(node).into_iter().rev());
            Some(node)
        })
    }

    fn check_insert(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), WebDomError> {
        self.data(parent)?;
        self.data(node)?;
        if node == self.root() {
            return Err(WebDomError::RootImmutable);
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(WebDomError::WouldCycle { node, parent });
            }
            cursor = self.parent(current);
        }
        if let Some(reference) = reference
            && self.parent(reference) != Some(parent)
        {
            return Err(WebDomError::NotAChild { parent, reference });
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if reference == Some(node) {
            return;
        }
        self.detach(node);
        let Ok(data) = self.data_mut(parent) else {
            return;
        };
        let position = reference
            .and_then(|reference| data.children.iter().position(|child| *child == reference))
            .unwrap_or(data.children.len());
        data.children.insert(position, node);
        if let Ok(data) = self.data_mut(node) {
            data.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.data_mut(node).ok().and_then(|data| data.parent.take()) else {
            return;
        };
        if let Ok(data) = self.data_mut(parent) {
            data.children.retain(|child| *child != node);
        }
    }
}

impl ContainerDom for MemoryDom {
    fn query_marked(&self, root: NodeId, marker: &Marker) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|node| self.has_marker(*node, marker))
            .collect()
    }

    fn has_marker(&self, node: NodeId, marker: &Marker) -> bool {
        self.data(node).is_ok_and(|data| match marker {
            Marker::Class(name) => data.classes.iter().any(|class| class == name),
            Marker::Attribute(name) => data.attrs.contains_key(name),
        })
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.data(node)
            .ok()
            .and_then(|data| data.attrs.get(name).cloned())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).ok().and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) -> bool {
        if let Err(err) = self.check_insert(parent, node, reference) {
            trace!(target: "lanesync::web", %err, "insert_before rejected");
            return false;
        }
        self.link(parent, node, reference);
        self.journal.push(DomMutation::InsertBefore {
            parent,
            node,
            reference,
        });
        true
    }

    fn contains(&self, node: NodeId) -> bool {
        let mut cursor = node;
        for _ in 0..=self.nodes.len() {
            if cursor == self.root() {
                return true;
            }
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
        false
    }
}
