#![forbid(unsafe_code)]

//! Structural view of the container subtree.
//!
//! The engine reads markers and attributes and performs one kind of write,
//! `insert_before`, when it restores a dragged element. Everything else about
//! the DOM belongs to the authoritative layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::NodeId;

/// A selector-like marker identifying lanes, items, or drag handles.
///
/// Only the two shapes the markup contract uses are supported: a class
/// (`.task-item`) and an attribute presence test (`[data-dropzone]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Marker {
    Class(String),
    Attribute(String),
}

/// Error returned by [`Marker::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerParseError {
    Empty,
    Unsupported(String),
}

impl fmt::Display for MarkerParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "marker is empty"),
            Self::Unsupported(raw) => write!(
                f,
                "unsupported marker {raw:?}: expected `.class` or `[attribute]`"
            ),
        }
    }
}

impl std::error::Error for MarkerParseError {}

impl Marker {
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    /// Parse `.class` or `[attribute]`.
    pub fn parse(raw: &str) -> Result<Self, MarkerParseError> {
        let raw = raw.trim();
        if let Some(class) = raw.strip_prefix('.') {
            return non_empty(class).map(Self::class);
        }
        if let Some(attr) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return non_empty(attr.trim()).map(Self::attribute);
        }
        if raw.is_empty() {
            Err(MarkerParseError::Empty)
        } else {
            Err(MarkerParseError::Unsupported(raw.to_owned()))
        }
    }

    /// Name without the selector punctuation.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Class(name) | Self::Attribute(name) => name,
        }
    }
}

fn non_empty(name: &str) -> Result<&str, MarkerParseError> {
    if name.is_empty() {
        Err(MarkerParseError::Empty)
    } else {
        Ok(name)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, ".{name}"),
            Self::Attribute(name) => write!(f, "[{name}]"),
        }
    }
}

impl TryFrom<String> for Marker {
    type Error = MarkerParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.to_string()
    }
}

/// Host-provided access to the container's DOM subtree.
pub trait ContainerDom {
    /// Descendants of `root` (excluding `root`) carrying `marker`, in
    /// document order.
    fn query_marked(&self, root: NodeId, marker: &Marker) -> Vec<NodeId>;

    /// Whether `node` itself carries `marker`.
    fn has_marker(&self, node: NodeId, marker: &Marker) -> bool;

    /// Attribute value, `None` when absent or when `node` is unknown.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children of `node` in order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Move `node` under `parent`, before `reference` (append when `None`).
    ///
    /// Returns `false` and leaves the tree untouched when any handle is
    /// unknown or `reference` is not a child of `parent`.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) -> bool;

    /// Whether `node` is still attached to the tree.
    fn contains(&self, node: NodeId) -> bool;
}

/// Nearest inclusive ancestor of `node` carrying `marker`, not climbing past
/// `boundary`.
pub fn closest<D: ContainerDom + ?Sized>(
    dom: &D,
    node: NodeId,
    marker: &Marker,
    boundary: NodeId,
) -> Option<NodeId> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if dom.has_marker(current, marker) {
            return Some(current);
        }
        if current == boundary {
            return None;
        }
        cursor = dom.parent(current);
    }
    None
}

/// Whether `node` is `ancestor` or sits somewhere below it.
pub fn is_inclusive_descendant<D: ContainerDom + ?Sized>(
    dom: &D,
    node: NodeId,
    ancestor: NodeId,
) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        cursor = dom.parent(current);
    }
    false
}

/// Children of `lane` carrying the item marker, in order.
pub fn lane_items<D: ContainerDom + ?Sized>(dom: &D, lane: NodeId, item: &Marker) -> Vec<NodeId> {
    dom.children(lane)
        .into_iter()
        .filter(|child| dom.has_marker(*child, item))
        .collect()
}

/// Position of `node` among the item-marked children of `lane`.
pub fn item_index<D: ContainerDom + ?Sized>(
    dom: &D,
    lane: NodeId,
    node: NodeId,
    item: &Marker,
) -> Option<usize> {
    lane_items(dom, lane, item)
        .iter()
        .position(|candidate| *candidate == node)
}
