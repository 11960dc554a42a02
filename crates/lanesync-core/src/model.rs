#![forbid(unsafe_code)]

//! Identity and value types shared by every stage of the engine.
//!
//! Ids are kept as the raw attribute text. Lanes compare by string equality,
//! which is also how the authoritative layer's markup expresses them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PushTarget;

/// Opaque handle to a node inside a [`ContainerDom`](crate::dom::ContainerDom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a host-issued node number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw node number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a draggable item (`data-task-id` / `data-todo-id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a lane (`data-state-id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(String);

impl LaneId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LaneId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for LaneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for LaneId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which kind of board the synchronizer is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Todo,
}

impl ItemKind {
    /// Lowercase label used in markup and host messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Todo => "todo",
        }
    }

    /// Parse a label produced by [`label`](Self::label).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "task" => Some(Self::Task),
            "todo" => Some(Self::Todo),
            _ => None,
        }
    }
}

/// One completed drag, read back from the DOM at drop time.
///
/// Node handles are always present; the attribute-derived ids are `None`
/// when the markup did not carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureRecord {
    /// Monotonic gesture number, unique per detector.
    pub sequence: u64,
    pub item: NodeId,
    pub item_id: Option<ItemId>,
    pub from_lane: NodeId,
    pub from_lane_id: Option<LaneId>,
    pub to_lane: NodeId,
    pub to_lane_id: Option<LaneId>,
    /// Index among the origin lane's items before the drag began.
    pub from_index: usize,
    /// Index the drag library reported in the destination lane.
    pub to_index: usize,
}

impl GestureRecord {
    /// True when the drop landed in a different lane node than it left.
    #[must_use]
    pub fn crossed_lane_nodes(&self) -> bool {
        self.from_lane != self.to_lane
    }
}

/// "Assign this item to this lane", sent once per cross-lane gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub kind: ItemKind,
    pub item_id: ItemId,
    pub new_lane_id: LaneId,
}

/// Outbound notification handed to the authoritative layer's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Event name, e.g. `task-moved`.
    pub event: String,
    pub target: PushTarget,
    pub payload: serde_json::Value,
}

impl PushEvent {
    /// Serialize to the JSON object a host forwards verbatim.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
