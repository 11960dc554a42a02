#![forbid(unsafe_code)]

//! Local reconciliation after a drop.
//!
//! The drag library has already moved the element by the time a gesture
//! ends. If that move crossed lanes, the element goes back to its origin
//! before any move intent leaves the engine, so the authoritative re-render
//! is the only writer of final placement and never finds a duplicate.

use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::dom::{self, ContainerDom, Marker};
use crate::model::{GestureRecord, NodeId};

/// What reconciliation does with the drag library's relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// Move the element back to `lane` at item position `index`.
    Revert { lane: NodeId, index: usize },
    /// Keep the same-lane reorder; the next render overwrites it.
    Reflect,
    /// Nothing moved.
    Defer,
}

/// Decision plus whether the structural restore succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub decision: ReconcileDecision,
    /// `false` only for a `Revert` whose nodes left the tree.
    pub restored: bool,
}

/// Always-reinsert reconciliation policy.
#[derive(Debug, Clone)]
pub struct ReconciliationPolicy {
    item_marker: Marker,
}

impl ReconciliationPolicy {
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            item_marker: config.item_marker.clone(),
        }
    }

    /// Classify a completed gesture against the current tree.
    ///
    /// A drop into another lane node reverts even when its ids are missing,
    /// and so does an element the library left outside its origin lane.
    pub fn decide<D: ContainerDom + ?Sized>(
        &self,
        dom: &D,
        record: &GestureRecord,
    ) -> ReconcileDecision {
        let displaced = dom.parent(record.item) != Some(record.from_lane);
        if record.crossed_lane_nodes() || displaced {
            ReconcileDecision::Revert {
                lane: record.from_lane,
                index: record.from_index,
            }
        } else if record.to_index == record.from_index {
            ReconcileDecision::Defer
        } else {
            ReconcileDecision::Reflect
        }
    }

    /// Decide and, for `Revert`, restore the element before returning.
    pub fn apply<D: ContainerDom + ?Sized>(
        &self,
        dom: &mut D,
        record: &GestureRecord,
    ) -> ReconcileOutcome {
        let decision = self.decide(dom, record);
        let ReconcileDecision::Revert { lane, index } = decision else {
            return ReconcileOutcome {
                decision,
                restored: true,
            };
        };

        if !dom.contains(record.item) || !dom.contains(lane) {
            warn!(
                target: "lanesync::sync",
                sequence = record.sequence,
                item = %record.item,
                lane = %lane,
                "dragged element or origin lane left the tree; nothing to restore"
            );
            return ReconcileOutcome {
                decision,
                restored: false,
            };
        }

        let reference = self.reference_node(dom, lane, record.item, index);
        let restored = dom.insert_before(lane, record.item, reference);
        debug!(
            target: "lanesync::sync",
            sequence = record.sequence,
            item = %record.item,
            lane = %lane,
            index,
            restored,
            "restored dragged element to its origin"
        );
        ReconcileOutcome { decision, restored }
    }

    /// Node to insert before so the element lands at item position `index`.
    fn reference_node<D: ContainerDom + ?Sized>(
        &self,
        dom: &D,
        lane: NodeId,
        item: NodeId,
        index: usize,
    ) -> Option<NodeId> {
        let siblings: Vec<NodeId> = dom::lane_items(dom, lane, &self.item_marker)
            .into_iter()
            .filter(|node| *node != item)
            .collect();
        if let Some(reference) = siblings.get(index) {
            return Some(*reference);
        }
        // Past the end: go right after the last remaining item.
        let last = *siblings.last()?;
        let children = dom.children(lane);
        let position = children.iter().position(|child| *child == last)?;
        children
            .into_iter()
            .skip(position + 1)
            .find(|child| *child != item)
    }
}
