#![forbid(unsafe_code)]

//! Drag gesture detector.
//!
//! Binds the drag library to every lane in a container and turns the host's
//! drag signals into a uniform gesture stream:
//! - one gesture in flight at a time,
//! - drags start only from a handle inside an item of a bound lane,
//! - a drop outside every bound lane ends as a no-op gesture,
//! - a cancel ends the gesture without a record.
//!
//! Every call returns a [`GestureDispatch`] whose log entry says whether the
//! signal was forwarded or why it was ignored.

use tracing::{debug, trace};

use crate::backend::{BindingHandle, DragBackend, DragOptions};
use crate::config::SyncConfig;
use crate::dom::{self, ContainerDom, Marker};
use crate::model::{GestureRecord, ItemId, LaneId, NodeId};

/// One lane the drag library is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneBinding {
    pub lane: NodeId,
    pub handle: BindingHandle,
}

/// Lifecycle phase recorded for one detector dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Over,
    Drop,
    Cancel,
}

/// Deterministic reason why a drag signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIgnoredReason {
    /// No lanes are bound (unmounted, mid-rebind, or torn down).
    NotBound,
    /// The node is not a lane of this container.
    UnknownLane,
    /// The node is marked as a drop zone but has no binding, e.g. a lane
    /// rendered since the last bind.
    UnboundLane,
    /// The dragged node is not an item of the named lane.
    NotDraggable,
    /// The pointer did not go down on a drag handle inside the item.
    MissingHandle,
    GestureInFlight,
    NoActiveGesture,
    /// The drop names a different item than the one picked up.
    ItemMismatch,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureLogOutcome {
    Forwarded,
    Ignored(GestureIgnoredReason),
}

/// Structured log record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureLogEntry {
    pub phase: GesturePhase,
    pub sequence: Option<u64>,
    pub item: Option<NodeId>,
    pub lane: Option<NodeId>,
    pub outcome: GestureLogOutcome,
}

/// Gesture stream produced by the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureEvent {
    Started {
        sequence: u64,
        item: NodeId,
        from_lane: NodeId,
        from_index: usize,
    },
    Relocated {
        sequence: u64,
        lane: NodeId,
    },
    Ended(GestureRecord),
    Cancelled {
        sequence: u64,
    },
}

/// Result of one detector dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureDispatch {
    pub event: Option<GestureEvent>,
    pub log: GestureLogEntry,
}

impl GestureDispatch {
    pub(crate) fn ignored(
        phase: GesturePhase,
        reason: GestureIgnoredReason,
        item: Option<NodeId>,
        lane: Option<NodeId>,
    ) -> Self {
        trace!(
            target: "lanesync::detector",
            ?phase,
            ?reason,
            item = ?item,
            lane = ?lane,
            "drag signal ignored"
        );
        Self {
            event: None,
            log: GestureLogEntry {
                phase,
                sequence: None,
                item,
                lane,
                outcome: GestureLogOutcome::Ignored(reason),
            },
        }
    }

    fn forwarded(
        phase: GesturePhase,
        sequence: u64,
        item: Option<NodeId>,
        lane: Option<NodeId>,
        event: GestureEvent,
    ) -> Self {
        debug!(
            target: "lanesync::detector",
            ?phase,
            sequence,
            item = ?item,
            lane = ?lane,
            "drag signal forwarded"
        );
        Self {
            event: Some(event),
            log: GestureLogEntry {
                phase,
                sequence: Some(sequence),
                item,
                lane,
                outcome: GestureLogOutcome::Forwarded,
            },
        }
    }

    /// Whether the signal advanced the gesture.
    #[must_use]
    pub fn accepted(&self) -> bool {
        matches!(self.log.outcome, GestureLogOutcome::Forwarded)
    }

    /// Completed gesture record, if this dispatch ended one.
    #[must_use]
    pub fn record(&self) -> Option<&GestureRecord> {
        match &self.event {
            Some(GestureEvent::Ended(record)) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveGesture {
    sequence: u64,
    item: NodeId,
    from_lane: NodeId,
    from_index: usize,
    over_lane: NodeId,
}

/// Gesture detector for one container.
///
/// The detector does not own the bound lane set; the
/// [`ReorderSynchronizer`](crate::sync::ReorderSynchronizer) keeps it and
/// passes it into each call.
#[derive(Debug, Clone)]
pub struct DragGestureDetector {
    options: DragOptions,
    lane_marker: Marker,
    lane_id_attr: String,
    item_id_attr: String,
    active: Option<ActiveGesture>,
    next_sequence: u64,
}

impl DragGestureDetector {
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            options: config.drag_options(),
            lane_marker: config.lane_marker.clone(),
            lane_id_attr: config.lane_id_attr.clone(),
            item_id_attr: config.item_id_attr.clone(),
            active: None,
            next_sequence: 1,
        }
    }

    /// Options handed to the drag library.
    #[must_use]
    pub fn options(&self) -> &DragOptions {
        &self.options
    }

    /// Whether a gesture is in flight.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Sequence number of the in-flight gesture.
    #[must_use]
    pub fn active_sequence(&self) -> Option<u64> {
        self.active.map(|active| active.sequence)
    }

    /// Attach one drag-library binding to every lane under `container`.
    pub fn bind<D, B>(&self, dom: &D, backend: &mut B, container: NodeId) -> Vec<LaneBinding>
    where
        D: ContainerDom + ?Sized,
        B: DragBackend + ?Sized,
    {
        dom.query_marked(container, &self.lane_marker)
            .into_iter()
            .map(|lane| LaneBinding {
                lane,
                handle: backend.create(lane, &self.options),
            })
            .collect()
    }

    /// Destroy every binding; returns how many were released.
    pub fn unbind<B>(&self, backend: &mut B, bindings: Vec<LaneBinding>) -> usize
    where
        B: DragBackend + ?Sized,
    {
        let released = bindings.len();
        for binding in bindings {
            backend.destroy(binding.handle);
        }
        released
    }

    /// Pointer went down on `grabbed` inside `item`, which sits in `lane`.
    pub fn drag_start<D: ContainerDom + ?Sized>(
        &mut self,
        dom: &D,
        bindings: &[LaneBinding],
        lane: NodeId,
        item: NodeId,
        grabbed: NodeId,
    ) -> GestureDispatch {
        let phase = GesturePhase::Start;
        if bindings.is_empty() {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::NotBound,
                Some(item),
                Some(lane),
            );
        }
        if let Some(reason) = self.lane_rejection(dom, bindings, lane) {
            return GestureDispatch::ignored(phase, reason, Some(item), Some(lane));
        }
        if self.active.is_some() {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::GestureInFlight,
                Some(item),
                Some(lane),
            );
        }
        let Some(from_index) = dom::item_index(dom, lane, item, &self.options.draggable) else {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::NotDraggable,
                Some(item),
                Some(lane),
            );
        };
        let grabbed_handle = dom::is_inclusive_descendant(dom, grabbed, item)
            && dom::closest(dom, grabbed, &self.options.handle, item).is_some();
        if !grabbed_handle {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::MissingHandle,
                Some(item),
                Some(lane),
            );
        }

        let sequence = self.next_sequence();
        self.active = Some(ActiveGesture {
            sequence,
            item,
            from_lane: lane,
            from_index,
            over_lane: lane,
        });
        GestureDispatch::forwarded(
            phase,
            sequence,
            Some(item),
            Some(lane),
            GestureEvent::Started {
                sequence,
                item,
                from_lane: lane,
                from_index,
            },
        )
    }

    /// The drag library moved the placeholder into `lane`.
    pub fn drag_over<D: ContainerDom + ?Sized>(
        &mut self,
        dom: &D,
        bindings: &[LaneBinding],
        lane: NodeId,
    ) -> GestureDispatch {
        let phase = GesturePhase::Over;
        let Some(mut active) = self.active else {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::NoActiveGesture,
                None,
                Some(lane),
            );
        };
        if let Some(reason) = self.lane_rejection(dom, bindings, lane) {
            return GestureDispatch::ignored(phase, reason, Some(active.item), Some(lane));
        }
        active.over_lane = lane;
        self.active = Some(active);
        GestureDispatch::forwarded(
            phase,
            active.sequence,
            Some(active.item),
            Some(lane),
            GestureEvent::Relocated {
                sequence: active.sequence,
                lane,
            },
        )
    }

    /// The pointer was released. `to_lane` is `None` when it was released
    /// outside every lane; an unbound lane is treated the same way.
    pub fn drag_end<D: ContainerDom + ?Sized>(
        &mut self,
        dom: &D,
        bindings: &[LaneBinding],
        item: NodeId,
        to_lane: Option<NodeId>,
        new_index: usize,
    ) -> GestureDispatch {
        let phase = GesturePhase::Drop;
        let Some(active) = self.active else {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::NoActiveGesture,
                Some(item),
                to_lane,
            );
        };
        if active.item != item {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::ItemMismatch,
                Some(item),
                to_lane,
            );
        }
        self.active = None;

        let landed = to_lane.filter(|lane| is_bound(bindings, *lane));
        let (to_lane, to_index) = match landed {
            Some(lane) => (lane, new_index),
            None => {
                debug!(
                    target: "lanesync::detector",
                    sequence = active.sequence,
                    requested = ?to_lane,
                    "drop outside any bound lane; treating as no-op"
                );
                (active.from_lane, active.from_index)
            }
        };
        let record = GestureRecord {
            sequence: active.sequence,
            item,
            item_id: dom.attribute(item, &self.item_id_attr).map(ItemId::from),
            from_lane: active.from_lane,
            from_lane_id: dom
                .attribute(active.from_lane, &self.lane_id_attr)
                .map(LaneId::from),
            to_lane,
            to_lane_id: dom.attribute(to_lane, &self.lane_id_attr).map(LaneId::from),
            from_index: active.from_index,
            to_index,
        };
        GestureDispatch::forwarded(
            phase,
            active.sequence,
            Some(item),
            Some(to_lane),
            GestureEvent::Ended(record),
        )
    }

    /// The drag was cancelled before a drop; no record is produced.
    pub fn cancel(&mut self) -> GestureDispatch {
        let phase = GesturePhase::Cancel;
        let Some(active) = self.active.take() else {
            return GestureDispatch::ignored(
                phase,
                GestureIgnoredReason::NoActiveGesture,
                None,
                None,
            );
        };
        GestureDispatch::forwarded(
            phase,
            active.sequence,
            Some(active.item),
            Some(active.over_lane),
            GestureEvent::Cancelled {
                sequence: active.sequence,
            },
        )
    }

    /// Drop the in-flight gesture without producing an event.
    pub fn abandon(&mut self) -> Option<u64> {
        self.active.take().map(|active| active.sequence)
    }

    fn lane_rejection<D: ContainerDom + ?Sized>(
        &self,
        dom: &D,
        bindings: &[LaneBinding],
        lane: NodeId,
    ) -> Option<GestureIgnoredReason> {
        if is_bound(bindings, lane) {
            None
        } else if dom.has_marker(lane, &self.lane_marker) {
            Some(GestureIgnoredReason::UnboundLane)
        } else {
            Some(GestureIgnoredReason::UnknownLane)
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }
}

fn is_bound(bindings: &[LaneBinding], lane: NodeId) -> bool {
    bindings.iter().any(|binding| binding.lane == lane)
}
