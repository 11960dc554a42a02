#![forbid(unsafe_code)]

//! Drag backend that records binding lifetimes for the host.
//!
//! The host owns the real drag library. This backend hands out handles,
//! remembers which lane and options each live handle belongs to, and queues
//! create/destroy events the host replays against the library.

use std::collections::BTreeMap;

use lanesync_core::{BindingHandle, DragBackend, DragOptions, NodeId};
use tracing::{debug, warn};

/// A binding change the host must apply to the drag library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Created {
        handle: BindingHandle,
        lane: NodeId,
        options: DragOptions,
    },
    Destroyed {
        handle: BindingHandle,
        lane: NodeId,
    },
}

#[derive(Debug, Default, Clone)]
pub struct RecordingDragBackend {
    next_handle: u64,
    live: BTreeMap<BindingHandle, (NodeId, DragOptions)>,
    events: Vec<BackendEvent>,
    created: u64,
    destroyed: u64,
}

impl RecordingDragBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Lanes with a live binding, in handle order.
    #[must_use]
    pub fn bound_lanes(&self) -> Vec<NodeId> {
        self.live.values().map(|(lane, _)| *lane).collect()
    }

    #[must_use]
    pub fn options(&self, handle: BindingHandle) -> Option<&DragOptions> {
        self.live.get(&handle).map(|(_, options)| options)
    }

    #[must_use]
    pub const fn created(&self) -> u64 {
        self.created
    }

    #[must_use]
    pub const fn destroyed(&self) -> u64 {
        self.destroyed
    }

    pub fn drain_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DragBackend for RecordingDragBackend {
    fn create(&mut self, lane: NodeId, options: &DragOptions) -> BindingHandle {
        self.next_handle = self.next_handle.saturating_add(1);
        let handle = BindingHandle::new(self.next_handle);
        self.live.insert(handle, (lane, options.clone()));
        self.created = self.created.saturating_add(1);
        self.events.push(BackendEvent::Created {
            handle,
            lane,
            options: options.clone(),
        });
        debug!(target: "lanesync::web", handle = handle.get(), %lane, "drag binding created");
        handle
    }

    fn destroy(&mut self, handle: BindingHandle) {
        let Some((lane, _)) = self.live.remove(&handle) else {
            warn!(target: "lanesync::web", handle = handle.get(), "destroy of unknown drag binding");
            return;
        };
        self.destroyed = self.destroyed.saturating_add(1);
        self.events.push(BackendEvent::Destroyed { handle, lane });
        debug!(target: "lanesync::web", handle = handle.get(), %lane, "drag binding destroyed");
    }
}
