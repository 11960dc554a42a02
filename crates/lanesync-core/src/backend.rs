#![forbid(unsafe_code)]

//! Seam to the native drag library.
//!
//! A backend owns one binding per lane. The library relocates elements while
//! the pointer moves; the engine only needs to create and destroy bindings.
//! Drag progress reaches the engine as [`DragSignal`](crate::sync::DragSignal)s
//! pushed by the host.

use crate::dom::Marker;
use crate::model::NodeId;

/// Handle to one live drag-library binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingHandle(u64);

impl BindingHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Options handed to the drag library for each lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOptions {
    /// Lanes sharing a group accept each other's items.
    pub group: String,
    /// Drags only start from elements carrying this marker.
    pub handle: Marker,
    /// Only elements carrying this marker may be dragged.
    pub draggable: Marker,
    /// Relocation animation length in milliseconds.
    pub animation_ms: u32,
    /// Class applied to the placeholder while dragging.
    pub ghost_class: String,
}

/// A native drag library (SortableJS in the browser deployment).
pub trait DragBackend {
    /// Attach a binding to `lane`.
    fn create(&mut self, lane: NodeId, options: &DragOptions) -> BindingHandle;

    /// Release a binding. Unknown or already-released handles are ignored.
    fn destroy(&mut self, handle: BindingHandle);
}

impl<B: DragBackend + ?Sized> DragBackend for &mut B {
    fn create(&mut self, lane: NodeId, options: &DragOptions) -> BindingHandle {
        (**self).create(lane, options)
    }

    fn destroy(&mut self, handle: BindingHandle) {
        (**self).destroy(handle);
    }
}
