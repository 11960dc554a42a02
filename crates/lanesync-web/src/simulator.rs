#![forbid(unsafe_code)]

//! Drives gestures against a [`MemoryDom`] the way the drag library does.
//!
//! The library moves the element into the hovered lane while the pointer is
//! still down, then reports the drop. The simulator reproduces that order so
//! the engine sees exactly the tree it would see in a browser.

use lanesync_core::dom::{item_index, lane_items};
use lanesync_core::{
    ContainerDom, DragBackend, DragSignal, IntentSink, Marker, NodeId, ReorderSynchronizer,
    SyncConfig, SyncDispatch,
};

use crate::memory_dom::{MemoryDom, WebDomError};

/// Where a simulated gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Released over `lane` at item position `index`.
    Lane { lane: NodeId, index: usize },
    /// Released outside every lane without hovering one.
    Outside,
    /// Aborted before release.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct DragSimulator {
    item_marker: Marker,
    handle_marker: Marker,
}

impl DragSimulator {
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            item_marker: config.item_marker.clone(),
            handle_marker: config.handle_marker.clone(),
        }
    }

    /// Pointer goes down on `item`'s handle, or on the item itself when it
    /// has none.
    pub fn pick(&self, dom: &MemoryDom, item: NodeId) -> Result<DragSignal, WebDomError> {
        let lane = dom.parent(item).ok_or(WebDomError::UnknownNode(item))?;
        let grabbed = dom.first_marked(item, &self.handle_marker).unwrap_or(item);
        Ok(DragSignal::Start {
            lane,
            item,
            grabbed,
        })
    }

    /// Move `item` into `lane` at item position `index`.
    pub fn hover(
        &self,
        dom: &mut MemoryDom,
        item: NodeId,
        lane: NodeId,
        index: usize,
    ) -> Result<DragSignal, WebDomError> {
        let reference = lane_items(dom, lane, &self.item_marker)
            .into_iter()
            .filter(|node| *node != item)
            .nth(index);
        dom.relocate(item, lane, reference)?;
        Ok(DragSignal::Over { lane })
    }

    /// Pointer released over `over`, or outside every lane.
    #[must_use]
    pub fn release(&self, dom: &MemoryDom, item: NodeId, over: Option<NodeId>) -> DragSignal {
        let new_index = dom
            .parent(item)
            .and_then(|parent| item_index(dom, parent, item, &self.item_marker))
            .unwrap_or(0);
        DragSignal::Drop {
            item,
            to: over,
            new_index,
        }
    }

    /// Run one whole gesture through `sync`, returning every dispatch.
    pub fn perform<B, S>(
        &self,
        sync: &mut ReorderSynchronizer<MemoryDom, B, S>,
        item: NodeId,
        target: DropTarget,
    ) -> Result<Vec<SyncDispatch>, WebDomError>
    where
        B: DragBackend,
        S: IntentSink,
    {
        let mut dispatches = vec![sync.handle(self.pick(sync.dom(), item)?)];
        match target {
            DropTarget::Lane { lane, index } => {
                let over = self.hover(sync.dom_mut(), item, lane, index)?;
                dispatches.push(sync.handle(over));
                let drop = self.release(sync.dom(), item, Some(lane));
                dispatches.push(sync.handle(drop));
            }
            DropTarget::Outside => {
                let drop = self.release(sync.dom(), item, None);
                dispatches.push(sync.handle(drop));
            }
            DropTarget::Cancelled => dispatches.push(sync.handle(DragSignal::Cancel)),
        }
        Ok(dispatches)
    }
}
