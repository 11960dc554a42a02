//! Minimal in-crate doubles for unit tests. `lanesync-web` ships the full
//! in-memory DOM used by integration tests and hosts.

use std::collections::BTreeMap;

use crate::backend::{BindingHandle, DragBackend, DragOptions};
use crate::dom::{ContainerDom, Marker};
use crate::model::NodeId;

#[derive(Debug, Default, Clone)]
struct FakeNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
}

/// Tree using the task profile's markup.
#[derive(Debug, Clone)]
pub(crate) struct FakeDom {
    nodes: Vec<FakeNode>,
}

impl FakeDom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![FakeNode::default()],
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn push(&mut self, parent: NodeId) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(FakeNode {
            parent: Some(parent),
            ..FakeNode::default()
        });
        self.nodes[parent.get() as usize].children.push(id);
        id
    }

    pub(crate) fn plain(&mut self, parent: NodeId) -> NodeId {
        self.push(parent)
    }

    pub(crate) fn lane(&mut self, parent: NodeId, state_id: &str) -> NodeId {
        let lane = self.bare_lane(parent);
        self.set_attr(lane, "data-state-id", state_id);
        lane
    }

    pub(crate) fn bare_lane(&mut self, parent: NodeId) -> NodeId {
        let lane = self.push(parent);
        self.set_attr(lane, "data-dropzone", "");
        lane
    }

    pub(crate) fn item(&mut self, lane: NodeId, item_id: &str) -> NodeId {
        let item = self.bare_item(lane);
        self.set_attr(item, "data-task-id", item_id);
        item
    }

    pub(crate) fn bare_item(&mut self, lane: NodeId) -> NodeId {
        let item = self.push(lane);
        self.nodes[item.get() as usize]
            .classes
            .push("task-item".into());
        item
    }

    pub(crate) fn handle(&mut self, item: NodeId) -> NodeId {
        let handle = self.push(item);
        self.nodes[handle.get() as usize]
            .classes
            .push("task-drag-handle".into());
        handle
    }

    pub(crate) fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.get() as usize]
            .attrs
            .insert(name.into(), value.into());
    }

    /// Item ids of `lane`'s children, in order.
    pub(crate) fn item_ids(&self, lane: NodeId) -> Vec<String> {
        self.children(lane)
            .into_iter()
            .filter_map(|child| self.attribute(child, "data-task-id"))
            .collect()
    }

    /// Move `node` the way the drag library does during a drag.
    pub(crate) fn relocate(&mut self, node: NodeId, lane: NodeId, index: usize) {
        let reference = self.children(lane).into_iter().filter(|c| *c != node).nth(index);
        assert!(self.insert_before(lane, node, reference));
    }

    fn node(&self, id: NodeId) -> Option<&FakeNode> {
        self.nodes.get(id.get() as usize)
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.get() as usize].parent.take() {
            self.nodes[parent.get() as usize]
                .children
                .retain(|child| *child != node);
        }
    }
}

impl ContainerDom for FakeDom {
    fn query_marked(&self, root: NodeId, marker: &Marker) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.has_marker(node, marker) {
                out.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    fn has_marker(&self, node: NodeId, marker: &Marker) -> bool {
        self.node(node).is_some_and(|data| match marker {
            Marker::Class(name) => data.classes.iter().any(|class| class == name),
            Marker::Attribute(name) => data.attrs.contains_key(name),
        })
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|data| data.attrs.get(name).cloned())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) -> bool {
        if self.node(parent).is_none() || self.node(node).is_none() {
            return false;
        }
        if let Some(reference) = reference
            && self.parent(reference) != Some(parent)
        {
            return false;
        }
        self.detach(node);
        let children = &mut self.nodes[parent.get() as usize].children;
        let position = reference
            .and_then(|reference| children.iter().position(|child| *child == reference))
            .unwrap_or(children.len());
        children.insert(position, node);
        self.nodes[node.get() as usize].parent = Some(parent);
        true
    }

    fn contains(&self, node: NodeId) -> bool {
        node.get() == 0 || self.parent(node).is_some()
    }
}

/// Backend that only counts live bindings.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    next: u64,
    pub(crate) live: BTreeMap<BindingHandle, NodeId>,
    pub(crate) created: usize,
    pub(crate) destroyed: usize,
}

impl DragBackend for FakeBackend {
    fn create(&mut self, lane: NodeId, _options: &DragOptions) -> BindingHandle {
        self.next += 1;
        self.created += 1;
        let handle = BindingHandle::new(self.next);
        self.live.insert(handle, lane);
        handle
    }

    fn destroy(&mut self, handle: BindingHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}

/// Two-lane task board: lane "1" holds `t1,t2,t3`, lane "2" holds `t4`.
pub(crate) struct Board {
    pub(crate) dom: FakeDom,
    pub(crate) container: NodeId,
    pub(crate) todo: NodeId,
    pub(crate) doing: NodeId,
}

impl Board {
    pub(crate) fn new() -> Self {
        let mut dom = FakeDom::new();
        let container = dom.root();
        let todo = dom.lane(container, "1");
        for id in ["t1", "t2", "t3"] {
            let item = dom.item(todo, id);
            dom.handle(item);
        }
        let doing = dom.lane(container, "2");
        let item = dom.item(doing, "t4");
        dom.handle(item);
        Self {
            dom,
            container,
            todo,
            doing,
        }
    }

    /// The `index`th item of `lane` and its drag handle.
    pub(crate) fn item_and_handle(&self, lane: NodeId, index: usize) -> (NodeId, NodeId) {
        let item = self.dom.children(lane)[index];
        let handle = self.dom.children(item)[0];
        (item, handle)
    }
}
