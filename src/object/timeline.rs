// src/object/timeline.rs
//
// Timeline and SerializableCollection: the two top-level container schemas.
// Neither is a Composable — they sit above the graph, not inside it, so
// they carry no parent pointer of their own (a Timeline's root Stack does
// have a parent-less top, matching the reference schema's "tracks" root).

use crate::error::{Error, Result};
use crate::object::composition::{Stack, CompositionState};
use crate::object::item::ItemState;
use crate::object::{Node, NodeKind, NodeRef};
use crate::time::RationalTime;

#[derive(Debug)]
pub struct TimelineState {
    pub global_start_time: Option<RationalTime>,
    pub tracks: NodeRef,
}

pub(crate) fn timeline_state_eq(a: &TimelineState, b: &TimelineState) -> bool {
    a.global_start_time == b.global_start_time && crate::object::nodes_structurally_equal(&a.tracks, &b.tracks)
}

#[derive(Debug, Default)]
pub struct CollectionState {
    pub items: Vec<NodeRef>,
}

pub(crate) fn collection_state_eq(a: &CollectionState, b: &CollectionState) -> bool {
    a.items.len() == b.items.len()
        && a.items.iter().zip(b.items.iter()).all(|(x, y)| crate::object::nodes_structurally_equal(x, y))
}

/// Wrapper over a `NodeKind::Timeline` node.
#[derive(Debug, Clone)]
pub struct Timeline(pub(crate) NodeRef);

impl Timeline {
    pub fn new(name: impl Into<String>) -> Self {
        let tracks = Node::new("tracks", NodeKind::Stack(ItemState::default(), CompositionState::default()));
        Timeline(Node::new(name, NodeKind::Timeline(TimelineState { global_start_time: None, tracks })))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Timeline(_) => Ok(Timeline(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Timeline", found: "other" }),
        }
    }

    pub fn tracks(&self) -> Stack {
        let node = match &*self.0.kind.borrow() {
            NodeKind::Timeline(t) => t.tracks.clone(),
            _ => unreachable!(),
        };
        Stack::from_node(node).expect("Timeline.tracks is always a Stack")
    }

    pub fn global_start_time(&self) -> Option<RationalTime> {
        match &*self.0.kind.borrow() {
            NodeKind::Timeline(t) => t.global_start_time,
            _ => unreachable!(),
        }
    }

    pub fn set_global_start_time(&self, t: Option<RationalTime>) {
        if let NodeKind::Timeline(state) = &mut *self.0.kind.borrow_mut() {
            state.global_start_time = t;
        }
    }
}

/// Wrapper over a `NodeKind::SerializableCollection` node.
#[derive(Debug, Clone)]
pub struct SerializableCollection(pub(crate) NodeRef);

impl SerializableCollection {
    pub fn new(name: impl Into<String>) -> Self {
        SerializableCollection(Node::new(name, NodeKind::SerializableCollection(CollectionState::default())))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::SerializableCollection(_) => Ok(SerializableCollection(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "SerializableCollection", found: "other" }),
        }
    }

    pub fn push(&self, item: NodeRef) {
        if let NodeKind::SerializableCollection(state) = &mut *self.0.kind.borrow_mut() {
            state.items.push(item);
        }
    }

    pub fn items(&self) -> Vec<NodeRef> {
        match &*self.0.kind.borrow() {
            NodeKind::SerializableCollection(state) => state.items.clone(),
            _ => unreachable!(),
        }
    }
}
