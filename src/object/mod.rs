// src/object/mod.rs
//
// The composition graph. Rather than the deep Composable -> Item ->
// Composition -> (Track | Stack) inheritance chain the reference
// implementation uses, every node in the graph is one `Node` behind an
// `Rc`, carrying the fields every schema shares (name, metadata, a weak
// parent pointer) plus a `NodeKind` that tags which schema it is and holds
// that schema's own fields. Per-kind behavior (`read_from`/`write_to`-style
// dispatch, timing algebra) is free functions matching on `NodeKind` rather
// than virtual methods — see `DESIGN.md` for why.
//
// Typed wrapper structs (`Clip`, `Gap`, `Track`, `Stack`, `Transition`,
// `Timeline`, `SerializableCollection`) in the sibling modules each hold a
// `NodeRef` and expose a safe, schema-specific API over these free
// functions; application code is expected to work through those wrappers,
// not this module's `NodeKind` match arms directly.

pub mod algorithms;
pub mod clip;
pub mod common;
pub mod composition;
pub mod item;
pub mod timeline;
pub mod transition;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::any::AnyDictionary;
use crate::error::{Error, Result};

pub use clip::{Clip, Gap};
pub use common::*;
pub use composition::{Composition, Stack, Track};
pub use item::ItemState;
pub use timeline::{SerializableCollection, Timeline};
pub use transition::{Transition, TransitionType};

pub type NodeRef = Rc<Node>;

#[derive(Debug)]
pub struct Node {
    name: RefCell<String>,
    metadata: RefCell<AnyDictionary>,
    /// Fields the JSON reader saw on this object's schema dictionary but
    /// that no known field enumerates. Preserved so a read/write round-trip
    /// doesn't silently drop data from a newer writer. Emitted after the
    /// schema's own fields, in the order they were first seen — see
    /// `crate::json`.
    dynamic_fields: RefCell<AnyDictionary>,
    parent: RefCell<Option<Weak<Node>>>,
    /// `pub(crate)` rather than private: the JSON codec (`crate::json`,
    /// a sibling module, not a descendant of this one) needs to match on
    /// and, for reference-cycle placeholders, overwrite this directly.
    pub(crate) kind: RefCell<NodeKind>,
}

#[derive(Debug)]
pub enum NodeKind {
    Clip(item::ItemState, clip::ClipState),
    Gap(item::ItemState),
    Track(item::ItemState, composition::CompositionState, TrackKind),
    Stack(item::ItemState, composition::CompositionState),
    Transition(transition::TransitionState),
    Timeline(timeline::TimelineState),
    SerializableCollection(timeline::CollectionState),
    UnknownSchema(UnknownState),
}

#[derive(Debug, Clone)]
pub struct UnknownState {
    pub original_schema_name: String,
    pub original_schema_version: i64,
    pub fields: AnyDictionary,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> NodeRef {
        Rc::new(Node {
            name: RefCell::new(name.into()),
            metadata: RefCell::new(AnyDictionary::new()),
            dynamic_fields: RefCell::new(AnyDictionary::new()),
            parent: RefCell::new(None),
            kind: RefCell::new(kind),
        })
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    pub fn metadata(&self) -> AnyDictionary {
        self.metadata.borrow().clone()
    }

    pub fn set_metadata(&self, metadata: AnyDictionary) {
        *self.metadata.borrow_mut() = metadata;
    }

    /// Fields seen on read that no known field claims. Empty for any node
    /// built directly through this crate's constructors; populated only by
    /// `crate::json`'s reader when a newer writer emitted more than this
    /// crate's schemas know about.
    pub fn dynamic_fields(&self) -> AnyDictionary {
        self.dynamic_fields.borrow().clone()
    }

    pub fn set_dynamic_fields(&self, fields: AnyDictionary) {
        *self.dynamic_fields.borrow_mut() = fields;
    }

    pub fn schema_name(&self) -> String {
        match &*self.kind.borrow() {
            NodeKind::Clip(..) => "Clip".to_string(),
            NodeKind::Gap(..) => "Gap".to_string(),
            NodeKind::Track(..) => "Track".to_string(),
            NodeKind::Stack(..) => "Stack".to_string(),
            NodeKind::Transition(..) => "Transition".to_string(),
            NodeKind::Timeline(..) => "Timeline".to_string(),
            NodeKind::SerializableCollection(..) => "SerializableCollection".to_string(),
            NodeKind::UnknownSchema(u) => u.original_schema_name.clone(),
        }
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent_raw(&self, parent: Option<&NodeRef>) {
        *self.parent.borrow_mut() = parent.map(Rc::downgrade);
    }

    /// `Some((name, version))` iff this node is an `UnknownSchema` wrapper —
    /// used by the codec and the registry to recover what was actually on
    /// disk without exposing the `NodeKind` match arms outside this module.
    pub fn original_schema(&self) -> Option<(String, i64)> {
        match &*self.kind.borrow() {
            NodeKind::UnknownSchema(u) => Some((u.original_schema_name.clone(), u.original_schema_version)),
            _ => None,
        }
    }
}

/// Attach `child` as a member of `parent`'s Composable family. Fails if
/// `child` already has a (different) parent — `set_parent` elsewhere in the
/// schema family only ever clears or assigns from `None`.
pub(crate) fn claim_parent(child: &NodeRef, parent: &NodeRef) -> Result<()> {
    if child.parent().is_some() {
        return Err(Error::ChildAlreadyParented);
    }
    child.set_parent_raw(Some(parent));
    Ok(())
}

pub(crate) fn release_parent(child: &NodeRef) {
    child.set_parent_raw(None);
}

/// Deep-clone a node and everything it owns (children, for a Composition;
/// the root Stack, for a Timeline), producing a fresh, parent-less subtree.
/// Used by every algorithm that needs to hand out a node the caller can
/// mutate independently of the source graph (`flatten_stack`,
/// `track_trimmed_to_range`, the track visual diff, and
/// `SerializableObject`'s reserialize-based clone).
pub fn clone_node(node: &NodeRef) -> Result<NodeRef> {
    let name = node.name();
    let metadata = node.metadata();
    let dynamic_fields = node.dynamic_fields();
    let kind_clone = match &*node.kind.borrow() {
        NodeKind::Clip(item, clip) => NodeKind::Clip(item.clone(), clip.clone()),
        NodeKind::Gap(item) => NodeKind::Gap(item.clone()),
        NodeKind::Track(item, comp, kind) => {
            let mut new_comp = composition::CompositionState::default();
            for c in &comp.children {
                new_comp.children.push(clone_node(c)?);
            }
            NodeKind::Track(item.clone(), new_comp, *kind)
        }
        NodeKind::Stack(item, comp) => {
            let mut new_comp = composition::CompositionState::default();
            for c in &comp.children {
                new_comp.children.push(clone_node(c)?);
            }
            NodeKind::Stack(item.clone(), new_comp)
        }
        NodeKind::Transition(t) => NodeKind::Transition(t.clone()),
        NodeKind::Timeline(t) => {
            NodeKind::Timeline(timeline::TimelineState {
                global_start_time: t.global_start_time,
                tracks: clone_node(&t.tracks)?,
            })
        }
        NodeKind::SerializableCollection(c) => {
            let mut items = Vec::with_capacity(c.items.len());
            for item in &c.items {
                items.push(clone_node(item)?);
            }
            NodeKind::SerializableCollection(timeline::CollectionState { items })
        }
        NodeKind::UnknownSchema(u) => NodeKind::UnknownSchema(u.clone()),
    };
    let cloned = Node::new(name, kind_clone);
    cloned.set_metadata(metadata);
    cloned.set_dynamic_fields(dynamic_fields);
    match &*cloned.kind.borrow() {
        NodeKind::Track(_, comp, _) | NodeKind::Stack(_, comp) => {
            for c in &comp.children {
                c.set_parent_raw(Some(&cloned));
            }
        }
        NodeKind::Timeline(t) => t.tracks.set_parent_raw(None),
        _ => {}
    }
    Ok(cloned)
}

/// Structural equality between two graph nodes: same schema, same name and
/// metadata, and same kind-specific fields (recursively, for children).
/// Doubles compare by bit pattern, never by epsilon — this is the backbone
/// of invariant 3 (`deserialize(serialize(g)) == g`).
pub fn nodes_structurally_equal(a: &NodeRef, b: &NodeRef) -> bool {
    if a.name() != b.name() || a.metadata() != b.metadata() || a.dynamic_fields() != b.dynamic_fields() {
        return false;
    }
    match (&*a.kind.borrow(), &*b.kind.borrow()) {
        (NodeKind::Clip(ia, ca), NodeKind::Clip(ib, cb)) => {
            item::item_state_eq(ia, ib) && clip::clip_state_eq(ca, cb)
        }
        (NodeKind::Gap(ia), NodeKind::Gap(ib)) => item::item_state_eq(ia, ib),
        (NodeKind::Track(ia, compa, ka), NodeKind::Track(ib, compb, kb)) => {
            ka == kb && item::item_state_eq(ia, ib) && composition::composition_state_eq(compa, compb)
        }
        (NodeKind::Stack(ia, compa), NodeKind::Stack(ib, compb)) => {
            item::item_state_eq(ia, ib) && composition::composition_state_eq(compa, compb)
        }
        (NodeKind::Transition(ta), NodeKind::Transition(tb)) => transition::transition_state_eq(ta, tb),
        (NodeKind::Timeline(ta), NodeKind::Timeline(tb)) => timeline::timeline_state_eq(ta, tb),
        (NodeKind::SerializableCollection(ca), NodeKind::SerializableCollection(cb)) => {
            timeline::collection_state_eq(ca, cb)
        }
        (NodeKind::UnknownSchema(ua), NodeKind::UnknownSchema(ub)) => {
            ua.original_schema_name == ub.original_schema_name
                && ua.original_schema_version == ub.original_schema_version
                && ua.fields == ub.fields
        }
        _ => false,
    }
}
