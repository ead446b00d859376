// src/object/composition.rs
//
// Track and Stack: the two Composition kinds. Both own an ordered child
// list; a Track lays children out end-to-end (Transitions excepted), a
// Stack lays every child at its own time origin. The timing algebra in
// spec.md §4.6 — range_of_child_at_index, trimmed_range_of_child_at_index,
// range_of_child, range_of_all_children, handles_of_child — lives here as
// free functions over `NodeRef` rather than methods, per the kind-dispatch
// design in `object::mod`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::object::common::TrackKind;
use crate::object::item::{self, ItemState};
use crate::object::{claim_parent, release_parent, Node, NodeKind, NodeRef};
use crate::time::{RationalTime, TimeRange};

#[derive(Debug, Default)]
pub struct CompositionState {
    pub children: Vec<NodeRef>,
}

pub(crate) fn composition_state_eq(a: &CompositionState, b: &CompositionState) -> bool {
    a.children.len() == b.children.len()
        && a.children.iter().zip(b.children.iter()).all(|(x, y)| crate::object::nodes_structurally_equal(x, y))
}

fn is_transition(node: &NodeRef) -> bool {
    matches!(&*node.kind.borrow(), NodeKind::Transition(_))
}

/// Marker trait-ish enum distinguishing the two Composition kinds where a
/// function's behavior genuinely differs (layout, intrinsic range).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Track,
    Stack,
}

fn kind_of(node: &NodeRef) -> Result<Kind> {
    match &*node.kind.borrow() {
        NodeKind::Track(..) => Ok(Kind::Track),
        NodeKind::Stack(..) => Ok(Kind::Stack),
        _ => Err(Error::NotAnItem),
    }
}

fn with_composition<T>(node: &NodeRef, f: impl FnOnce(&CompositionState) -> T) -> Result<T> {
    match &*node.kind.borrow() {
        NodeKind::Track(_, comp, _) | NodeKind::Stack(_, comp) => Ok(f(comp)),
        _ => Err(Error::NotAnItem),
    }
}

fn with_composition_mut<T>(node: &NodeRef, f: impl FnOnce(&mut CompositionState) -> T) -> Result<T> {
    match &mut *node.kind.borrow_mut() {
        NodeKind::Track(_, comp, _) | NodeKind::Stack(_, comp) => Ok(f(comp)),
        _ => Err(Error::NotAnItem),
    }
}

pub fn children(node: &NodeRef) -> Result<Vec<NodeRef>> {
    with_composition(node, |comp| comp.children.clone())
}

pub fn index_of(node: &NodeRef, child: &NodeRef) -> Result<usize> {
    with_composition(node, |comp| comp.children.iter().position(|c| Rc::ptr_eq(c, child)))?
        .ok_or(Error::NotAChildOf)
}

/// Append `child`, claiming its parent pointer. Fails with
/// `CHILD_ALREADY_PARENTED` if `child` is already parented elsewhere.
pub fn append_child(node: &NodeRef, child: NodeRef) -> Result<()> {
    claim_parent(&child, node)?;
    if let Err(e) = with_composition_mut(node, |comp| comp.children.push(child.clone())) {
        release_parent(&child);
        return Err(e);
    }
    Ok(())
}

pub fn insert_child(node: &NodeRef, index: usize, child: NodeRef) -> Result<()> {
    claim_parent(&child, node)?;
    let result = with_composition_mut(node, |comp| {
        if index > comp.children.len() {
            return Err(Error::IllegalIndex(index));
        }
        comp.children.insert(index, child.clone());
        Ok(())
    });
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) | Err(e) => {
            release_parent(&child);
            Err(e)
        }
    }
}

pub fn remove_child_at(node: &NodeRef, index: usize) -> Result<NodeRef> {
    let removed = with_composition_mut(node, |comp| {
        if index >= comp.children.len() {
            return Err(Error::IllegalIndex(index));
        }
        Ok(comp.children.remove(index))
    })??;
    release_parent(&removed);
    Ok(removed)
}

fn sum_preceding_item_durations(comp: &CompositionState, index: usize) -> Result<RationalTime> {
    let mut total: Option<RationalTime> = None;
    for child in &comp.children[..index] {
        if is_transition(child) {
            continue;
        }
        let d = item::trimmed_range(child)?.duration;
        total = Some(match total {
            None => d,
            Some(t) => t + d,
        });
    }
    Ok(total.unwrap_or_else(RationalTime::zero))
}

/// `range_of_child_at_index` (spec.md §4.6). A Track sums preceding
/// siblings' durations (Transitions contribute zero); a Stack roots every
/// child at zero.
pub fn range_of_child_at_index(node: &NodeRef, index: usize) -> Result<TimeRange> {
    let kind = kind_of(node)?;
    with_composition(node, |comp| -> Result<TimeRange> {
        let child = comp.children.get(index).ok_or(Error::IllegalIndex(index))?;
        match kind {
            Kind::Stack => {
                let d = item::trimmed_range(child)?.duration;
                Ok(TimeRange::new(RationalTime::new(0.0, d.rate), d))
            }
            Kind::Track => {
                if is_transition(child) {
                    let start = sum_preceding_item_durations(comp, index)?;
                    return Ok(TimeRange::new(start, RationalTime::new(0.0, start.rate)));
                }
                let start = sum_preceding_item_durations(comp, index)?;
                let d = item::trimmed_range(child)?.duration;
                Ok(TimeRange::new(start.rescaled_to(d.rate), d))
            }
        }
    })?
}

/// `trimmed_range_of_child_at_index`: intersect with the composition's own
/// `source_range`, if any. `None` means the child is fully trimmed away.
pub fn trimmed_range_of_child_at_index(node: &NodeRef, index: usize) -> Result<Option<TimeRange>> {
    let raw = range_of_child_at_index(node, index)?;
    let source_range = item::source_range(node)?;
    match source_range {
        None => Ok(Some(raw)),
        Some(sr) => {
            let clamped = sr.clamped_range(&raw);
            if clamped.duration.value <= 0.0 {
                Ok(None)
            } else {
                Ok(Some(clamped))
            }
        }
    }
}

fn child_index_in_parent(parent: &NodeRef, child: &NodeRef) -> Result<usize> {
    index_of(parent, child)
}

/// `range_of_child`: the range of `descendant` expressed in `ancestor`'s
/// coordinate system, found by composing offsets up the parent chain.
pub fn range_of_child(ancestor: &NodeRef, descendant: &NodeRef) -> Result<TimeRange> {
    let duration = item::trimmed_range(descendant)?.duration;
    let mut node = descendant.clone();
    let mut accumulated_start: Option<RationalTime> = None;
    loop {
        let parent = node.parent().ok_or(Error::NotAChildOf)?;
        let idx = child_index_in_parent(&parent, &node)?;
        let local = range_of_child_at_index(&parent, idx)?;
        accumulated_start = Some(match accumulated_start {
            None => local.start_time,
            Some(acc) => local.start_time.rescaled_to(acc.rate) + acc,
        });
        if Rc::ptr_eq(&parent, ancestor) {
            let start = accumulated_start.unwrap();
            return Ok(TimeRange::new(start, duration.rescaled_to(start.rate)));
        }
        node = parent;
    }
}

/// `range_of_all_children`: one O(n) pass, keyed by child identity (its
/// `Rc` address).
pub fn range_of_all_children(node: &NodeRef) -> Result<HashMap<usize, TimeRange>> {
    let kids = children(node)?;
    let mut out = HashMap::with_capacity(kids.len());
    for (i, child) in kids.iter().enumerate() {
        out.insert(Rc::as_ptr(child) as usize, range_of_child_at_index(node, i)?);
    }
    Ok(out)
}

/// `handles_of_child`: the `in_offset` of a preceding Transition (how far
/// the item's visible head extends backward under it) and the `out_offset`
/// of a following one (how far its visible tail extends forward under it).
pub fn handles_of_child(
    node: &NodeRef,
    child: &NodeRef,
) -> Result<(Option<RationalTime>, Option<RationalTime>)> {
    with_composition(node, |comp| -> Result<(Option<RationalTime>, Option<RationalTime>)> {
        let idx = comp.children.iter().position(|c| Rc::ptr_eq(c, child)).ok_or(Error::NotAChildOf)?;
        let in_handle = if idx > 0 {
            match &*comp.children[idx - 1].kind.borrow() {
                NodeKind::Transition(t) => Some(t.in_offset),
                _ => None,
            }
        } else {
            None
        };
        let out_handle = if idx + 1 < comp.children.len() {
            match &*comp.children[idx + 1].kind.borrow() {
                NodeKind::Transition(t) => Some(t.out_offset),
                _ => None,
            }
        } else {
            None
        };
        Ok((in_handle, out_handle))
    })?
}

/// `transformed_time` (spec.md §4.6): map a time measured in `from_item`'s
/// own coordinates into `to_item`'s coordinates. Walks from `from_item` up
/// to the lowest common ancestor of the two, then back down to `to_item`,
/// composing `range_of_child_at_index` offsets on the way. `NOT_DESCENDED_FROM`
/// if the two items share no ancestor — including the case where one of them
/// is the root of a different graph entirely.
pub fn transformed_time(from_item: &NodeRef, t: RationalTime, to_item: &NodeRef) -> Result<RationalTime> {
    if Rc::ptr_eq(from_item, to_item) {
        return Ok(t);
    }
    let from_chain = ancestor_chain(from_item);
    let to_chain = ancestor_chain(to_item);
    let lca = from_chain
        .iter()
        .find(|candidate| to_chain.iter().any(|n| Rc::ptr_eq(candidate, n)))
        .ok_or(Error::NotDescendedFrom)?;

    let from_offset = if Rc::ptr_eq(from_item, lca) {
        RationalTime::new(0.0, t.rate)
    } else {
        range_of_child(lca, from_item)?.start_time
    };
    let to_offset = if Rc::ptr_eq(to_item, lca) {
        RationalTime::new(0.0, t.rate)
    } else {
        range_of_child(lca, to_item)?.start_time
    };

    let t_in_lca = from_offset.rescaled_to(t.rate) + t;
    Ok(t_in_lca - to_offset.rescaled_to(t_in_lca.rate))
}

fn ancestor_chain(node: &NodeRef) -> Vec<NodeRef> {
    let mut chain = vec![node.clone()];
    let mut cur = node.clone();
    while let Some(parent) = cur.parent() {
        chain.push(parent.clone());
        cur = parent;
    }
    chain
}

pub(crate) fn track_intrinsic_range(comp: &CompositionState) -> Result<TimeRange> {
    if comp.children.is_empty() {
        return Ok(TimeRange::from_components(0.0, 0.0, 1.0));
    }
    let total = sum_preceding_item_durations(comp, comp.children.len())?;
    Ok(TimeRange::new(RationalTime::new(0.0, total.rate), total))
}

pub(crate) fn stack_intrinsic_range(comp: &CompositionState) -> Result<TimeRange> {
    let mut max_duration: Option<RationalTime> = None;
    for child in &comp.children {
        if is_transition(child) {
            continue;
        }
        let d = item::trimmed_range(child)?.duration;
        max_duration = Some(match max_duration {
            None => d,
            Some(m) => {
                let m_s = m.to_seconds();
                let d_s = d.to_seconds();
                if d_s > m_s {
                    d
                } else {
                    m
                }
            }
        });
    }
    let d = max_duration.unwrap_or_else(RationalTime::zero);
    Ok(TimeRange::new(RationalTime::new(0.0, d.rate), d))
}

pub(crate) fn intrinsic_range(node: &NodeRef) -> Result<TimeRange> {
    let kind = kind_of(node)?;
    with_composition(node, |comp| match kind {
        Kind::Track => track_intrinsic_range(comp),
        Kind::Stack => stack_intrinsic_range(comp),
    })?
}

/// Wrapper over a `NodeKind::Track` node.
#[derive(Debug, Clone)]
pub struct Track(pub(crate) NodeRef);

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Track(Node::new(name, NodeKind::Track(ItemState::default(), CompositionState::default(), kind)))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Track(..) => Ok(Track(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Track", found: "other" }),
        }
    }

    pub fn kind(&self) -> TrackKind {
        match &*self.0.kind.borrow() {
            NodeKind::Track(_, _, k) => *k,
            _ => unreachable!(),
        }
    }

    pub fn append_child(&self, child: NodeRef) -> Result<()> {
        append_child(&self.0, child)
    }

    pub fn children(&self) -> Result<Vec<NodeRef>> {
        children(&self.0)
    }

    pub fn duration(&self) -> Result<RationalTime> {
        item::duration(&self.0)
    }
}

/// Wrapper over a `NodeKind::Stack` node.
#[derive(Debug, Clone)]
pub struct Stack(pub(crate) NodeRef);

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Stack(Node::new(name, NodeKind::Stack(ItemState::default(), CompositionState::default())))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Stack(..) => Ok(Stack(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Stack", found: "other" }),
        }
    }

    pub fn append_child(&self, child: NodeRef) -> Result<()> {
        append_child(&self.0, child)
    }

    pub fn children(&self) -> Result<Vec<NodeRef>> {
        children(&self.0)
    }

    pub fn duration(&self) -> Result<RationalTime> {
        item::duration(&self.0)
    }
}

/// Shared surface of Track and Stack, for code that doesn't care which.
pub trait Composition {
    fn node(&self) -> &NodeRef;
}

impl Composition for Track {
    fn node(&self) -> &NodeRef {
        &self.0
    }
}

impl Composition for Stack {
    fn node(&self) -> &NodeRef {
        &self.0
    }
}
