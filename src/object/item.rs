// src/object/item.rs
//
// Fields shared by every Item-kind node (Clip, Gap, Track, Stack):
// `source_range`, `effects`, `markers`, `enabled`. Embedded directly into
// each `NodeKind` arm that is an Item rather than factored into its own
// wrapped type, so that borrowing a node's kind once gives access to both
// the common Item fields and the kind-specific ones.

use crate::error::{Error, Result};
use crate::object::common::{Effect, Marker};
use crate::object::{composition, NodeKind, NodeRef};
use crate::time::{RationalTime, TimeRange};

#[derive(Debug, Clone)]
pub struct ItemState {
    pub source_range: Option<TimeRange>,
    pub effects: Vec<Effect>,
    pub markers: Vec<Marker>,
    pub enabled: bool,
}

impl Default for ItemState {
    fn default() -> Self {
        Self { source_range: None, effects: Vec::new(), markers: Vec::new(), enabled: true }
    }
}

pub(crate) fn item_state_eq(a: &ItemState, b: &ItemState) -> bool {
    a.source_range == b.source_range
        && a.enabled == b.enabled
        && a.effects.len() == b.effects.len()
        && a.markers.len() == b.markers.len()
        && a.effects.iter().zip(b.effects.iter()).all(|(x, y)| {
            x.effect_name == y.effect_name && x.kind == y.kind && x.metadata == y.metadata
        })
        && a.markers.iter().zip(b.markers.iter()).all(|(x, y)| {
            x.name == y.name && x.marked_range == y.marked_range && x.color == y.color && x.metadata == y.metadata
        })
}

fn with_item_state<T>(node: &NodeRef, f: impl FnOnce(&ItemState) -> T) -> Result<T> {
    match &*node.kind.borrow() {
        NodeKind::Clip(item, _) | NodeKind::Gap(item) | NodeKind::Track(item, ..) | NodeKind::Stack(item, _) => {
            Ok(f(item))
        }
        _ => Err(Error::NotAnItem),
    }
}

fn with_item_state_mut<T>(node: &NodeRef, f: impl FnOnce(&mut ItemState) -> T) -> Result<T> {
    match &mut *node.kind.borrow_mut() {
        NodeKind::Clip(item, _) | NodeKind::Gap(item) | NodeKind::Track(item, ..) | NodeKind::Stack(item, _) => {
            Ok(f(item))
        }
        _ => Err(Error::NotAnItem),
    }
}

pub fn source_range(node: &NodeRef) -> Result<Option<TimeRange>> {
    with_item_state(node, |item| item.source_range)
}

pub fn set_source_range(node: &NodeRef, range: Option<TimeRange>) -> Result<()> {
    with_item_state_mut(node, |item| item.source_range = range)
}

pub fn enabled(node: &NodeRef) -> Result<bool> {
    with_item_state(node, |item| item.enabled)
}

pub fn set_enabled(node: &NodeRef, enabled: bool) -> Result<()> {
    with_item_state_mut(node, |item| item.enabled = enabled)
}

pub fn effects(node: &NodeRef) -> Result<Vec<Effect>> {
    with_item_state(node, |item| item.effects.clone())
}

pub fn add_effect(node: &NodeRef, effect: Effect) -> Result<()> {
    with_item_state_mut(node, |item| item.effects.push(effect))
}

pub fn markers(node: &NodeRef) -> Result<Vec<Marker>> {
    with_item_state(node, |item| item.markers.clone())
}

pub fn add_marker(node: &NodeRef, marker: Marker) -> Result<()> {
    with_item_state_mut(node, |item| item.markers.push(marker))
}

/// The item's intrinsic range before any `source_range` trim: for a Clip,
/// its active media reference's available range; for a Composition, the
/// range spanned by laying out its children.
pub fn available_range(node: &NodeRef) -> Result<TimeRange> {
    match &*node.kind.borrow() {
        NodeKind::Clip(_, clip_state) => crate::object::clip::available_range(clip_state),
        NodeKind::Gap(item) => {
            item.source_range.ok_or(Error::CannotComputeAvailableRange("Gap has no source_range".into()))
        }
        NodeKind::Track(..) | NodeKind::Stack(..) => composition::intrinsic_range(node),
        _ => Err(Error::NotAnItem),
    }
}

/// `source_range` when present, else [`available_range`]. This is the
/// "apparent range" an Item presents to its parent composition.
pub fn trimmed_range(node: &NodeRef) -> Result<TimeRange> {
    match source_range(node)? {
        Some(r) => Ok(r),
        None => available_range(node),
    }
}

pub fn duration(node: &NodeRef) -> Result<RationalTime> {
    Ok(trimmed_range(node)?.duration)
}
