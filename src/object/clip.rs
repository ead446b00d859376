// src/object/clip.rs
//
// Clip: an Item naming a media reference. Gap: an Item that is nothing
// more than a placeholder of a given duration — it carries no fields beyond
// the common Item ones, so it wraps `NodeKind::Gap(ItemState)` directly.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::object::common::{MediaReference, DEFAULT_MEDIA_KEY};
use crate::object::composition;
use crate::object::item::ItemState;
use crate::object::{Node, NodeKind, NodeRef};
use crate::time::{RationalTime, TimeRange};

#[derive(Debug, Clone)]
pub struct ClipState {
    pub media_references: HashMap<String, MediaReference>,
    pub active_media_reference_key: String,
}

impl Default for ClipState {
    fn default() -> Self {
        Self { media_references: HashMap::new(), active_media_reference_key: DEFAULT_MEDIA_KEY.to_string() }
    }
}

pub(crate) fn clip_state_eq(a: &ClipState, b: &ClipState) -> bool {
    a.active_media_reference_key == b.active_media_reference_key
        && a.media_references.len() == b.media_references.len()
        && a.media_references.keys().all(|k| {
            matches!((a.media_references.get(k), b.media_references.get(k)), (Some(x), Some(y)) if x == y)
        })
}

pub(crate) fn available_range(clip: &ClipState) -> Result<TimeRange> {
    let active = clip
        .media_references
        .get(&clip.active_media_reference_key)
        .ok_or_else(|| Error::KeyNotFound(clip.active_media_reference_key.clone()))?;
    active.available_range().ok_or_else(|| {
        Error::CannotComputeAvailableRange(format!(
            "media reference '{}' supplies no available_range",
            clip.active_media_reference_key
        ))
    })
}

/// Wrapper over a `NodeKind::Clip` node.
#[derive(Debug, Clone)]
pub struct Clip(pub(crate) NodeRef);

impl Clip {
    pub fn new(name: impl Into<String>, media_reference: Option<MediaReference>) -> Self {
        let mut state = ClipState::default();
        if let Some(reference) = media_reference {
            state.media_references.insert(DEFAULT_MEDIA_KEY.to_string(), reference);
        }
        let node = Node::new(name, NodeKind::Clip(ItemState::default(), state));
        Clip(node)
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Clip(..) => Ok(Clip(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Clip", found: "other" }),
        }
    }

    pub fn set_media_reference(&self, key: impl Into<String>, reference: MediaReference) {
        if let NodeKind::Clip(_, state) = &mut *self.0.kind.borrow_mut() {
            state.media_references.insert(key.into(), reference);
        }
    }

    pub fn set_active_media_reference_key(&self, key: impl Into<String>) -> Result<()> {
        let key = key.into();
        match &mut *self.0.kind.borrow_mut() {
            NodeKind::Clip(_, state) => {
                if !state.media_references.contains_key(&key) {
                    return Err(Error::KeyNotFound(key));
                }
                state.active_media_reference_key = key;
                Ok(())
            }
            _ => unreachable!("Clip wrapper always wraps NodeKind::Clip"),
        }
    }

    pub fn active_media_reference(&self) -> Result<MediaReference> {
        match &*self.0.kind.borrow() {
            NodeKind::Clip(_, state) => state
                .media_references
                .get(&state.active_media_reference_key)
                .cloned()
                .ok_or_else(|| Error::KeyNotFound(state.active_media_reference_key.clone())),
            _ => unreachable!(),
        }
    }

    pub fn available_range(&self) -> Result<TimeRange> {
        crate::object::item::available_range(&self.0)
    }

    pub fn trimmed_range(&self) -> Result<TimeRange> {
        crate::object::item::trimmed_range(&self.0)
    }

    pub fn duration(&self) -> Result<RationalTime> {
        crate::object::item::duration(&self.0)
    }

    /// The clip's trimmed range in its parent Track's coordinate system,
    /// extended by adjacent Transition offsets — what a viewer sees on
    /// either side of a cut. Returned at the clip's own rate.
    pub fn visible_range(&self) -> Result<TimeRange> {
        let parent = self.0.parent().ok_or(Error::NotAChild)?;
        let base = composition::range_of_child(&parent, &self.0)?;
        let (in_handle, out_handle) = composition::handles_of_child(&parent, &self.0)?;

        let rate = self.duration()?.rate;
        let mut start = base.start_time.rescaled_to(rate);
        let mut duration = base.duration.rescaled_to(rate);
        if let Some(h) = in_handle {
            let h = h.rescaled_to(rate);
            start = start - h;
            duration = duration + h;
        }
        if let Some(h) = out_handle {
            duration = duration + h.rescaled_to(rate);
        }
        Ok(TimeRange::new(start, duration))
    }
}

/// Wrapper over a `NodeKind::Gap` node.
#[derive(Debug, Clone)]
pub struct Gap(pub(crate) NodeRef);

impl Gap {
    pub fn new(name: impl Into<String>, duration: TimeRange) -> Self {
        let state = ItemState { source_range: Some(duration), ..ItemState::default() };
        Gap(Node::new(name, NodeKind::Gap(state)))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Gap(..) => Ok(Gap(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Gap", found: "other" }),
        }
    }

    pub fn duration(&self) -> Result<RationalTime> {
        crate::object::item::duration(&self.0)
    }
}
