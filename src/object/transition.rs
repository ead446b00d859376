// src/object/transition.rs
//
// Transition: a Composable (not an Item — no source_range/effects/markers)
// that occupies zero duration on its track's timeline but consumes
// `in_offset` from the tail of the preceding Item and `out_offset` from the
// head of the following one.

use crate::error::{Error, Result};
use crate::object::{Node, NodeKind, NodeRef};
use crate::time::RationalTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    SmoothCut,
    Custom(u8),
}

impl TransitionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionType::SmoothCut => "SMPTE_Dissolve",
            TransitionType::Custom(_) => "Custom_Transition",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransitionState {
    pub transition_type: TransitionType,
    pub in_offset: RationalTime,
    pub out_offset: RationalTime,
}

pub(crate) fn transition_state_eq(a: &TransitionState, b: &TransitionState) -> bool {
    a.transition_type == b.transition_type && a.in_offset == b.in_offset && a.out_offset == b.out_offset
}

/// Wrapper over a `NodeKind::Transition` node.
#[derive(Debug, Clone)]
pub struct Transition(pub(crate) NodeRef);

impl Transition {
    pub fn new(name: impl Into<String>, transition_type: TransitionType, in_offset: RationalTime, out_offset: RationalTime) -> Self {
        Transition(Node::new(name, NodeKind::Transition(TransitionState { transition_type, in_offset, out_offset })))
    }

    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    pub fn from_node(node: NodeRef) -> Result<Self> {
        match &*node.kind.borrow() {
            NodeKind::Transition(_) => Ok(Transition(node.clone())),
            _ => Err(Error::TypeMismatch { expected: "Transition", found: "other" }),
        }
    }

    pub fn in_offset(&self) -> RationalTime {
        match &*self.0.kind.borrow() {
            NodeKind::Transition(t) => t.in_offset,
            _ => unreachable!(),
        }
    }

    pub fn out_offset(&self) -> RationalTime {
        match &*self.0.kind.borrow() {
            NodeKind::Transition(t) => t.out_offset,
            _ => unreachable!(),
        }
    }

    /// `duration = in_offset + out_offset` (spec.md §3.2).
    pub fn duration(&self) -> RationalTime {
        let (i, o) = match &*self.0.kind.borrow() {
            NodeKind::Transition(t) => (t.in_offset, t.out_offset),
            _ => unreachable!(),
        };
        i + o
    }
}
