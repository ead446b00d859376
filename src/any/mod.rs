// src/any/mod.rs
//
// The any-value bus: a tagged variant that can hold any of the primitive
// and composite types this format is allowed to carry in a dynamic field —
// plus the two container types (`AnyDictionary`, `AnyVector`) that use a
// shared mutation stamp to keep externally-held iterators from crashing the
// process when the container they're walking is mutated or dropped out
// from under them (see `mutation_stamp`).

mod dictionary;
mod mutation_stamp;
mod vector;

pub use dictionary::{AnyDictionary, DictionaryIterator};
pub use mutation_stamp::MutationStamp;
pub use vector::{AnyVector, VectorIterator};

use crate::object::NodeRef;
use crate::time::{RationalTime, TimeRange, TimeTransform};

/// A 2D point, used by spatial metadata (`V2d` in the schema table).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct V2d {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned 2D box, used by spatial metadata (`Box2d`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Box2d {
    pub min: V2d,
    pub max: V2d,
}

/// One dynamically-typed value. Every field not enumerated by a schema's
/// static struct definition is carried as one of these inside that object's
/// metadata dictionary.
#[derive(Debug, Clone)]
pub enum AnyValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    Time(RationalTime),
    TimeRange(TimeRange),
    TimeTransform(TimeTransform),
    V2d(V2d),
    Box2d(Box2d),
    /// A strong reference to another object in the graph. Dynamic fields are
    /// the one place cross-references can form cycles (schema-level parent
    /// pointers are always weak); such cycles are a known, accepted
    /// trade-off of allowing arbitrary object-valued metadata.
    Object(NodeRef),
    Dict(AnyDictionary),
    Vector(AnyVector),
}

impl AnyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AnyValue::Null => "none",
            AnyValue::Bool(_) => "bool",
            AnyValue::Int(_) => "int",
            AnyValue::UInt(_) => "uint",
            AnyValue::Double(_) => "double",
            AnyValue::String(_) => "string",
            AnyValue::Time(_) => "RationalTime",
            AnyValue::TimeRange(_) => "TimeRange",
            AnyValue::TimeTransform(_) => "TimeTransform",
            AnyValue::V2d(_) => "V2d",
            AnyValue::Box2d(_) => "Box2d",
            AnyValue::Object(_) => "SerializableObject",
            AnyValue::Dict(_) => "AnyDictionary",
            AnyValue::Vector(_) => "AnyVector",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnyValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnyValue::Int(i) => Some(*i),
            AnyValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnyValue::Double(d) => Some(*d),
            AnyValue::Int(i) => Some(*i as f64),
            AnyValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&AnyDictionary> {
        match self {
            AnyValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&AnyVector> {
        match self {
            AnyValue::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AnyValue {
    fn from(v: bool) -> Self {
        AnyValue::Bool(v)
    }
}
impl From<i64> for AnyValue {
    fn from(v: i64) -> Self {
        AnyValue::Int(v)
    }
}
impl From<f64> for AnyValue {
    fn from(v: f64) -> Self {
        AnyValue::Double(v)
    }
}
impl From<String> for AnyValue {
    fn from(v: String) -> Self {
        AnyValue::String(v)
    }
}
impl From<&str> for AnyValue {
    fn from(v: &str) -> Self {
        AnyValue::String(v.to_string())
    }
}
impl From<RationalTime> for AnyValue {
    fn from(v: RationalTime) -> Self {
        AnyValue::Time(v)
    }
}
impl From<TimeRange> for AnyValue {
    fn from(v: TimeRange) -> Self {
        AnyValue::TimeRange(v)
    }
}

/// Structural equality between two any-values. Doubles compare by bit
/// pattern (not epsilon) since this backs `==` on containers that in turn
/// back schema-object structural-equivalence checks.
pub(crate) fn any_value_eq(a: &AnyValue, b: &AnyValue) -> bool {
    use AnyValue::*;
    match (a, b) {
        (Null, Null) => true,
        (Bool(x), Bool(y)) => x == y,
        (Int(x), Int(y)) => x == y,
        (UInt(x), UInt(y)) => x == y,
        (Double(x), Double(y)) => x.to_bits() == y.to_bits(),
        (String(x), String(y)) => x == y,
        (Time(x), Time(y)) => x == y,
        (TimeRange(x), TimeRange(y)) => x == y,
        (TimeTransform(x), TimeTransform(y)) => x == y,
        (Dict(x), Dict(y)) => x == y,
        (Vector(x), Vector(y)) => x == y,
        (Object(x), Object(y)) => std::rc::Rc::ptr_eq(x, y),
        _ => false,
    }
}
