// src/json/value.rs
//
// AnyValue <-> serde_json::Value. Time types already derive Serde
// (`RationalTime`, `TimeRange`, `TimeTransform`, `V2d`, `Box2d`), so this
// just serializes them normally and tags the result with OTIO_SCHEMA; a
// plain dictionary never carries that key, which is what the reader uses
// to tell the two apart.

use serde_json::{Map, Value};

use crate::any::{AnyDictionary, AnyValue, AnyVector, Box2d, V2d};
use crate::error::{Error, Result};
use crate::time::{RationalTime, TimeRange, TimeTransform};

use super::{read_node, write_node, ReaderState, WriterState};

const RATIONAL_TIME: &str = "RationalTime";
const TIME_RANGE: &str = "TimeRange";
const TIME_TRANSFORM: &str = "TimeTransform";
const V2D: &str = "V2d";
const BOX2D: &str = "Box2d";

pub(crate) fn any_value_to_json(value: &AnyValue, state: &mut WriterState) -> Result<Value> {
    Ok(match value {
        AnyValue::Null => Value::Null,
        AnyValue::Bool(b) => Value::Bool(*b),
        AnyValue::Int(i) => Value::from(*i),
        AnyValue::UInt(u) => Value::from(*u),
        AnyValue::Double(d) => serde_json::Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.clone()),
        AnyValue::Time(t) => tagged(t, RATIONAL_TIME)?,
        AnyValue::TimeRange(r) => tagged(r, TIME_RANGE)?,
        AnyValue::TimeTransform(t) => tagged(t, TIME_TRANSFORM)?,
        AnyValue::V2d(v) => tagged(v, V2D)?,
        AnyValue::Box2d(b) => tagged(b, BOX2D)?,
        AnyValue::Object(node) => write_node(node, state)?,
        AnyValue::Dict(d) => {
            let mut map = Map::new();
            for (key, v) in d.iter() {
                map.insert(key, any_value_to_json(&v, state)?);
            }
            Value::Object(map)
        }
        AnyValue::Vector(v) => {
            let mut items = Vec::with_capacity(v.len());
            for item in v.iter() {
                items.push(any_value_to_json(&item, state)?);
            }
            Value::Array(items)
        }
    })
}

fn tagged(value: &impl serde::Serialize, schema: &str) -> Result<Value> {
    let serialized = serde_json::to_value(value).map_err(json_err)?;
    let Value::Object(fields) = serialized else {
        return Err(Error::InternalError(format!("{schema} did not serialize to a JSON object")));
    };
    let mut map = Map::with_capacity(fields.len() + 1);
    map.insert("OTIO_SCHEMA".to_string(), Value::String(format!("{schema}.1")));
    for (key, value) in fields {
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

fn json_err(e: serde_json::Error) -> Error {
    Error::JsonParseError(e.to_string())
}

pub(crate) fn json_to_any_value(value: &Value, state: &mut ReaderState) -> Result<AnyValue> {
    match value {
        Value::Null => Ok(AnyValue::Null),
        Value::Bool(b) => Ok(AnyValue::Bool(*b)),
        Value::Number(n) => Ok(if let Some(i) = n.as_i64() {
            AnyValue::Int(i)
        } else if let Some(u) = n.as_u64() {
            AnyValue::UInt(u)
        } else {
            AnyValue::Double(n.as_f64().unwrap_or(0.0))
        }),
        Value::String(s) => Ok(AnyValue::String(s.clone())),
        Value::Array(items) => {
            let mut vec = Vec::with_capacity(items.len());
            for item in items {
                vec.push(json_to_any_value(item, state)?);
            }
            Ok(AnyValue::Vector(AnyVector::from_vec(vec)))
        }
        Value::Object(map) => object_to_any_value(map, value, state),
    }
}

fn object_to_any_value(map: &Map<String, Value>, value: &Value, state: &mut ReaderState) -> Result<AnyValue> {
    if map.contains_key("OTIO_REF") {
        return Ok(AnyValue::Object(read_node(value, state)?));
    }
    match map.get("OTIO_SCHEMA").and_then(Value::as_str).map(schema_name) {
        Some(RATIONAL_TIME) => Ok(AnyValue::Time(untagged::<RationalTime>(value)?)),
        Some(TIME_RANGE) => Ok(AnyValue::TimeRange(untagged::<TimeRange>(value)?)),
        Some(TIME_TRANSFORM) => Ok(AnyValue::TimeTransform(untagged::<TimeTransform>(value)?)),
        Some(V2D) => Ok(AnyValue::V2d(untagged::<V2d>(value)?)),
        Some(BOX2D) => Ok(AnyValue::Box2d(untagged::<Box2d>(value)?)),
        Some(_) => Ok(AnyValue::Object(read_node(value, state)?)),
        None => {
            let mut dict = AnyDictionary::new();
            for (key, v) in map {
                dict.insert(key.clone(), json_to_any_value(v, state)?);
            }
            Ok(AnyValue::Dict(dict))
        }
    }
}

fn schema_name(tag: &str) -> &str {
    tag.rsplit_once('.').map_or(tag, |(name, _)| name)
}

fn untagged<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
    let mut stripped = value.clone();
    if let Value::Object(map) = &mut stripped {
        map.remove("OTIO_SCHEMA");
    }
    serde_json::from_value(stripped).map_err(json_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_state(options: &super::super::WriteOptions) -> WriterState {
        WriterState {
            ref_counts: Default::default(),
            written: Default::default(),
            id_of: Default::default(),
            next_index: Default::default(),
            options,
        }
    }

    #[test]
    fn rational_time_round_trips_through_its_schema_tag() {
        let options = super::super::WriteOptions::default();
        let mut writer = writer_state(&options);
        let t = RationalTime::new(48.0, 24.0);
        let json = any_value_to_json(&AnyValue::Time(t), &mut writer).unwrap();
        assert_eq!(json.get("OTIO_SCHEMA").and_then(Value::as_str), Some("RationalTime.1"));

        let mut reader = ReaderState { by_id: Default::default(), options: super::super::ReadOptions::default() };
        match json_to_any_value(&json, &mut reader).unwrap() {
            AnyValue::Time(rt) => assert_eq!(rt, t),
            other => panic!("expected AnyValue::Time, got {other:?}"),
        }
    }

    #[test]
    fn plain_dict_has_no_schema_tag() {
        let options = super::super::WriteOptions::default();
        let mut writer = writer_state(&options);
        let mut d = AnyDictionary::new();
        d.insert("note", AnyValue::String("hi".into()));
        let json = any_value_to_json(&AnyValue::Dict(d), &mut writer).unwrap();
        assert!(json.get("OTIO_SCHEMA").is_none());
    }
}
