// src/json/mod.rs
//
// The wire format. A schema object is a JSON object whose first key is
// `OTIO_SCHEMA` ("<Name>.<version>"); everything after that is the
// schema's own fields in a fixed order, then whatever dynamic fields this
// crate didn't recognize on read. Objects referenced from more than one
// place in the graph are written once (carrying `OTIO_REF_ID`) and every
// later occurrence is a one-key `{"OTIO_REF": "<id>"}` pointer — this is
// also how language-level cycles through dynamic fields round-trip without
// the writer recursing forever.
//
// `RationalTime`, `TimeRange`, `TimeTransform`, `V2d` and `Box2d` get the
// same `OTIO_SCHEMA` treatment as graph objects so a reader can tell a time
// value apart from an ordinary nested dictionary; they're never reference
// counted since they're plain values, not `SerializableObject`s.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::any::{AnyDictionary, AnyValue};
use crate::error::{Error, Result};
use crate::object::{self, Node, NodeKind, NodeRef, UnknownState};

mod fields;
mod value;

use fields::{kind_from_fields, kind_to_fields};
use value::{any_value_to_json, json_to_any_value};

/// Options controlling what the reader tolerates.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// If set, schema versions newer than this crate's `current_version`
    /// are rejected with `SCHEMA_VERSION_UNSUPPORTED` instead of being read
    /// as best-effort. Off by default: unknown *future* fields land in
    /// dynamic fields either way.
    pub strict_versions: bool,
}

/// Options controlling how the writer emits JSON.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub indent: usize,
    /// Per-schema target version. An object whose registered
    /// `current_version` exceeds its entry here is downgraded before
    /// emission (spec.md's `target_family_label_spec`).
    pub target_family_label_spec: Option<HashMap<String, i64>>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { indent: 4, target_family_label_spec: None }
    }
}

pub(crate) struct WriterState<'a> {
    ref_counts: HashMap<usize, usize>,
    written: HashSet<usize>,
    id_of: HashMap<usize, String>,
    next_index: HashMap<String, u64>,
    options: &'a WriteOptions,
}

pub(crate) struct ReaderState {
    by_id: HashMap<String, NodeRef>,
    options: ReadOptions,
}

/// Serialize `root` (a `Timeline`, `Stack`, `Track`, `Clip`, or any other
/// graph node) to a JSON string.
pub fn write_to_string(root: &NodeRef, options: &WriteOptions) -> Result<String> {
    crate::registry::ensure_builtins_registered();
    tracing::debug!(schema = %root.schema_name(), "serializing graph to JSON");
    let mut counts = HashMap::new();
    let mut explored = HashSet::new();
    count_refs(root, &mut counts, &mut explored);

    let mut state = WriterState {
        ref_counts: counts,
        written: HashSet::new(),
        id_of: HashMap::new(),
        next_index: HashMap::new(),
        options,
    };
    let value = write_node(root, &mut state)?;
    let buf = Vec::new();
    let indent = vec![b' '; options.indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut ser = serde_json::Serializer::with_formatter(buf, formatter);
    value.serialize(&mut ser).map_err(|e| Error::JsonParseError(e.to_string()))?;
    String::from_utf8(ser.into_inner()).map_err(|e| Error::JsonParseError(e.to_string()))
}

pub fn write_to_file(root: &NodeRef, path: &std::path::Path, options: &WriteOptions) -> Result<()> {
    let text = write_to_string(root, options)?;
    std::fs::write(path, text).map_err(Error::FileWriteFailed)
}

/// Deserialize a JSON document produced by [`write_to_string`] (or by
/// anything else following the same wire format) back into a graph.
pub fn read_from_string(text: &str, options: &ReadOptions) -> Result<NodeRef> {
    crate::registry::ensure_builtins_registered();
    let value: Value = serde_json::from_str(text).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse JSON document");
        Error::JsonParseError(e.to_string())
    })?;
    let mut state = ReaderState { by_id: HashMap::new(), options: options.clone() };
    let node = read_node(&value, &mut state)?;
    tracing::debug!(schema = %node.schema_name(), objects = state.by_id.len(), "parsed JSON document");
    Ok(node)
}

pub fn read_from_file(path: &std::path::Path, options: &ReadOptions) -> Result<NodeRef> {
    let text = std::fs::read_to_string(path).map_err(Error::FileOpenFailed)?;
    read_from_string(&text, options)
}

// ---------------------------------------------------------------------
// Reference-counting pre-pass
// ---------------------------------------------------------------------

fn direct_children(node: &NodeRef) -> Vec<NodeRef> {
    match &*node.kind.borrow() {
        NodeKind::Track(_, comp, _) | NodeKind::Stack(_, comp) => comp.children.clone(),
        NodeKind::Timeline(t) => vec![t.tracks.clone()],
        NodeKind::SerializableCollection(c) => c.items.clone(),
        _ => Vec::new(),
    }
}

fn count_refs(node: &NodeRef, counts: &mut HashMap<usize, usize>, explored: &mut HashSet<usize>) {
    let ptr = Rc::as_ptr(node) as usize;
    *counts.entry(ptr).or_insert(0) += 1;
    if !explored.insert(ptr) {
        return;
    }
    for child in direct_children(node) {
        count_refs(&child, counts, explored);
    }
    count_refs_in_dict(&node.metadata(), counts, explored);
    count_refs_in_dict(&node.dynamic_fields(), counts, explored);
}

fn count_refs_in_dict(dict: &AnyDictionary, counts: &mut HashMap<usize, usize>, explored: &mut HashSet<usize>) {
    for (_, v) in dict.iter() {
        count_refs_in_value(&v, counts, explored);
    }
}

fn count_refs_in_value(value: &AnyValue, counts: &mut HashMap<usize, usize>, explored: &mut HashSet<usize>) {
    match value {
        AnyValue::Object(n) => count_refs(n, counts, explored),
        AnyValue::Dict(d) => count_refs_in_dict(d, counts, explored),
        AnyValue::Vector(v) => {
            for item in v.iter() {
                count_refs_in_value(&item, counts, explored);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------

fn next_id_for(schema_name: &str, state: &mut WriterState) -> String {
    let counter = state.next_index.entry(schema_name.to_string()).or_insert(0);
    *counter += 1;
    format!("{schema_name}-{counter}")
}

pub(crate) fn write_node(node: &NodeRef, state: &mut WriterState) -> Result<Value> {
    let ptr = Rc::as_ptr(node) as usize;
    if state.written.contains(&ptr) {
        let id = state.id_of.get(&ptr).cloned().ok_or_else(|| {
            Error::InternalError("object written without an assigned reference id".into())
        })?;
        let mut map = Map::new();
        map.insert("OTIO_REF".to_string(), Value::String(id));
        return Ok(Value::Object(map));
    }
    state.written.insert(ptr);

    let schema_name = node.schema_name();
    let mut map = Map::new();

    if let Some((original_name, original_version)) = node.original_schema() {
        map.insert("OTIO_SCHEMA".to_string(), Value::String(format!("{original_name}.{original_version}")));
        maybe_assign_ref_id(node, ptr, &schema_name, &mut map, state);
        let fields = match &*node.kind.borrow() {
            NodeKind::UnknownSchema(u) => u.fields.clone(),
            _ => unreachable!(),
        };
        for (key, v) in fields.iter() {
            map.insert(key, any_value_to_json(&v, state)?);
        }
        return Ok(Value::Object(map));
    }

    let current = crate::registry::current_version(&schema_name).unwrap_or(1);
    let target = state
        .options
        .target_family_label_spec
        .as_ref()
        .and_then(|spec| spec.get(&schema_name))
        .copied()
        .unwrap_or(current);

    map.insert("OTIO_SCHEMA".to_string(), Value::String(format!("{schema_name}.{target}")));
    maybe_assign_ref_id(node, ptr, &schema_name, &mut map, state);

    let mut fields = kind_to_fields(node)?;
    fields.insert("metadata", AnyValue::Dict(node.metadata()));
    if target < current {
        fields = crate::registry::downgrade(&schema_name, target, fields);
    }
    for (key, v) in fields.iter() {
        map.insert(key, any_value_to_json(&v, state)?);
    }
    for (key, v) in node.dynamic_fields().iter() {
        map.insert(key, any_value_to_json(&v, state)?);
    }
    Ok(Value::Object(map))
}

fn maybe_assign_ref_id(node: &NodeRef, ptr: usize, schema_name: &str, map: &mut Map<String, Value>, state: &mut WriterState) {
    let _ = node;
    if state.ref_counts.get(&ptr).copied().unwrap_or(1) > 1 {
        let id = next_id_for(schema_name, state);
        state.id_of.insert(ptr, id.clone());
        map.insert("OTIO_REF_ID".to_string(), Value::String(id));
    }
}

// ---------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------

pub(crate) fn read_node(value: &Value, state: &mut ReaderState) -> Result<NodeRef> {
    let obj = value.as_object().ok_or_else(|| Error::MalformedSchema("expected a JSON object".into()))?;

    if let Some(Value::String(id)) = obj.get("OTIO_REF") {
        return state.by_id.get(id).cloned().ok_or_else(|| Error::UnresolvedObjectReference(id.clone()));
    }

    let header = obj
        .get("OTIO_SCHEMA")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedSchema("missing OTIO_SCHEMA".into()))?;
    let (schema_name, version_str) =
        header.rsplit_once('.').ok_or_else(|| Error::MalformedSchema(format!("malformed OTIO_SCHEMA '{header}'")))?;
    let on_disk_version: i64 =
        version_str.parse().map_err(|_| Error::MalformedSchema(format!("malformed OTIO_SCHEMA '{header}'")))?;

    if state.options.strict_versions {
        if let Some(current) = crate::registry::current_version(schema_name) {
            if on_disk_version > current {
                return Err(Error::SchemaVersionUnsupported {
                    name: schema_name.to_string(),
                    version: on_disk_version,
                });
            }
        }
    }

    let ref_id = match obj.get("OTIO_REF_ID") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(_) => return Err(Error::MalformedSchema("OTIO_REF_ID must be a string".into())),
        None => None,
    };

    let placeholder = if let Some(id) = &ref_id {
        if state.by_id.contains_key(id) {
            return Err(Error::DuplicateObjectReference(id.clone()));
        }
        let stub = Node::new(
            "",
            NodeKind::UnknownSchema(UnknownState {
                original_schema_name: schema_name.to_string(),
                original_schema_version: on_disk_version,
                fields: AnyDictionary::new(),
            }),
        );
        state.by_id.insert(id.clone(), stub.clone());
        Some(stub)
    } else {
        None
    };

    let mut raw = AnyDictionary::new();
    for (key, v) in obj {
        if key == "OTIO_SCHEMA" || key == "OTIO_REF_ID" {
            continue;
        }
        raw.insert(key.clone(), json_to_any_value(v, state)?);
    }

    let node = if crate::registry::is_registered(schema_name) {
        let upgraded = crate::registry::upgrade(schema_name, on_disk_version, raw);
        let (kind, name, metadata, dynamic) = kind_from_fields(schema_name, upgraded)?;
        finish_node(placeholder, name, kind, metadata, dynamic)
    } else {
        let name = raw.get("name").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let kind = NodeKind::UnknownSchema(UnknownState {
            original_schema_name: schema_name.to_string(),
            original_schema_version: on_disk_version,
            fields: raw,
        });
        finish_node(placeholder, name, kind, AnyDictionary::new(), AnyDictionary::new())
    };

    Ok(node)
}

fn finish_node(
    placeholder: Option<NodeRef>,
    name: String,
    kind: NodeKind,
    metadata: AnyDictionary,
    dynamic_fields: AnyDictionary,
) -> NodeRef {
    let node = match placeholder {
        Some(p) => {
            p.set_name(name);
            *p.kind.borrow_mut() = kind;
            p
        }
        None => Node::new(name, kind),
    };
    node.set_metadata(metadata);
    node.set_dynamic_fields(dynamic_fields);
    reparent_children(&node);
    node
}

fn reparent_children(node: &NodeRef) {
    match &*node.kind.borrow() {
        NodeKind::Track(_, comp, _) | NodeKind::Stack(_, comp) => {
            for child in &comp.children {
                child.set_parent_raw(Some(node));
            }
        }
        NodeKind::Timeline(t) => t.tracks.set_parent_raw(None),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::common::MediaReference;
    use crate::object::{Clip, Gap, SerializableCollection, Stack, Timeline, Track, TrackKind};
    use crate::time::TimeRange;

    fn sample_timeline() -> Timeline {
        let timeline = Timeline::new("reel one");
        let track = Track::new("V1", TrackKind::Video);
        let clip = Clip::new(
            "shot_010",
            Some(MediaReference::External {
                target_url: Some("file:///shot_010.mov".into()),
                available_range: Some(TimeRange::from_components(0.0, 240.0, 24.0)),
                metadata: AnyDictionary::new(),
            }),
        );
        track.append_child(clip.node().clone()).unwrap();
        let gap = Gap::new("slug", TimeRange::from_components(0.0, 12.0, 24.0));
        track.append_child(gap.node().clone()).unwrap();
        timeline.tracks().append_child(track.node().clone()).unwrap();
        timeline
    }

    #[test]
    fn round_trips_a_simple_timeline() {
        let timeline = sample_timeline();
        let options = WriteOptions::default();
        let text = write_to_string(timeline.node(), &options).unwrap();
        assert!(text.starts_with("{\n    \"OTIO_SCHEMA\": \"Timeline.1\""));

        let read_back = read_from_string(&text, &ReadOptions::default()).unwrap();
        assert!(object::nodes_structurally_equal(timeline.node(), &read_back));
    }

    #[test]
    fn multiply_referenced_object_round_trips_through_one_ref_id() {
        let stack = Stack::new("stack");
        let clip = Clip::new("shared", None);
        let collection = SerializableCollection::new("also here");
        collection.push(clip.node().clone());
        stack.node().set_metadata({
            let mut d = AnyDictionary::new();
            d.insert("sibling", AnyValue::Object(collection.node().clone()));
            d
        });
        stack.append_child(clip.node().clone()).unwrap();

        let text = write_to_string(stack.node(), &WriteOptions::default()).unwrap();
        assert!(text.contains("OTIO_REF_ID"));
        assert!(text.contains("OTIO_REF"));

        let read_back = read_from_string(&text, &ReadOptions::default()).unwrap();
        assert!(object::nodes_structurally_equal(stack.node(), &read_back));
    }

    #[test]
    fn unknown_schema_round_trips_verbatim() {
        let doc = r#"{"OTIO_SCHEMA":"TotallyMadeUp.7","name":"mystery","payload":[1,2,3]}"#;
        let read_back = read_from_string(doc, &ReadOptions::default()).unwrap();
        assert_eq!(read_back.schema_name(), "TotallyMadeUp");
        assert_eq!(read_back.original_schema(), Some(("TotallyMadeUp".to_string(), 7)));

        let written = write_to_string(&read_back, &WriteOptions::default()).unwrap();
        let reread = read_from_string(&written, &ReadOptions::default()).unwrap();
        assert!(object::nodes_structurally_equal(&read_back, &reread));
    }

    #[test]
    fn unresolved_reference_is_an_error() {
        let doc = r#"{"OTIO_SCHEMA":"Stack.1","name":"s","children":[{"OTIO_REF":"Clip-99"}]}"#;
        let err = read_from_string(doc, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedObjectReference(_)));
    }
}
