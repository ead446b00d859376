// src/json/fields.rs
//
// Per-schema field layout: the fixed key order each `NodeKind` variant
// reads and writes, plus the small value types embedded inside it
// (`Effect`, `Marker`, `MediaReference`) that aren't graph objects and so
// don't go through the reference-counting machinery in `mod.rs` — they're
// plain nested dictionaries, each tagged with its own `OTIO_SCHEMA` purely
// so a reader can tell, say, an `ExternalReference` from a `GeneratorReference`.

use std::collections::HashMap;

use crate::any::{AnyDictionary, AnyValue, AnyVector};
use crate::error::{Error, Result};
use crate::object::clip::ClipState;
use crate::object::common::{
    Effect, EffectKind, LinearTimeWarp, Marker, MarkerColor, MediaReference, MissingFramePolicy, DEFAULT_MEDIA_KEY,
};
use crate::object::composition::CompositionState;
use crate::object::item::ItemState;
use crate::object::timeline::{CollectionState, TimelineState};
use crate::object::transition::TransitionState;
use crate::object::{NodeKind, NodeRef, TrackKind, TransitionType};
use crate::time::{RationalTime, TimeRange};

/// Build the fixed-order field dictionary for `node`'s kind. `name` comes
/// first; `metadata` is appended by the caller afterward, since it's common
/// to every schema and the writer wants it last among known fields.
pub(crate) fn kind_to_fields(node: &NodeRef) -> Result<AnyDictionary> {
    let mut fields = AnyDictionary::new();
    fields.insert("name", AnyValue::String(node.name()));
    match &*node.kind.borrow() {
        NodeKind::Clip(item, clip) => {
            let mut media_references = AnyDictionary::new();
            for (key, reference) in &clip.media_references {
                media_references.insert(key.clone(), media_reference_to_any(reference));
            }
            fields.insert("media_references", AnyValue::Dict(media_references));
            fields.insert("active_media_reference_key", AnyValue::String(clip.active_media_reference_key.clone()));
            item_state_to_fields(item, &mut fields);
        }
        NodeKind::Gap(item) => item_state_to_fields(item, &mut fields),
        NodeKind::Track(item, comp, kind) => {
            fields.insert("kind", AnyValue::String(kind.as_str().to_string()));
            fields.insert("children", children_to_any(comp));
            item_state_to_fields(item, &mut fields);
        }
        NodeKind::Stack(item, comp) => {
            fields.insert("children", children_to_any(comp));
            item_state_to_fields(item, &mut fields);
        }
        NodeKind::Transition(t) => {
            fields.insert("transition_type", AnyValue::String(transition_type_to_wire(t.transition_type)));
            fields.insert("in_offset", AnyValue::Time(t.in_offset));
            fields.insert("out_offset", AnyValue::Time(t.out_offset));
        }
        NodeKind::Timeline(t) => {
            fields.insert("tracks", AnyValue::Object(t.tracks.clone()));
            fields.insert("global_start_time", t.global_start_time.map_or(AnyValue::Null, AnyValue::Time));
        }
        NodeKind::SerializableCollection(c) => {
            let items = c.items.iter().map(|item| AnyValue::Object(item.clone())).collect();
            fields.insert("children", AnyValue::Vector(AnyVector::from_vec(items)));
        }
        NodeKind::UnknownSchema(_) => unreachable!("UnknownSchema is written verbatim in mod.rs"),
    }
    Ok(fields)
}

/// Inverse of [`kind_to_fields`]: given the already name/metadata-stripped,
/// upgraded field dictionary for `schema_name`, build the `NodeKind` plus
/// whatever was left over (the node's dynamic fields).
pub(crate) fn kind_from_fields(
    schema_name: &str,
    mut fields: AnyDictionary,
) -> Result<(NodeKind, String, AnyDictionary, AnyDictionary)> {
    let name = string_field(&mut fields, "name").unwrap_or_default();
    let metadata = match fields.remove("metadata") {
        Some(AnyValue::Dict(d)) => d,
        _ => AnyDictionary::new(),
    };

    let kind = match schema_name {
        "Clip" => {
            let mut media_references = HashMap::new();
            if let Some(AnyValue::Dict(d)) = fields.remove("media_references") {
                for (key, value) in d.iter() {
                    media_references.insert(key, any_to_media_reference(&value)?);
                }
            }
            let active_media_reference_key =
                string_field(&mut fields, "active_media_reference_key").unwrap_or_else(|| DEFAULT_MEDIA_KEY.to_string());
            let item = item_state_from_fields(&mut fields)?;
            NodeKind::Clip(item, ClipState { media_references, active_media_reference_key })
        }
        "Gap" => NodeKind::Gap(item_state_from_fields(&mut fields)?),
        "Track" => {
            let track_kind = match string_field(&mut fields, "kind").as_deref() {
                Some("Audio") => TrackKind::Audio,
                _ => TrackKind::Video,
            };
            let children = children_from_fields(&mut fields)?;
            let item = item_state_from_fields(&mut fields)?;
            NodeKind::Track(item, CompositionState { children }, track_kind)
        }
        "Stack" => {
            let children = children_from_fields(&mut fields)?;
            let item = item_state_from_fields(&mut fields)?;
            NodeKind::Stack(item, CompositionState { children })
        }
        "Transition" => {
            let transition_type = string_field(&mut fields, "transition_type")
                .map(|s| transition_type_from_wire(&s))
                .unwrap_or(TransitionType::SmoothCut);
            let in_offset = time_field(&mut fields, "in_offset");
            let out_offset = time_field(&mut fields, "out_offset");
            NodeKind::Transition(TransitionState { transition_type, in_offset, out_offset })
        }
        "Timeline" => {
            let tracks = match fields.remove("tracks") {
                Some(AnyValue::Object(n)) => n,
                _ => return Err(Error::MalformedSchema("Timeline object missing 'tracks'".into())),
            };
            let global_start_time = match fields.remove("global_start_time") {
                Some(AnyValue::Time(t)) => Some(t),
                _ => None,
            };
            NodeKind::Timeline(TimelineState { global_start_time, tracks })
        }
        "SerializableCollection" => {
            let items = children_from_fields(&mut fields)?;
            NodeKind::SerializableCollection(CollectionState { items })
        }
        other => return Err(Error::SchemaNotRegistered(other.to_string())),
    };
    Ok((kind, name, metadata, fields))
}

fn children_to_any(comp: &CompositionState) -> AnyValue {
    let items = comp.children.iter().map(|c| AnyValue::Object(c.clone())).collect();
    AnyValue::Vector(AnyVector::from_vec(items))
}

fn children_from_fields(fields: &mut AnyDictionary) -> Result<Vec<NodeRef>> {
    match fields.remove("children") {
        Some(AnyValue::Vector(v)) => v
            .iter()
            .map(|item| match item {
                AnyValue::Object(n) => Ok(n),
                _ => Err(Error::MalformedSchema("expected an object in 'children'".into())),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

fn item_state_to_fields(item: &ItemState, fields: &mut AnyDictionary) {
    if let Some(source_range) = item.source_range {
        fields.insert("source_range", AnyValue::TimeRange(source_range));
    }
    let effects = item.effects.iter().map(effect_to_any).collect();
    fields.insert("effects", AnyValue::Vector(AnyVector::from_vec(effects)));
    let markers = item.markers.iter().map(marker_to_any).collect();
    fields.insert("markers", AnyValue::Vector(AnyVector::from_vec(markers)));
    fields.insert("enabled", AnyValue::Bool(item.enabled));
}

fn item_state_from_fields(fields: &mut AnyDictionary) -> Result<ItemState> {
    let source_range = match fields.remove("source_range") {
        Some(AnyValue::TimeRange(r)) => Some(r),
        _ => None,
    };
    let effects = match fields.remove("effects") {
        Some(AnyValue::Vector(v)) => v.iter().map(|e| any_to_effect(&e)).collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    let markers = match fields.remove("markers") {
        Some(AnyValue::Vector(v)) => v.iter().map(|m| any_to_marker(&m)).collect::<Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    let enabled = fields.remove("enabled").and_then(|v| v.as_bool()).unwrap_or(true);
    Ok(ItemState { source_range, effects, markers, enabled })
}

fn string_field(fields: &mut AnyDictionary, key: &str) -> Option<String> {
    fields.remove(key).and_then(|v| v.as_str().map(str::to_string))
}

fn time_field(fields: &mut AnyDictionary, key: &str) -> RationalTime {
    match fields.remove(key) {
        Some(AnyValue::Time(t)) => t,
        _ => RationalTime::zero(),
    }
}

fn transition_type_to_wire(t: TransitionType) -> String {
    match t {
        TransitionType::SmoothCut => "SMPTE_Dissolve".to_string(),
        TransitionType::Custom(n) => format!("Custom_{n}"),
    }
}

fn transition_type_from_wire(s: &str) -> TransitionType {
    if let Some(suffix) = s.strip_prefix("Custom_") {
        TransitionType::Custom(suffix.parse().unwrap_or(0))
    } else {
        TransitionType::SmoothCut
    }
}

fn effect_to_any(effect: &Effect) -> AnyValue {
    let mut d = AnyDictionary::new();
    match &effect.kind {
        EffectKind::Generic => d.insert("OTIO_SCHEMA", AnyValue::String("Effect.1".to_string())),
        EffectKind::TimeEffect => d.insert("OTIO_SCHEMA", AnyValue::String("TimeEffect.1".to_string())),
        EffectKind::LinearTimeWarp(warp) => {
            d.insert("OTIO_SCHEMA", AnyValue::String("LinearTimeWarp.1".to_string()));
            d.insert("time_scalar", AnyValue::Double(warp.time_scalar));
        }
    }
    d.insert("effect_name", AnyValue::String(effect.effect_name.clone()));
    d.insert("metadata", AnyValue::Dict(effect.metadata.clone()));
    AnyValue::Dict(d)
}

fn any_to_effect(value: &AnyValue) -> Result<Effect> {
    let d = value.as_dict().ok_or_else(|| Error::MalformedSchema("expected an Effect object".into()))?;
    let schema = d.get("OTIO_SCHEMA").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
    let effect_name = d.get("effect_name").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
    let metadata = match d.get("metadata") {
        Some(AnyValue::Dict(m)) => m,
        _ => AnyDictionary::new(),
    };
    let kind = if schema.starts_with("LinearTimeWarp") {
        let time_scalar = d.get("time_scalar").and_then(|v| v.as_f64()).unwrap_or(1.0);
        EffectKind::LinearTimeWarp(LinearTimeWarp { time_scalar })
    } else if schema.starts_with("TimeEffect") {
        EffectKind::TimeEffect
    } else {
        EffectKind::Generic
    };
    Ok(Effect { effect_name, kind, metadata })
}

fn marker_to_any(marker: &Marker) -> AnyValue {
    let mut d = AnyDictionary::new();
    d.insert("OTIO_SCHEMA", AnyValue::String("Marker.1".to_string()));
    d.insert("name", AnyValue::String(marker.name.clone()));
    d.insert("marked_range", AnyValue::TimeRange(marker.marked_range));
    d.insert("color", AnyValue::String(marker.color.as_str().to_string()));
    d.insert("metadata", AnyValue::Dict(marker.metadata.clone()));
    AnyValue::Dict(d)
}

fn any_to_marker(value: &AnyValue) -> Result<Marker> {
    let d = value.as_dict().ok_or_else(|| Error::MalformedSchema("expected a Marker object".into()))?;
    let name = d.get("name").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
    let marked_range = match d.get("marked_range") {
        Some(AnyValue::TimeRange(r)) => r,
        _ => return Err(Error::MalformedSchema("Marker missing 'marked_range'".into())),
    };
    let color = marker_color_from_str(d.get("color").and_then(|v| v.as_str().map(str::to_string)).as_deref());
    let metadata = match d.get("metadata") {
        Some(AnyValue::Dict(m)) => m,
        _ => AnyDictionary::new(),
    };
    Ok(Marker { name, marked_range, color, metadata })
}

fn marker_color_from_str(s: Option<&str>) -> MarkerColor {
    match s {
        Some("pink") => MarkerColor::Pink,
        Some("orange") => MarkerColor::Orange,
        Some("yellow") => MarkerColor::Yellow,
        Some("green") => MarkerColor::Green,
        Some("cyan") => MarkerColor::Cyan,
        Some("blue") => MarkerColor::Blue,
        Some("purple") => MarkerColor::Purple,
        Some("magenta") => MarkerColor::Magenta,
        Some("black") => MarkerColor::Black,
        Some("white") => MarkerColor::White,
        _ => MarkerColor::Red,
    }
}

fn insert_available_range(d: &mut AnyDictionary, range: Option<TimeRange>) {
    if let Some(r) = range {
        d.insert("available_range", AnyValue::TimeRange(r));
    }
}

fn media_reference_to_any(reference: &MediaReference) -> AnyValue {
    let mut d = AnyDictionary::new();
    d.insert("OTIO_SCHEMA", AnyValue::String(format!("{}.1", reference.schema_name())));
    match reference {
        MediaReference::External { target_url, available_range, metadata } => {
            if let Some(url) = target_url {
                d.insert("target_url", AnyValue::String(url.clone()));
            }
            insert_available_range(&mut d, *available_range);
            d.insert("metadata", AnyValue::Dict(metadata.clone()));
        }
        MediaReference::Missing { available_range, metadata } => {
            insert_available_range(&mut d, *available_range);
            d.insert("metadata", AnyValue::Dict(metadata.clone()));
        }
        MediaReference::Generator { generator_kind, parameters, available_range, metadata } => {
            d.insert("generator_kind", AnyValue::String(generator_kind.clone()));
            d.insert("parameters", AnyValue::Dict(parameters.clone()));
            insert_available_range(&mut d, *available_range);
            d.insert("metadata", AnyValue::Dict(metadata.clone()));
        }
        MediaReference::ImageSequence {
            target_url_base,
            name_prefix,
            name_suffix,
            start_frame,
            frame_step,
            rate,
            frame_zero_padding,
            missing_frame_policy,
            available_range,
            metadata,
        } => {
            d.insert("target_url_base", AnyValue::String(target_url_base.clone()));
            d.insert("name_prefix", AnyValue::String(name_prefix.clone()));
            d.insert("name_suffix", AnyValue::String(name_suffix.clone()));
            d.insert("start_frame", AnyValue::Int(*start_frame));
            d.insert("frame_step", AnyValue::Int(*frame_step));
            d.insert("rate", AnyValue::Double(*rate));
            d.insert("frame_zero_padding", AnyValue::Int(i64::from(*frame_zero_padding)));
            d.insert("missing_frame_policy", AnyValue::String(missing_frame_policy_to_str(*missing_frame_policy).to_string()));
            insert_available_range(&mut d, *available_range);
            d.insert("metadata", AnyValue::Dict(metadata.clone()));
        }
    }
    AnyValue::Dict(d)
}

fn any_to_media_reference(value: &AnyValue) -> Result<MediaReference> {
    let d = value.as_dict().ok_or_else(|| Error::MalformedSchema("expected a MediaReference object".into()))?;
    let schema = d.get("OTIO_SCHEMA").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
    let available_range = match d.get("available_range") {
        Some(AnyValue::TimeRange(r)) => Some(r),
        _ => None,
    };
    let metadata = match d.get("metadata") {
        Some(AnyValue::Dict(m)) => m,
        _ => AnyDictionary::new(),
    };
    if schema.starts_with("GeneratorReference") {
        let generator_kind = d.get("generator_kind").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let parameters = match d.get("parameters") {
            Some(AnyValue::Dict(p)) => p,
            _ => AnyDictionary::new(),
        };
        return Ok(MediaReference::Generator { generator_kind, parameters, available_range, metadata });
    }
    if schema.starts_with("ImageSequence") {
        let target_url_base = d.get("target_url_base").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let name_prefix = d.get("name_prefix").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let name_suffix = d.get("name_suffix").and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let start_frame = d.get("start_frame").and_then(|v| v.as_i64()).unwrap_or(1);
        let frame_step = d.get("frame_step").and_then(|v| v.as_i64()).unwrap_or(1);
        let rate = d.get("rate").and_then(|v| v.as_f64()).unwrap_or(24.0);
        let frame_zero_padding = d.get("frame_zero_padding").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
        let missing_frame_policy = missing_frame_policy_from_str(
            d.get("missing_frame_policy").and_then(|v| v.as_str().map(str::to_string)).as_deref(),
        );
        return Ok(MediaReference::ImageSequence {
            target_url_base,
            name_prefix,
            name_suffix,
            start_frame,
            frame_step,
            rate,
            frame_zero_padding,
            missing_frame_policy,
            available_range,
            metadata,
        });
    }
    if schema.starts_with("ExternalReference") {
        let target_url = d.get("target_url").and_then(|v| v.as_str().map(str::to_string));
        return Ok(MediaReference::External { target_url, available_range, metadata });
    }
    Ok(MediaReference::Missing { available_range, metadata })
}

fn missing_frame_policy_to_str(policy: MissingFramePolicy) -> &'static str {
    match policy {
        MissingFramePolicy::Error => "error",
        MissingFramePolicy::Hold => "hold",
        MissingFramePolicy::Black => "black",
    }
}

fn missing_frame_policy_from_str(s: Option<&str>) -> MissingFramePolicy {
    match s {
        Some("hold") => MissingFramePolicy::Hold,
        Some("black") => MissingFramePolicy::Black,
        _ => MissingFramePolicy::Error,
    }
}
