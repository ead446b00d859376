// src/object/common.rs
//
// Small value types shared by several schemas: effects, markers, media
// references. None of these carry a parent pointer or participate in the
// composition graph directly — an Item owns its `Vec<Effect>`/`Vec<Marker>`
// by value, and a Clip owns its `MediaReference`s by value.

use crate::any::AnyDictionary;
use crate::time::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    Pink,
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Magenta,
    Black,
    White,
}

impl MarkerColor {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerColor::Pink => "pink",
            MarkerColor::Red => "red",
            MarkerColor::Orange => "orange",
            MarkerColor::Yellow => "yellow",
            MarkerColor::Green => "green",
            MarkerColor::Cyan => "cyan",
            MarkerColor::Blue => "blue",
            MarkerColor::Purple => "purple",
            MarkerColor::Magenta => "magenta",
            MarkerColor::Black => "black",
            MarkerColor::White => "white",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Marker {
    pub name: String,
    pub marked_range: TimeRange,
    pub color: MarkerColor,
    pub metadata: AnyDictionary,
}

/// `LinearTimeWarp`/`FreezeFrame`, the two built-in `TimeEffect` subclasses.
/// `FreezeFrame` is represented as the `time_scalar == 0.0` special case
/// rather than a distinct struct, matching how the reference schema table
/// treats it as a degenerate LinearTimeWarp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTimeWarp {
    pub time_scalar: f64,
}

impl LinearTimeWarp {
    pub fn freeze_frame() -> Self {
        Self { time_scalar: 0.0 }
    }

    pub fn is_freeze_frame(&self) -> bool {
        self.time_scalar == 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    Generic,
    TimeEffect,
    LinearTimeWarp(LinearTimeWarp),
}

#[derive(Debug, Clone)]
pub struct Effect {
    pub effect_name: String,
    pub kind: EffectKind,
    pub metadata: AnyDictionary,
}

impl Effect {
    pub fn new(effect_name: impl Into<String>) -> Self {
        Self { effect_name: effect_name.into(), kind: EffectKind::Generic, metadata: AnyDictionary::new() }
    }

    pub fn linear_time_warp(effect_name: impl Into<String>, time_scalar: f64) -> Self {
        Self {
            effect_name: effect_name.into(),
            kind: EffectKind::LinearTimeWarp(LinearTimeWarp { time_scalar }),
            metadata: AnyDictionary::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFramePolicy {
    Error,
    Hold,
    Black,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaReference {
    External { target_url: Option<String>, available_range: Option<TimeRange>, metadata: AnyDictionary },
    Missing { available_range: Option<TimeRange>, metadata: AnyDictionary },
    Generator {
        generator_kind: String,
        parameters: AnyDictionary,
        available_range: Option<TimeRange>,
        metadata: AnyDictionary,
    },
    ImageSequence {
        target_url_base: String,
        name_prefix: String,
        name_suffix: String,
        start_frame: i64,
        frame_step: i64,
        rate: f64,
        frame_zero_padding: i32,
        missing_frame_policy: MissingFramePolicy,
        available_range: Option<TimeRange>,
        metadata: AnyDictionary,
    },
}

impl MediaReference {
    pub fn available_range(&self) -> Option<TimeRange> {
        match self {
            MediaReference::External { available_range, .. }
            | MediaReference::Missing { available_range, .. }
            | MediaReference::Generator { available_range, .. }
            | MediaReference::ImageSequence { available_range, .. } => *available_range,
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            MediaReference::External { .. } => "ExternalReference",
            MediaReference::Missing { .. } => "MissingReference",
            MediaReference::Generator { .. } => "GeneratorReference",
            MediaReference::ImageSequence { .. } => "ImageSequence",
        }
    }
}

/// The reserved key a Clip uses for its media reference map when the caller
/// does not name one explicitly.
pub const DEFAULT_MEDIA_KEY: &str = "DEFAULT_MEDIA";
