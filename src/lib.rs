//! reeltime: a domain-independent editorial timeline library.
//!
//! ## Modules
//!
//! - [`time`]: rational time arithmetic, ranges, transforms, SMPTE timecode
//! - [`any`]: the dynamically-typed value bus (`AnyValue`, `AnyDictionary`, `AnyVector`)
//! - [`object`]: the composition graph (`Clip`, `Gap`, `Track`, `Stack`, `Transition`, `Timeline`)
//! - [`registry`]: the process-wide schema registry the JSON codec reads and writes through
//! - [`json`]: the versioned JSON wire format
//! - [`error`]: the crate's error type
//!
//! A typical program builds a [`object::Timeline`] out of [`object::Track`]s of
//! [`object::Clip`]s and [`object::Gap`]s, queries it with the timing algebra in
//! [`object::composition`] and [`object::algorithms`], and reads or writes it with
//! [`json::read_from_string`]/[`json::write_to_string`].

pub mod any;
pub mod error;
pub mod json;
pub mod object;
pub mod registry;
pub mod time;

pub use error::{Error, Result};
