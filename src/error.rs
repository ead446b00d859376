// src/error.rs
//
// Structured error type for reeltime.
//
// Every fallible operation in the crate returns `Result<T>` carrying one of
// these variants. The variant names mirror the outcome taxonomy of the
// format this crate reads and writes, so a caller that serializes the error
// (e.g. a CLI built on top of this library) gets a stable, documented string
// back from `Display` rather than having to invent its own vocabulary.

use thiserror::Error;

/// All fallible outcomes produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("NOT_IMPLEMENTED: {0}")]
    NotImplemented(String),

    #[error("UNRESOLVED_OBJECT_REFERENCE: object id '{0}' was referenced but never defined")]
    UnresolvedObjectReference(String),

    #[error("DUPLICATE_OBJECT_REFERENCE: object id '{0}' was defined more than once")]
    DuplicateObjectReference(String),

    #[error("MALFORMED_SCHEMA: {0}")]
    MalformedSchema(String),

    #[error("JSON_PARSE_ERROR: {0}")]
    JsonParseError(String),

    #[error("CHILD_ALREADY_PARENTED: child is already parented elsewhere")]
    ChildAlreadyParented,

    #[error("FILE_OPEN_FAILED: {0}")]
    FileOpenFailed(#[source] std::io::Error),

    #[error("FILE_WRITE_FAILED: {0}")]
    FileWriteFailed(#[source] std::io::Error),

    #[error("SCHEMA_ALREADY_REGISTERED: '{0}'")]
    SchemaAlreadyRegistered(String),

    #[error("SCHEMA_NOT_REGISTERED: '{0}'")]
    SchemaNotRegistered(String),

    #[error("SCHEMA_VERSION_UNSUPPORTED: '{name}' version {version}")]
    SchemaVersionUnsupported { name: String, version: i64 },

    #[error("KEY_NOT_FOUND: '{0}'")]
    KeyNotFound(String),

    #[error("ILLEGAL_INDEX: {0}")]
    IllegalIndex(usize),

    #[error("TYPE_MISMATCH: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("INTERNAL_ERROR: {0}")]
    InternalError(String),

    #[error("NOT_AN_ITEM: object is not an Item")]
    NotAnItem,

    #[error("NOT_A_CHILD_OF: object is not a child of this composition")]
    NotAChildOf,

    #[error("NOT_A_CHILD: object is not a child of any composition")]
    NotAChild,

    #[error("NOT_DESCENDED_FROM: no common ancestor exists")]
    NotDescendedFrom,

    #[error("CANNOT_COMPUTE_AVAILABLE_RANGE: {0}")]
    CannotComputeAvailableRange(String),

    #[error("INVALID_TIME_RANGE: {0}")]
    InvalidTimeRange(String),

    #[error("OBJECT_WITHOUT_DURATION: object has no well-defined duration")]
    ObjectWithoutDuration,

    #[error("CANNOT_TRIM_TRANSITION: trimming would cut a Transition short")]
    CannotTrimTransition,

    #[error("INVALID_TIMECODE_RATE: {0}")]
    InvalidTimecodeRate(f64),

    #[error("INVALID_TIMECODE_STRING: '{0}'")]
    InvalidTimecodeString(String),

    #[error("TIMECODE_RATE_MISMATCH: frame field out of range for rate {0}")]
    TimecodeRateMismatch(f64),

    #[error("INVALID_RATE_FOR_DROP_FRAME_TIMECODE: {0}")]
    InvalidRateForDropFrameTimecode(f64),

    #[error("NEGATIVE_VALUE: {0}")]
    NegativeValue(String),

    #[error("INVALID_TIME_STRING: '{0}'")]
    InvalidTimeString(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_outcome_name() {
        let err = Error::CannotTrimTransition;
        assert!(err.to_string().starts_with("CANNOT_TRIM_TRANSITION"));
    }

    #[test]
    fn file_open_failed_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err = Error::FileOpenFailed(io);
        assert!(err.to_string().starts_with("FILE_OPEN_FAILED"));
    }
}
