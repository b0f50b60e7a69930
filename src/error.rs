//! Defines [`GeoUnionError`], representing all errors returned by this crate.

use std::fmt::Debug;

use arrow_schema::ArrowError;
use thiserror::Error;

use crate::meta::ColumnShape;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GeoUnionError {
    /// An offset array that is not non-decreasing, does not start at 0, or is
    /// inconsistent with the level below it.
    #[error("Malformed offsets: {0}")]
    MalformedOffsets(String),

    /// An unrecognized or inconsistent input passed to a constructor.
    #[error("Incompatible construction: {0}")]
    IncompatibleConstruction(String),

    /// A row-level access that the column's shape does not support.
    #[error("Unsupported row access: {0}")]
    UnsupportedRowAccess(String),

    /// No dispatch entry exists for this pair of column shapes.
    #[error("no `{predicate}` entry for geometry combination {left} / {right}")]
    UnsupportedGeometryCombination {
        /// Name of the predicate that was requested.
        predicate: &'static str,
        /// Shape of the left column.
        left: ColumnShape,
        /// Shape of the right column.
        right: ColumnShape,
    },

    /// Nullable export requested where not supported.
    #[error("Nullable export not supported: {0}")]
    NullableUnsupported(String),

    /// Whenever pushing to a container fails because it does not support more entries.
    ///
    /// The solution is usually to use a higher-capacity container-backing type.
    #[error("Overflow: data does not fit in i32 offsets.")]
    Overflow,

    /// [ArrowError]
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, GeoUnionError>;
