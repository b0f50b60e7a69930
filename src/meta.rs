//! Per-row union metadata: the feature tag discriminant and the offset into
//! the typed store that tag names.

use std::fmt;

use arrow_buffer::ScalarBuffer;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{GeoUnionError, Result};

/// Sentinel stored in `union_offsets` for rows whose tag is [`FeatureTag::None`].
pub const NONE_OFFSET: i32 = -1;

/// Discriminant identifying a row's geometry family.
///
/// The values match the child ordering of the dense union interchange format:
/// `[Point, MultiPoint, LineString, Polygon]`, with `None` (-1) marking a row
/// that holds no geometry (produced by alignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i8)]
pub enum FeatureTag {
    /// No geometry in this row.
    None = -1,
    /// Point
    Point = 0,
    /// MultiPoint
    MultiPoint = 1,
    /// LineString or MultiLineString
    LineString = 2,
    /// Polygon or MultiPolygon
    Polygon = 3,
}

/// The uniform feature-tag classification of all rows in a column, or `Mixed`.
///
/// This is the dispatch key for binary predicates. It must be recomputed after
/// every slice or alignment: a subset of a mixed column can be uniform, while
/// a subset of a uniform column never becomes mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnShape {
    /// Every non-NONE row is a Point.
    Point,
    /// Every non-NONE row is a MultiPoint.
    MultiPoint,
    /// Every non-NONE row is a LineString/MultiLineString.
    LineString,
    /// Every non-NONE row is a Polygon/MultiPolygon.
    Polygon,
    /// More than one family is present, or the column is empty.
    Mixed,
}

impl fmt::Display for ColumnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Point => "POINT",
            Self::MultiPoint => "MULTIPOINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::Mixed => "MIXED",
        };
        write!(f, "{name}")
    }
}

/// Two parallel sequences describing, for every logical row, which typed store
/// holds its payload and where in that store the payload starts.
///
/// # Invariants
///
/// - `input_types.len() == union_offsets.len()`
/// - every entry of `input_types` is a valid [`FeatureTag`]
/// - `union_offsets[i]` is a valid index into the store named by
///   `input_types[i]`, or [`NONE_OFFSET`] when the tag is `None`
#[derive(Debug, Clone, PartialEq)]
pub struct GeoMeta {
    pub(crate) input_types: ScalarBuffer<i8>,
    pub(crate) union_offsets: ScalarBuffer<i32>,
}

impl GeoMeta {
    /// Create new metadata, checking tag validity and buffer parity.
    pub fn try_new(input_types: ScalarBuffer<i8>, union_offsets: ScalarBuffer<i32>) -> Result<Self> {
        if input_types.len() != union_offsets.len() {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "input_types length {} does not match union_offsets length {}",
                input_types.len(),
                union_offsets.len()
            )));
        }
        for code in input_types.iter() {
            FeatureTag::try_from(*code).map_err(|_| {
                GeoUnionError::IncompatibleConstruction(format!("unknown feature tag {code}"))
            })?;
        }
        Ok(Self {
            input_types,
            union_offsets,
        })
    }

    /// Metadata for a single-family column: one repeated tag and trivial
    /// offsets equal to the row index.
    pub(crate) fn uniform(tag: FeatureTag, len: usize) -> Self {
        Self {
            input_types: vec![tag.into(); len].into(),
            union_offsets: (0..len as i32).collect::<Vec<_>>().into(),
        }
    }

    /// The number of logical rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.input_types.len()
    }

    /// Whether the metadata covers zero rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.input_types.is_empty()
    }

    /// The feature tag of row `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()` or the tag byte is invalid (excluded by
    /// construction).
    #[inline]
    pub fn tag(&self, i: usize) -> FeatureTag {
        FeatureTag::try_from(self.input_types[i]).unwrap()
    }

    /// The offset of row `i` into its typed store.
    #[inline]
    pub fn offset(&self, i: usize) -> i32 {
        self.union_offsets[i]
    }

    /// The per-row feature tags.
    pub fn input_types(&self) -> &ScalarBuffer<i8> {
        &self.input_types
    }

    /// The per-row offsets into the typed stores.
    pub fn union_offsets(&self) -> &ScalarBuffer<i32> {
        &self.union_offsets
    }

    /// Zero-copy slice of both parallel buffers.
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset + length <= self.len(),
            "offset + length may not exceed length of metadata"
        );
        Self {
            input_types: self.input_types.slice(offset, length),
            union_offsets: self.union_offsets.slice(offset, length),
        }
    }

    /// Gather both parallel buffers by position.
    ///
    /// # Panics
    ///
    /// Panics iff any position is out of bounds.
    pub fn take(&self, positions: &[usize]) -> Self {
        let input_types: Vec<i8> = positions.iter().map(|&p| self.input_types[p]).collect();
        let union_offsets: Vec<i32> = positions.iter().map(|&p| self.union_offsets[p]).collect();
        Self {
            input_types: input_types.into(),
            union_offsets: union_offsets.into(),
        }
    }

    /// Classify the rows covered by this metadata.
    pub fn shape(&self) -> ColumnShape {
        let mut seen: Option<FeatureTag> = None;
        for code in self.input_types.iter() {
            let tag = FeatureTag::try_from(*code).unwrap();
            if tag == FeatureTag::None {
                continue;
            }
            match seen {
                None => seen = Some(tag),
                Some(prev) if prev == tag => {}
                Some(_) => return ColumnShape::Mixed,
            }
        }
        match seen {
            Some(FeatureTag::Point) => ColumnShape::Point,
            Some(FeatureTag::MultiPoint) => ColumnShape::MultiPoint,
            Some(FeatureTag::LineString) => ColumnShape::LineString,
            Some(FeatureTag::Polygon) => ColumnShape::Polygon,
            // No rule applies for empty or all-NONE metadata.
            Some(FeatureTag::None) | None => ColumnShape::Mixed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for code in [-1i8, 0, 1, 2, 3] {
            let tag = FeatureTag::try_from(code).unwrap();
            assert_eq!(i8::from(tag), code);
        }
        assert!(FeatureTag::try_from(4i8).is_err());
    }

    #[test]
    fn shape_classification() {
        let meta = GeoMeta::uniform(FeatureTag::LineString, 3);
        assert_eq!(meta.shape(), ColumnShape::LineString);

        let mixed = GeoMeta::try_new(vec![0i8, 3].into(), vec![0i32, 0].into()).unwrap();
        assert_eq!(mixed.shape(), ColumnShape::Mixed);

        // NONE rows do not change an otherwise uniform classification.
        let with_none = GeoMeta::try_new(vec![-1i8, 3].into(), vec![-1i32, 0].into()).unwrap();
        assert_eq!(with_none.shape(), ColumnShape::Polygon);

        let empty = GeoMeta::uniform(FeatureTag::Point, 0);
        assert_eq!(empty.shape(), ColumnShape::Mixed);
    }

    #[test]
    fn slice_of_uniform_stays_uniform() {
        let mixed = GeoMeta::try_new(vec![0i8, 0, 3].into(), vec![0i32, 1, 0].into()).unwrap();
        assert_eq!(mixed.shape(), ColumnShape::Mixed);
        assert_eq!(mixed.slice(0, 2).shape(), ColumnShape::Point);
        assert_eq!(mixed.slice(2, 1).shape(), ColumnShape::Polygon);
    }

    #[test]
    fn parity_is_checked() {
        assert!(GeoMeta::try_new(vec![0i8].into(), vec![0i32, 1].into()).is_err());
        assert!(GeoMeta::try_new(vec![9i8].into(), vec![0i32].into()).is_err());
    }
}
