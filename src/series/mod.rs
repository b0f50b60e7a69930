//! A labeled view over a [`GeoColumn`]: row labels, label/position indexing,
//! outer-join alignment, and host-side decode.

use indexmap::{IndexMap, IndexSet};

use crate::array::GeoColumn;
use crate::error::{GeoUnionError, Result};
use crate::meta::{ColumnShape, FeatureTag, GeoMeta, NONE_OFFSET};

pub use accessor::{
    LineStringsAccessor, MultiPointsAccessor, PointsAccessor, PolygonsAccessor,
};

mod accessor;

/// Per-leaf-coordinate row ownership, as an explicit tagged result.
///
/// `Empty` is returned for a zero-row series; callers that feed the indices
/// into a reduction can use [`PointIndices::to_vec`], which renders `Empty`
/// as the single index 0 so the reduction stays well-defined.
#[derive(Debug, Clone, PartialEq)]
pub enum PointIndices {
    /// The series had no rows.
    Empty,
    /// For every leaf coordinate pair, the label of the row that owns it.
    PerCoordinate(Vec<i64>),
}

impl PointIndices {
    /// Flatten into a plain vector; `Empty` becomes `[0]`.
    pub fn to_vec(&self) -> Vec<i64> {
        match self {
            Self::Empty => vec![0],
            Self::PerCoordinate(indices) => indices.clone(),
        }
    }
}

/// A [`GeoColumn`] plus a row-label sequence.
///
/// Labels are arbitrary `i64` values; order matters for positional access and
/// labels for alignment. A series is immutable once constructed: every
/// transform produces a new series, sharing the four typed stores with its
/// parent and owning fresh metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSeries {
    column: GeoColumn,
    index: Vec<i64>,
}

impl GeoSeries {
    /// Wrap a column with the default label sequence `0..len`.
    pub fn new(column: GeoColumn) -> Self {
        let index = (0..column.len() as i64).collect();
        Self { column, index }
    }

    /// Wrap a column with an explicit label sequence.
    ///
    /// # Errors
    ///
    /// - if the label count does not match the row count
    pub fn try_new(column: GeoColumn, index: Vec<i64>) -> Result<Self> {
        if column.len() != index.len() {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "label count {} does not match row count {}",
                index.len(),
                column.len()
            )));
        }
        Ok(Self { column, index })
    }

    /// Build a series of POINT rows from interleaved xy coordinates.
    pub fn from_points_xy(coords: Vec<f64>) -> Result<Self> {
        Ok(Self::new(GeoColumn::from_points_xy(coords)?))
    }

    /// Build a series of MULTIPOINT rows; see [`GeoColumn::from_multipoints_xy`].
    pub fn from_multipoints_xy(coords: Vec<f64>, geometry_offsets: Vec<i32>) -> Result<Self> {
        Ok(Self::new(GeoColumn::from_multipoints_xy(
            coords,
            geometry_offsets,
        )?))
    }

    /// Build a series of LINESTRING rows; see [`GeoColumn::from_linestrings_xy`].
    pub fn from_linestrings_xy(
        coords: Vec<f64>,
        part_offsets: Vec<i32>,
        geometry_offsets: Vec<i32>,
    ) -> Result<Self> {
        Ok(Self::new(GeoColumn::from_linestrings_xy(
            coords,
            part_offsets,
            geometry_offsets,
        )?))
    }

    /// Build a series of POLYGON rows; see [`GeoColumn::from_polygons_xy`].
    pub fn from_polygons_xy(
        coords: Vec<f64>,
        ring_offsets: Vec<i32>,
        part_offsets: Vec<i32>,
        geometry_offsets: Vec<i32>,
    ) -> Result<Self> {
        Ok(Self::new(GeoColumn::from_polygons_xy(
            coords,
            ring_offsets,
            part_offsets,
            geometry_offsets,
        )?))
    }

    /// The number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.column.len()
    }

    /// Whether the series covers zero rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    /// Access the underlying union column.
    pub fn column(&self) -> &GeoColumn {
        &self.column
    }

    /// The row labels, in positional order.
    pub fn index(&self) -> &[i64] {
        &self.index
    }

    /// Classify the series' rows; the dispatch key for binary predicates.
    pub fn shape(&self) -> ColumnShape {
        self.column.shape()
    }

    /// Decode the row at position `pos`; `None` for NONE rows.
    ///
    /// # Panics
    ///
    /// Panics iff `pos >= self.len()`.
    pub fn get(&self, pos: usize) -> Option<geo::Geometry> {
        self.column.value(pos)
    }

    /// Slice by position, sharing the typed stores and carrying the sliced
    /// labels.
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            column: self.column.slice(offset, length),
            index: self.index[offset..offset + length].to_vec(),
        }
    }

    /// Gather rows by position, sharing the typed stores.
    ///
    /// # Panics
    ///
    /// Panics iff any position is out of bounds.
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            column: self.column.take(positions),
            index: positions.iter().map(|&p| self.index[p]).collect(),
        }
    }

    /// First-occurrence label → position map.
    fn position_map(&self) -> IndexMap<i64, usize> {
        let mut map = IndexMap::with_capacity(self.index.len());
        for (pos, &label) in self.index.iter().enumerate() {
            map.entry(label).or_insert(pos);
        }
        map
    }

    /// Select rows by label, preserving the caller-supplied label order.
    /// Labels resolve to their first occurrence in the series.
    ///
    /// # Errors
    ///
    /// - `UnsupportedRowAccess` if a label is not present
    pub fn loc(&self, labels: &[i64]) -> Result<Self> {
        let map = self.position_map();
        let positions = labels
            .iter()
            .map(|label| {
                map.get(label).copied().ok_or_else(|| {
                    GeoUnionError::UnsupportedRowAccess(format!("label {label} not present"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.take(&positions))
    }

    /// Select rows by boolean mask: the positional fast path of label access.
    ///
    /// # Errors
    ///
    /// - if the mask length does not match the series length
    pub fn loc_mask(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "mask length {} does not match series length {}",
                mask.len(),
                self.len()
            )));
        }
        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(pos, &keep)| keep.then_some(pos))
            .collect();
        Ok(self.take(&positions))
    }

    /// Decode the single row with the given label.
    ///
    /// # Errors
    ///
    /// - `UnsupportedRowAccess` if the label is not present
    pub fn loc_scalar(&self, label: i64) -> Result<Option<geo::Geometry>> {
        let pos = self
            .position_map()
            .get(&label)
            .copied()
            .ok_or_else(|| {
                GeoUnionError::UnsupportedRowAccess(format!("label {label} not present"))
            })?;
        Ok(self.get(pos))
    }

    /// Decode every row into a host-side scalar geometry.
    pub fn to_geo(&self) -> Vec<Option<geo::Geometry>> {
        (0..self.len()).map(|pos| self.get(pos)).collect()
    }

    /// Reconcile two series onto a common label set via outer join.
    ///
    /// Identical label sequences are returned unchanged. Otherwise both
    /// results carry the stable-sorted union of the two label sequences, with
    /// rows matched by label and absent labels becoming NONE rows. Duplicate
    /// labels are kept as-is and matched by first occurrence; alignment with
    /// non-unique labels on both sides is the caller's responsibility.
    pub fn align(&self, other: &Self) -> (Self, Self) {
        if self.index == other.index {
            return (self.clone(), other.clone());
        }

        let mut union: Vec<i64> = self.index.clone();
        let left_labels: IndexSet<i64> = self.index.iter().copied().collect();
        let mut seen_right: IndexSet<i64> = IndexSet::new();
        for &label in &other.index {
            if !left_labels.contains(&label) && seen_right.insert(label) {
                union.push(label);
            }
        }
        union.sort();

        (self.align_to(&union), other.align_to(&union))
    }

    /// Rebuild this series over the given label sequence: rows present keep
    /// their tag and offset, absent labels become NONE rows.
    fn align_to(&self, labels: &[i64]) -> Self {
        let map = self.position_map();
        let mut input_types = Vec::with_capacity(labels.len());
        let mut union_offsets = Vec::with_capacity(labels.len());
        for label in labels {
            match map.get(label) {
                Some(&pos) => {
                    input_types.push(self.column.meta.input_types[pos]);
                    union_offsets.push(self.column.meta.union_offsets[pos]);
                }
                None => {
                    input_types.push(FeatureTag::None.into());
                    union_offsets.push(NONE_OFFSET);
                }
            }
        }
        // Shares the stores; the metadata is valid by construction.
        let column = GeoColumn {
            meta: GeoMeta {
                input_types: input_types.into(),
                union_offsets: union_offsets.into(),
            },
            points: self.column.points.clone(),
            multipoints: self.column.multipoints.clone(),
            linestrings: self.column.linestrings.clone(),
            polygons: self.column.polygons.clone(),
        };
        Self {
            column,
            index: labels.to_vec(),
        }
    }

    /// For every leaf coordinate, the label of the owning row.
    ///
    /// Dispatches on the series shape; a non-empty MIXED series has no single
    /// innermost offset level to derive from.
    ///
    /// # Errors
    ///
    /// - `UnsupportedRowAccess` for a non-empty MIXED series
    pub fn point_indices(&self) -> Result<PointIndices> {
        if self.is_empty() {
            return Ok(PointIndices::Empty);
        }
        let indices = match self.shape() {
            ColumnShape::Point => self.points().point_indices(),
            ColumnShape::MultiPoint => self.multipoints().point_indices(),
            ColumnShape::LineString => self.linestrings().point_indices(),
            ColumnShape::Polygon => self.polygons().point_indices(),
            ColumnShape::Mixed => {
                return Err(GeoUnionError::UnsupportedRowAccess(
                    "series must contain only points, multipoints, linestrings, or polygons \
                     to return point indices"
                        .to_string(),
                ));
            }
        };
        Ok(PointIndices::PerCoordinate(indices))
    }

    /// Store indices and labels of the rows carrying the given tag, in row
    /// order. Accessors use this to re-derive the referenced subset of a
    /// typed store after slicing or alignment.
    pub(crate) fn rows_with_tag(&self, tag: FeatureTag) -> (Vec<usize>, Vec<i64>) {
        let mut store_indices = Vec::new();
        let mut labels = Vec::new();
        for pos in 0..self.len() {
            if self.column.meta.tag(pos) == tag {
                store_indices.push(self.column.meta.offset(pos) as usize);
                labels.push(self.index[pos]);
            }
        }
        (store_indices, labels)
    }

    /// Accessor over the rows tagged POINT.
    pub fn points(&self) -> PointsAccessor {
        PointsAccessor::new(self)
    }

    /// Accessor over the rows tagged MULTIPOINT.
    pub fn multipoints(&self) -> MultiPointsAccessor {
        MultiPointsAccessor::new(self)
    }

    /// Accessor over the rows tagged LINESTRING.
    pub fn linestrings(&self) -> LineStringsAccessor {
        LineStringsAccessor::new(self)
    }

    /// Accessor over the rows tagged POLYGON.
    pub fn polygons(&self) -> PolygonsAccessor {
        PolygonsAccessor::new(self)
    }
}
