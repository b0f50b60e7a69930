use std::sync::Arc;

use arrow_array::{Array, ArrayRef, UnionArray};
use arrow_schema::{DataType, Field, UnionFields, UnionMode};
use itertools::izip;

use crate::array::util::to_offset;
use crate::array::{CoordBuffer, LineStringArray, MultiPointArray, PointArray, PolygonArray};
use crate::error::{GeoUnionError, Result};
use crate::meta::{ColumnShape, FeatureTag, GeoMeta};

/// A column of heterogeneous geometries: per-row union metadata over four
/// typed coordinate stores.
///
/// A row's payload is reached by tag → typed store → the store's own internal
/// offsets; the union offset only selects which element of the typed store
/// belongs to the row. All transforms produce new immutable columns; slices
/// share the four stores and own fresh metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoColumn {
    pub(crate) meta: GeoMeta,
    pub(crate) points: PointArray,
    pub(crate) multipoints: MultiPointArray,
    pub(crate) linestrings: LineStringArray,
    pub(crate) polygons: PolygonArray,
}

impl GeoColumn {
    /// Create a new GeoColumn from metadata and the four typed stores.
    ///
    /// # Errors
    ///
    /// - if any union offset is out of bounds for the store its tag names
    pub fn try_new(
        meta: GeoMeta,
        points: PointArray,
        multipoints: MultiPointArray,
        linestrings: LineStringArray,
        polygons: PolygonArray,
    ) -> Result<Self> {
        for (code, offset) in izip!(meta.input_types.iter(), meta.union_offsets.iter()) {
            let tag = FeatureTag::try_from(*code).unwrap();
            let store_len = match tag {
                FeatureTag::None => continue,
                FeatureTag::Point => points.len(),
                FeatureTag::MultiPoint => multipoints.len(),
                FeatureTag::LineString => linestrings.len(),
                FeatureTag::Polygon => polygons.len(),
            };
            if *offset < 0 || *offset as usize >= store_len {
                return Err(GeoUnionError::MalformedOffsets(format!(
                    "union offset {offset} out of bounds for {tag:?} store of length {store_len}"
                )));
            }
        }
        Ok(Self {
            meta,
            points,
            multipoints,
            linestrings,
            polygons,
        })
    }

    /// Build a column of POINT rows from interleaved xy coordinates: one row
    /// per coordinate pair.
    pub fn from_points_xy(coords: Vec<f64>) -> Result<Self> {
        let points = PointArray::new(CoordBuffer::try_new(coords.into())?);
        let meta = GeoMeta::uniform(FeatureTag::Point, points.len());
        Self::try_new(
            meta,
            points,
            MultiPointArray::empty(),
            LineStringArray::empty(),
            PolygonArray::empty(),
        )
    }

    /// Build a column of MULTIPOINT rows. Row `i` spans the coordinate pairs
    /// `geometry_offsets[i]..geometry_offsets[i + 1]`.
    pub fn from_multipoints_xy(coords: Vec<f64>, geometry_offsets: Vec<i32>) -> Result<Self> {
        let multipoints =
            MultiPointArray::try_new(CoordBuffer::try_new(coords.into())?, geometry_offsets)?;
        let meta = GeoMeta::uniform(FeatureTag::MultiPoint, multipoints.len());
        Self::try_new(
            meta,
            PointArray::empty(),
            multipoints,
            LineStringArray::empty(),
            PolygonArray::empty(),
        )
    }

    /// Build a column of LINESTRING rows. `geometry_offsets` index into
    /// `part_offsets`; a geometry spanning more than one part is a
    /// MultiLineString.
    pub fn from_linestrings_xy(
        coords: Vec<f64>,
        part_offsets: Vec<i32>,
        geometry_offsets: Vec<i32>,
    ) -> Result<Self> {
        let linestrings = LineStringArray::try_new(
            CoordBuffer::try_new(coords.into())?,
            part_offsets,
            geometry_offsets,
        )?;
        let meta = GeoMeta::uniform(FeatureTag::LineString, linestrings.len());
        Self::try_new(
            meta,
            PointArray::empty(),
            MultiPointArray::empty(),
            linestrings,
            PolygonArray::empty(),
        )
    }

    /// Build a column of POLYGON rows with three nesting levels; a geometry
    /// spanning more than one part is a MultiPolygon.
    pub fn from_polygons_xy(
        coords: Vec<f64>,
        ring_offsets: Vec<i32>,
        part_offsets: Vec<i32>,
        geometry_offsets: Vec<i32>,
    ) -> Result<Self> {
        let polygons = PolygonArray::try_new(
            CoordBuffer::try_new(coords.into())?,
            ring_offsets,
            part_offsets,
            geometry_offsets,
        )?;
        let meta = GeoMeta::uniform(FeatureTag::Polygon, polygons.len());
        Self::try_new(
            meta,
            PointArray::empty(),
            MultiPointArray::empty(),
            LineStringArray::empty(),
            polygons,
        )
    }

    /// The number of logical rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    /// Whether the column covers zero rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Access the union metadata.
    pub fn meta(&self) -> &GeoMeta {
        &self.meta
    }

    /// Access the Point store.
    pub fn points(&self) -> &PointArray {
        &self.points
    }

    /// Access the MultiPoint store.
    pub fn multipoints(&self) -> &MultiPointArray {
        &self.multipoints
    }

    /// Access the LineString store.
    pub fn linestrings(&self) -> &LineStringArray {
        &self.linestrings
    }

    /// Access the Polygon store.
    pub fn polygons(&self) -> &PolygonArray {
        &self.polygons
    }

    /// Classify the column's rows. Recomputed on every call: a subset of a
    /// mixed column can be uniform.
    pub fn shape(&self) -> ColumnShape {
        self.meta.shape()
    }

    /// Decode row `i` into a host-side scalar geometry; `None` for NONE rows.
    ///
    /// This is the only place per-row branching on the feature tag occurs.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> Option<geo::Geometry> {
        let offset = self.meta.offset(i) as usize;
        match self.meta.tag(i) {
            FeatureTag::None => None,
            FeatureTag::Point => Some(geo::Geometry::Point(self.points.value(offset))),
            FeatureTag::MultiPoint => {
                Some(geo::Geometry::MultiPoint(self.multipoints.value(offset)))
            }
            FeatureTag::LineString => Some(self.linestrings.value(offset)),
            FeatureTag::Polygon => Some(self.polygons.value(offset)),
        }
    }

    /// Slice this column by position: new metadata over the shared stores.
    ///
    /// # Panics
    ///
    /// Panics iff `offset + length > self.len()`.
    #[inline]
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            meta: self.meta.slice(offset, length),
            points: self.points.clone(),
            multipoints: self.multipoints.clone(),
            linestrings: self.linestrings.clone(),
            polygons: self.polygons.clone(),
        }
    }

    /// Gather rows by position: new metadata over the shared stores.
    ///
    /// # Panics
    ///
    /// Panics iff any position is out of bounds.
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            meta: self.meta.take(positions),
            points: self.points.clone(),
            multipoints: self.multipoints.clone(),
            linestrings: self.linestrings.clone(),
            polygons: self.polygons.clone(),
        }
    }

    /// Concatenate two columns: the four stores are appended pairwise and the
    /// right side's union offsets are remapped past the left side's stores.
    pub fn concat(&self, other: &Self) -> Result<Self> {
        let mut input_types: Vec<i8> = self.meta.input_types.to_vec();
        let mut union_offsets: Vec<i32> = self.meta.union_offsets.to_vec();
        for (code, offset) in izip!(other.meta.input_types.iter(), other.meta.union_offsets.iter())
        {
            let shift = to_offset(match FeatureTag::try_from(*code).unwrap() {
                FeatureTag::None => 0,
                FeatureTag::Point => self.points.len(),
                FeatureTag::MultiPoint => self.multipoints.len(),
                FeatureTag::LineString => self.linestrings.len(),
                FeatureTag::Polygon => self.polygons.len(),
            })?;
            input_types.push(*code);
            union_offsets.push(offset + shift);
        }
        Self::try_new(
            GeoMeta::try_new(input_types.into(), union_offsets.into())?,
            self.points.append(&other.points),
            self.multipoints.append(&other.multipoints)?,
            self.linestrings.append(&other.linestrings)?,
            self.polygons.append(&other.polygons)?,
        )
    }

    fn union_fields() -> UnionFields {
        let fields: Vec<Arc<Field>> = vec![
            Field::new("points", CoordBuffer::storage_type(), false).into(),
            Field::new("multipoints", MultiPointArray::storage_type(), false).into(),
            Field::new("linestrings", LineStringArray::storage_type(), false).into(),
            Field::new("polygons", PolygonArray::storage_type(), false).into(),
        ];
        UnionFields::new(0..4, fields)
    }

    /// Export this column as an Arrow dense union with children ordered
    /// `[Point, MultiPoint, LineString, Polygon]`.
    ///
    /// # Errors
    ///
    /// - `NullableUnsupported` if the column contains NONE rows: a dense
    ///   union has no type id for them
    pub fn to_union_array(&self) -> Result<UnionArray> {
        if self.meta.input_types.iter().any(|code| *code < 0) {
            return Err(GeoUnionError::NullableUnsupported(
                "a column containing NONE rows has no dense union rendition".to_string(),
            ));
        }
        let children: Vec<ArrayRef> = vec![
            Arc::new(self.points.clone().into_arrow()),
            Arc::new(self.multipoints.clone().into_arrow()),
            Arc::new(self.linestrings.clone().into_arrow()),
            Arc::new(self.polygons.clone().into_arrow()),
        ];
        Ok(UnionArray::try_new(
            Self::union_fields(),
            self.meta.input_types.clone(),
            Some(self.meta.union_offsets.clone()),
            children,
        )?)
    }
}

impl TryFrom<&UnionArray> for GeoColumn {
    type Error = GeoUnionError;

    fn try_from(value: &UnionArray) -> Result<Self> {
        match value.data_type() {
            DataType::Union(_, UnionMode::Dense) => {}
            dt => {
                return Err(GeoUnionError::IncompatibleConstruction(format!(
                    "expected dense union array, got {dt:?}"
                )));
            }
        }
        let offsets = value
            .offsets()
            .ok_or_else(|| {
                GeoUnionError::IncompatibleConstruction(
                    "dense union array must carry value offsets".to_string(),
                )
            })?
            .clone();
        let meta = GeoMeta::try_new(value.type_ids().clone(), offsets)?;
        Self::try_new(
            meta,
            PointArray::from_arrow(value.child(0).as_ref())?,
            MultiPointArray::from_arrow(value.child(1).as_ref())?,
            LineStringArray::from_arrow(value.child(2).as_ref())?,
            PolygonArray::from_arrow(value.child(3).as_ref())?,
        )
    }
}
