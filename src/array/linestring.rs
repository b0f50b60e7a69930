use std::sync::Arc;

use arrow_array::{Array, ListArray};
use arrow_buffer::OffsetBuffer;
use arrow_schema::{DataType, Field};

use crate::array::util::{to_offset, validated_offsets, OffsetBufferUtils};
use crate::array::CoordBuffer;
use crate::error::{GeoUnionError, Result};

/// An immutable array of LineString/MultiLineString geometries: two offset
/// levels, geometry → part → coordinate. A geometry spanning more than one
/// part is a MultiLineString.
#[derive(Debug, Clone)]
pub struct LineStringArray {
    pub(crate) coords: CoordBuffer,

    /// Offsets into the part array where each geometry starts
    pub(crate) geom_offsets: OffsetBuffer<i32>,

    /// Offsets into the coordinate array where each part starts
    pub(crate) part_offsets: OffsetBuffer<i32>,
}

impl LineStringArray {
    /// Create a new LineStringArray from parts.
    ///
    /// # Errors
    ///
    /// - if the part offsets are inconsistent with the coordinate count
    /// - if the geometry offsets are inconsistent with the part count
    pub fn try_new(
        coords: CoordBuffer,
        part_offsets: Vec<i32>,
        geom_offsets: Vec<i32>,
    ) -> Result<Self> {
        let part_offsets = validated_offsets(part_offsets, coords.len(), "part")?;
        let geom_offsets = validated_offsets(geom_offsets, part_offsets.len_proxy(), "geometry")?;
        Ok(Self {
            coords,
            geom_offsets,
            part_offsets,
        })
    }

    /// An array holding zero linestrings.
    pub fn empty() -> Self {
        Self::try_new(
            CoordBuffer::try_new(Vec::<f64>::new().into()).unwrap(),
            vec![0],
            vec![0],
        )
        .unwrap()
    }

    /// The number of geometries in this array.
    #[inline]
    pub fn len(&self) -> usize {
        self.geom_offsets.len_proxy()
    }

    /// Whether this array holds zero geometries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access the underlying coordinate buffer.
    pub fn coords(&self) -> &CoordBuffer {
        &self.coords
    }

    /// Access the underlying geometry offsets buffer.
    pub fn geom_offsets(&self) -> &OffsetBuffer<i32> {
        &self.geom_offsets
    }

    /// Access the underlying part offsets buffer.
    pub fn part_offsets(&self) -> &OffsetBuffer<i32> {
        &self.part_offsets
    }

    fn part(&self, p: usize) -> geo::LineString {
        let (start, end) = self.part_offsets.start_end(p);
        geo::LineString::new((start..end).map(|c| self.coords.value(c)).collect())
    }

    /// The geometry at position `i`: a `LineString` when it spans exactly one
    /// part, otherwise a `MultiLineString` of its parts.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> geo::Geometry {
        let (start, end) = self.geom_offsets.start_end(i);
        if end - start == 1 {
            geo::Geometry::LineString(self.part(start))
        } else {
            geo::Geometry::MultiLineString(geo::MultiLineString::new(
                (start..end).map(|p| self.part(p)).collect(),
            ))
        }
    }

    /// Gather the geometries at `indices` into a new array.
    ///
    /// # Panics
    ///
    /// Panics iff any index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        let mut interleaved = Vec::new();
        let mut part_offsets = vec![0i32];
        let mut geom_offsets = Vec::with_capacity(indices.len() + 1);
        geom_offsets.push(0);
        for &i in indices {
            let (part_start, part_end) = self.geom_offsets.start_end(i);
            for p in part_start..part_end {
                let (start, end) = self.part_offsets.start_end(p);
                self.coords.extend_range(start..end, &mut interleaved);
                part_offsets.push(part_offsets.last().unwrap() + (end - start) as i32);
            }
            geom_offsets.push(geom_offsets.last().unwrap() + (part_end - part_start) as i32);
        }
        Self::try_new(
            CoordBuffer::try_new(interleaved.into()).unwrap(),
            part_offsets,
            geom_offsets,
        )
        .unwrap()
    }

    /// Append `other`'s geometries after this array's.
    pub fn append(&self, other: &Self) -> Result<Self> {
        let mut interleaved = self.coords.values().to_vec();
        interleaved.extend_from_slice(other.coords.values());

        let coord_shift = to_offset(self.coords.len())?;
        let mut part_offsets: Vec<i32> = self.part_offsets.as_ref().to_vec();
        part_offsets.extend(
            other.part_offsets.as_ref()[1..]
                .iter()
                .map(|o| o + coord_shift),
        );

        let part_shift = to_offset(self.part_offsets.len_proxy())?;
        let mut geom_offsets: Vec<i32> = self.geom_offsets.as_ref().to_vec();
        geom_offsets.extend(
            other.geom_offsets.as_ref()[1..]
                .iter()
                .map(|o| o + part_shift),
        );

        Self::try_new(
            CoordBuffer::try_new(interleaved.into()).unwrap(),
            part_offsets,
            geom_offsets,
        )
    }

    /// The number of leaf coordinate pairs owned by each geometry, walking
    /// the part offsets across the geometry's part range.
    pub fn leaf_counts(&self) -> Vec<usize> {
        let parts: &[i32] = self.part_offsets.as_ref();
        (0..self.len())
            .map(|i| {
                let (start, end) = self.geom_offsets.start_end(i);
                (parts[end] - parts[start]) as usize
            })
            .collect()
    }

    pub(crate) fn parts_field() -> Arc<Field> {
        Field::new(
            "linestrings",
            DataType::List(Self::vertices_field()),
            false,
        )
        .into()
    }

    pub(crate) fn vertices_field() -> Arc<Field> {
        Field::new("vertices", CoordBuffer::storage_type(), false).into()
    }

    /// The Arrow storage layout: `List<List<FixedSizeList<f64; 2>>>`.
    pub(crate) fn storage_type() -> DataType {
        DataType::List(Self::parts_field())
    }

    pub(crate) fn into_arrow(self) -> ListArray {
        let parts = ListArray::new(
            Self::vertices_field(),
            self.part_offsets,
            Arc::new(self.coords.into_arrow()),
            None,
        );
        ListArray::new(Self::parts_field(), self.geom_offsets, Arc::new(parts), None)
    }

    pub(crate) fn from_arrow(array: &dyn Array) -> Result<Self> {
        let geoms = array.as_any().downcast_ref::<ListArray>().ok_or_else(|| {
            GeoUnionError::IncompatibleConstruction(format!(
                "expected List linestring array, got {:?}",
                array.data_type()
            ))
        })?;
        let parts = geoms
            .values()
            .as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| {
                GeoUnionError::IncompatibleConstruction(format!(
                    "expected List part array, got {:?}",
                    geoms.values().data_type()
                ))
            })?;
        let coords = CoordBuffer::from_arrow(parts.values().as_ref())?;
        Self::try_new(
            coords,
            parts.offsets().as_ref().to_vec(),
            geoms.offsets().as_ref().to_vec(),
        )
    }
}

// OffsetBuffer carries no PartialEq, so compare the raw offset slices.
impl PartialEq for LineStringArray {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && self.geom_offsets.as_ref() == other.geom_offsets.as_ref()
            && self.part_offsets.as_ref() == other.part_offsets.as_ref()
    }
}
