use std::sync::Arc;

use arrow_array::{Array, ListArray};
use arrow_buffer::OffsetBuffer;
use arrow_schema::{DataType, Field};

use crate::array::util::{to_offset, validated_offsets, OffsetBufferUtils};
use crate::array::CoordBuffer;
use crate::error::{GeoUnionError, Result};

/// An immutable array of MultiPoint geometries: one offset level mapping each
/// geometry to its run of coordinate pairs.
#[derive(Debug, Clone)]
pub struct MultiPointArray {
    pub(crate) coords: CoordBuffer,

    /// Offsets into the coordinate array where each geometry starts
    pub(crate) geom_offsets: OffsetBuffer<i32>,
}

impl MultiPointArray {
    /// Create a new MultiPointArray from parts.
    ///
    /// # Errors
    ///
    /// - if the geometry offsets are not non-decreasing, do not start at 0,
    ///   or do not end at the coordinate count
    pub fn try_new(coords: CoordBuffer, geom_offsets: Vec<i32>) -> Result<Self> {
        let geom_offsets = validated_offsets(geom_offsets, coords.len(), "geometry")?;
        Ok(Self {
            coords,
            geom_offsets,
        })
    }

    /// An array holding zero multipoints.
    pub fn empty() -> Self {
        Self::try_new(CoordBuffer::try_new(Vec::<f64>::new().into()).unwrap(), vec![0]).unwrap()
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

    /// The multipoint at position `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> geo::MultiPoint {
        let (start, end) = self.geom_offsets.start_end(i);
        geo::MultiPoint::new((start..end).map(|c| self.coords.value(c).into()).collect())
    }

    /// Gather the geometries at `indices` into a new array.
    ///
    /// # Panics
    ///
    /// Panics iff any index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        let mut interleaved = Vec::new();
        let mut geom_offsets = Vec::with_capacity(indices.len() + 1);
        geom_offsets.push(0);
        for &i in indices {
            let (start, end) = self.geom_offsets.start_end(i);
            self.coords.extend_range(start..end, &mut interleaved);
            geom_offsets.push(geom_offsets.last().unwrap() + (end - start) as i32);
        }
        Self::try_new(CoordBuffer::try_new(interleaved.into()).unwrap(), geom_offsets).unwrap()
    }

    /// Append `other`'s geometries after this array's.
    pub fn append(&self, other: &Self) -> Result<Self> {
        let mut interleaved = self.coords.values().to_vec();
        interleaved.extend_from_slice(other.coords.values());

        let shift = to_offset(self.coords.len())?;
        let mut geom_offsets: Vec<i32> = self.geom_offsets.as_ref().to_vec();
        geom_offsets.extend(other.geom_offsets.as_ref()[1..].iter().map(|o| o + shift));

        Self::try_new(CoordBuffer::try_new(interleaved.into()).unwrap(), geom_offsets)
    }

    /// The number of leaf coordinate pairs owned by each geometry: run
    /// lengths between consecutive geometry offsets.
    pub fn leaf_counts(&self) -> Vec<usize> {
        (0..self.len())
            .map(|i| {
                let (start, end) = self.geom_offsets.start_end(i);
                end - start
            })
            .collect()
    }

    pub(crate) fn values_field() -> Arc<Field> {
        Field::new("points", CoordBuffer::storage_type(), false).into()
    }

    /// The Arrow storage layout: `List<FixedSizeList<f64; 2>>`.
    pub(crate) fn storage_type() -> DataType {
        DataType::List(Self::values_field())
    }

    pub(crate) fn into_arrow(self) -> ListArray {
        ListArray::new(
            Self::values_field(),
            self.geom_offsets,
            Arc::new(self.coords.into_arrow()),
            None,
        )
    }

    pub(crate) fn from_arrow(array: &dyn Array) -> Result<Self> {
        let list = array.as_any().downcast_ref::<ListArray>().ok_or_else(|| {
            GeoUnionError::IncompatibleConstruction(format!(
                "expected List multipoint array, got {:?}",
                array.data_type()
            ))
        })?;
        let coords = CoordBuffer::from_arrow(list.values().as_ref())?;
        Self::try_new(coords, list.offsets().as_ref().to_vec())
    }
}

// OffsetBuffer carries no PartialEq, so compare the raw offset slices.
impl PartialEq for MultiPointArray {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && self.geom_offsets.as_ref() == other.geom_offsets.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mp_array() -> MultiPointArray {
        MultiPointArray::try_new(
            vec![0., 0., 1., 1., 2., 2., 3., 3.].try_into().unwrap(),
            vec![0, 2, 4],
        )
        .unwrap()
    }

    #[test]
    fn value() {
        let arr = mp_array();
        assert_eq!(arr.len(), 2);
        assert_eq!(
            arr.value(1),
            geo::MultiPoint::new(vec![geo::Point::new(2., 2.), geo::Point::new(3., 3.)])
        );
    }

    #[test]
    fn malformed_offsets() {
        let coords: CoordBuffer = vec![0., 0., 1., 1.].try_into().unwrap();
        assert!(MultiPointArray::try_new(coords.clone(), vec![0, 2, 1]).is_err());
        assert!(MultiPointArray::try_new(coords.clone(), vec![1, 2]).is_err());
        assert!(MultiPointArray::try_new(coords, vec![0, 3]).is_err());
    }

    #[test]
    fn take_and_leaf_counts() {
        let taken = mp_array().take(&[1]);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken.leaf_counts(), vec![2]);
        assert_eq!(taken.value(0).0[0], geo::Point::new(2., 2.));
    }

    #[test]
    fn append_shifts_offsets() {
        let joined = mp_array().append(&mp_array()).unwrap();
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.geom_offsets().as_ref(), &[0, 2, 4, 6, 8]);
    }

    #[test]
    fn arrow_round_trip() {
        let arr = mp_array();
        let arrow = arr.clone().into_arrow();
        assert_eq!(MultiPointArray::from_arrow(&arrow).unwrap(), arr);
    }

    #[test]
    fn eq_observes_offsets() {
        let coords: CoordBuffer = vec![0., 0., 1., 1., 2., 2., 3., 3.].try_into().unwrap();
        let arr = MultiPointArray::try_new(coords.clone(), vec![0, 2, 4]).unwrap();
        assert_eq!(arr, arr.clone());
        // Same coordinates, different grouping.
        let regrouped = MultiPointArray::try_new(coords, vec![0, 1, 4]).unwrap();
        assert_ne!(arr, regrouped);
    }
}
