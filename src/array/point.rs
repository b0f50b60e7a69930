use arrow_array::{Array, FixedSizeListArray};

use crate::array::CoordBuffer;
use crate::error::Result;

/// An immutable array of Point geometries: one coordinate pair per geometry,
/// no offset levels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointArray {
    pub(crate) coords: CoordBuffer,
}

impl PointArray {
    /// Create a new PointArray.
    ///
    /// This function is `O(1)`.
    pub fn new(coords: CoordBuffer) -> Self {
        Self { coords }
    }

    /// An array holding zero points.
    pub fn empty() -> Self {
        Self {
            coords: CoordBuffer::try_new(Vec::<f64>::new().into()).unwrap(),
        }
    }

    /// The number of geometries in this array.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether this array holds zero geometries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Access the underlying coordinate buffer.
    pub fn coords(&self) -> &CoordBuffer {
        &self.coords
    }

    /// The point at position `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> geo::Point {
        self.coords.value(i).into()
    }

    /// Gather the geometries at `indices` into a new array.
    ///
    /// # Panics
    ///
    /// Panics iff any index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        let mut interleaved = Vec::with_capacity(indices.len() * 2);
        for &i in indices {
            self.coords.extend_range(i..i + 1, &mut interleaved);
        }
        Self {
            coords: CoordBuffer::try_new(interleaved.into()).unwrap(),
        }
    }

    /// Append `other`'s geometries after this array's.
    pub fn append(&self, other: &Self) -> Self {
        let mut interleaved = self.coords.values().to_vec();
        interleaved.extend_from_slice(other.coords.values());
        Self {
            coords: CoordBuffer::try_new(interleaved.into()).unwrap(),
        }
    }

    /// The number of leaf coordinate pairs owned by each geometry. Always 1
    /// per point; kept for parity with the nested stores.
    pub fn leaf_counts(&self) -> Vec<usize> {
        vec![1; self.len()]
    }

    pub(crate) fn into_arrow(self) -> FixedSizeListArray {
        self.coords.into_arrow()
    }

    pub(crate) fn from_arrow(array: &dyn Array) -> Result<Self> {
        Ok(Self::new(CoordBuffer::from_arrow(array)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn p_array() -> PointArray {
        PointArray::new(vec![0., 0., 1., 1., 2., 2.].try_into().unwrap())
    }

    #[test]
    fn value() {
        let arr = p_array();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.value(2), geo::Point::new(2., 2.));
    }

    #[test]
    fn take_reorders() {
        let taken = p_array().take(&[2, 0]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.value(0), geo::Point::new(2., 2.));
        assert_eq!(taken.value(1), geo::Point::new(0., 0.));
    }

    #[test]
    fn append() {
        let joined = p_array().append(&p_array().take(&[1]));
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.value(3), geo::Point::new(1., 1.));
    }
}
