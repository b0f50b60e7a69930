use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, FixedSizeListArray, Float64Array};
use arrow_buffer::ScalarBuffer;
use arrow_schema::{DataType, Field};

use crate::error::{GeoUnionError, Result};

/// An immutable buffer of interleaved xy coordinates.
///
/// This is the leaf level of every typed store: a flat `f64` buffer where
/// coordinate pair `i` occupies elements `2 * i` and `2 * i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordBuffer {
    pub(crate) interleaved: ScalarBuffer<f64>,
}

impl CoordBuffer {
    /// Create a new coordinate buffer from interleaved xy values.
    ///
    /// # Errors
    ///
    /// - if the buffer length is odd
    pub fn try_new(interleaved: ScalarBuffer<f64>) -> Result<Self> {
        if interleaved.len() % 2 != 0 {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "interleaved coordinate buffer must have even length, got {}",
                interleaved.len()
            )));
        }
        Ok(Self { interleaved })
    }

    /// The number of coordinate pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.interleaved.len() / 2
    }

    /// Whether the buffer holds zero coordinate pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interleaved.is_empty()
    }

    /// The flat interleaved values.
    pub fn values(&self) -> &[f64] {
        self.interleaved.as_ref()
    }

    /// The coordinate pair at position `i`.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    #[inline]
    pub fn value(&self, i: usize) -> geo::Coord {
        geo::Coord {
            x: self.interleaved[2 * i],
            y: self.interleaved[2 * i + 1],
        }
    }

    /// Gather the coordinate pairs in `range` into a new `Vec`, appending to `out`.
    pub(crate) fn extend_range(&self, range: std::ops::Range<usize>, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.values()[2 * range.start..2 * range.end]);
    }

    pub(crate) fn storage_field() -> Arc<Field> {
        Field::new("xy", DataType::Float64, false).into()
    }

    /// The Arrow storage layout: `FixedSizeList<f64; 2>`.
    pub(crate) fn storage_type() -> DataType {
        DataType::FixedSizeList(Self::storage_field(), 2)
    }

    pub(crate) fn into_arrow(self) -> FixedSizeListArray {
        let values = Arc::new(Float64Array::new(self.interleaved, None));
        FixedSizeListArray::new(Self::storage_field(), 2, values, None)
    }

    pub(crate) fn from_arrow(array: &dyn Array) -> Result<Self> {
        let fsl = array
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| {
                GeoUnionError::IncompatibleConstruction(format!(
                    "expected FixedSizeList coordinate array, got {:?}",
                    array.data_type()
                ))
            })?;
        if fsl.value_length() != 2 {
            return Err(GeoUnionError::IncompatibleConstruction(format!(
                "expected coordinate list size 2, got {}",
                fsl.value_length()
            )));
        }
        let values = fsl
            .values()
            .as_primitive_opt::<Float64Type>()
            .ok_or_else(|| {
                GeoUnionError::IncompatibleConstruction(format!(
                    "expected f64 coordinate values, got {:?}",
                    fsl.values().data_type()
                ))
            })?;
        Self::try_new(values.values().clone())
    }
}

impl TryFrom<Vec<f64>> for CoordBuffer {
    type Error = GeoUnionError;

    fn try_from(value: Vec<f64>) -> Result<Self> {
        Self::try_new(value.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn value_access() {
        let coords = CoordBuffer::try_new(vec![0., 1., 2., 3.].into()).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords.value(1), geo::Coord { x: 2., y: 3. });
    }

    #[test]
    fn odd_length_rejected() {
        assert!(CoordBuffer::try_new(vec![0., 1., 2.].into()).is_err());
    }

    #[test]
    fn arrow_round_trip() {
        let coords = CoordBuffer::try_new(vec![0., 1., 2., 3.].into()).unwrap();
        let arrow = coords.clone().into_arrow();
        assert_eq!(CoordBuffer::from_arrow(&arrow).unwrap(), coords);
    }
}
